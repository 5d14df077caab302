//! Scripted transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use qrelay_adapter_ibm::{
    IbmBackend, IbmConfig, IbmError, IbmResult, OperationRequest, OperationResponse, Transport,
};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(u16, Value),
    Fail,
}

struct Route {
    operation: String,
    /// Only match requests whose `id` parameter equals this.
    id: Option<String>,
    /// Replies are consumed front to back; the last one repeats.
    replies: VecDeque<Reply>,
}

/// A recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub operation: String,
    pub request: OperationRequest,
}

/// Transport that answers from a script and records every invocation.
///
/// Operations without a script fail at the transport level, like an
/// operation name the provider does not know.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, operation: &str, id: Option<&str>, replies: Vec<Reply>) {
        self.routes.lock().unwrap().push(Route {
            operation: operation.to_string(),
            id: id.map(str::to_string),
            replies: replies.into(),
        });
    }

    /// Always answer `operation` with `status` and `body`.
    pub fn respond(&self, operation: &str, status: u16, body: Value) {
        self.push(operation, None, vec![Reply::Respond(status, body)]);
    }

    /// Answer `operation` for provider job `id` only.
    pub fn respond_for(&self, operation: &str, id: &str, status: u16, body: Value) {
        self.push(operation, Some(id), vec![Reply::Respond(status, body)]);
    }

    /// Answer `operation` with `replies` in order, repeating the last.
    pub fn respond_seq(&self, operation: &str, replies: Vec<Reply>) {
        self.push(operation, None, replies);
    }

    /// Fail `operation` at the transport level.
    pub fn fail(&self, operation: &str) {
        self.push(operation, None, vec![Reply::Fail]);
    }

    /// Every invocation so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Operation names invoked so far, in order.
    pub fn operations(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.operation).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The most recent invocation of `operation`.
    pub fn last_call(&self, operation: &str) -> Option<Call> {
        self.calls()
            .into_iter()
            .rev()
            .find(|c| c.operation == operation)
    }

    fn next_reply(&self, operation: &str, id: Option<&str>) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap();
        let position = routes
            .iter()
            .position(|r| r.operation == operation && r.id.is_some() && r.id.as_deref() == id)
            .or_else(|| {
                routes
                    .iter()
                    .position(|r| r.operation == operation && r.id.is_none())
            })?;
        let replies = &mut routes[position].replies;
        if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn invoke(
        &self,
        operation: &str,
        request: &OperationRequest,
    ) -> IbmResult<OperationResponse> {
        self.calls.lock().unwrap().push(Call {
            operation: operation.to_string(),
            request: request.clone(),
        });

        let id = request.param_str("id");
        match self.next_reply(operation, id.as_deref()) {
            Some(Reply::Respond(status, body)) => Ok(OperationResponse::new(status, body)),
            Some(Reply::Fail) | None => Err(IbmError::UnknownOperation(operation.to_string())),
        }
    }
}

/// Backend over `transport` with a token already configured.
pub fn backend(transport: &Arc<MockTransport>) -> IbmBackend {
    let config = IbmConfig::new("ibm_torino").with_token("test-token");
    IbmBackend::with_transport(config, transport.clone())
}

/// Backend over `transport` with no credential.
pub fn anonymous_backend(transport: &Arc<MockTransport>) -> IbmBackend {
    IbmBackend::with_transport(IbmConfig::new("ibm_torino"), transport.clone())
}

/// Route adapter logs to the test writer. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
