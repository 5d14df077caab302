//! Operation dispatcher.
//!
//! Provider operation names drift between API versions, so each logical
//! [`Action`] carries an ordered list of candidate names. The dispatcher
//! tries them in order, once each, with no delay:
//!
//! - transport error → skip to the next candidate
//! - `401 Unauthorized` → skip to the next candidate
//! - any other response → return it, whatever its status
//!
//! When every candidate is skipped the result is `None`. Callers treat that
//! as a dispatch failure, which is distinct from a response that carries an
//! error status.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::transport::{OperationRequest, OperationResponse, Transport};

/// IBM API version header value.
pub const IBM_API_VERSION: &str = "2026-02-01";

/// Name of the API version header.
pub const API_VERSION_HEADER: &str = "IBM-API-Version";

/// Name of the authorization header.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Logical provider actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListBackends,
    GetBackendProperties,
    GetBackendConfiguration,
    GetBackendStatus,
    CreateJob,
    GetJob,
    GetJobResults,
    CancelJob,
    GetJobMetrics,
    GetJobLogs,
    GetTranspiledCircuits,
    CreateSession,
    CloseSession,
    GetSession,
    GetUsageAnalytics,
}

impl Action {
    /// Every action.
    pub const ALL: [Action; 15] = [
        Action::ListBackends,
        Action::GetBackendProperties,
        Action::GetBackendConfiguration,
        Action::GetBackendStatus,
        Action::CreateJob,
        Action::GetJob,
        Action::GetJobResults,
        Action::CancelJob,
        Action::GetJobMetrics,
        Action::GetJobLogs,
        Action::GetTranspiledCircuits,
        Action::CreateSession,
        Action::CloseSession,
        Action::GetSession,
        Action::GetUsageAnalytics,
    ];

    /// Logical name, used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::ListBackends => "list-backends",
            Action::GetBackendProperties => "get-backend-properties",
            Action::GetBackendConfiguration => "get-backend-configuration",
            Action::GetBackendStatus => "get-backend-status",
            Action::CreateJob => "create-job",
            Action::GetJob => "get-job",
            Action::GetJobResults => "get-job-results",
            Action::CancelJob => "cancel-job",
            Action::GetJobMetrics => "get-job-metrics",
            Action::GetJobLogs => "get-job-logs",
            Action::GetTranspiledCircuits => "get-transpiled-circuits",
            Action::CreateSession => "create-session",
            Action::CloseSession => "close-session",
            Action::GetSession => "get-session",
            Action::GetUsageAnalytics => "get-usage-analytics",
        }
    }

    /// Provider operation names to try, in order.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Action::ListBackends => &["list_backends", "get_backends"],
            Action::GetBackendProperties => &["get_backend_properties", "get_backend_properties_id"],
            Action::GetBackendConfiguration => {
                &["get_backend_configuration", "get_backend_configuration_id"]
            }
            Action::GetBackendStatus => &["get_backend_status"],
            Action::CreateJob => &["create_job"],
            Action::GetJob => &["get_job_details_jid", "get_job_details"],
            Action::GetJobResults => &["get_job_results_jid", "get_job_results", "get_results"],
            Action::CancelJob => &["cancel_job_jid", "cancel_job", "delete_job_jid"],
            Action::GetJobMetrics => &["get_job_metrics_jid", "get_job_metrics"],
            Action::GetJobLogs => &["get_job_logs_jid", "get_job_logs"],
            Action::GetTranspiledCircuits => {
                &["get_transpiled_circuits_jid", "get_transpiled_circuits"]
            }
            Action::CreateSession => &["create_session"],
            Action::CloseSession => &["delete_session_close", "close_session"],
            Action::GetSession => &["get_session_information", "get_session"],
            Action::GetUsageAnalytics => &["get_usage_analytics", "get_analytics_usage"],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tries candidate operations through a [`Transport`].
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatcher over `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Dispatch a logical action.
    pub async fn dispatch(
        &self,
        action: Action,
        request: OperationRequest,
        credential: Option<&str>,
    ) -> Option<OperationResponse> {
        let response = self
            .dispatch_candidates(action.candidates(), request, credential)
            .await;
        if response.is_none() {
            warn!(action = action.name(), "no candidate operation responded");
        }
        response
    }

    /// Try `candidates` in order and return the first authorized response.
    pub async fn dispatch_candidates(
        &self,
        candidates: &[&str],
        mut request: OperationRequest,
        credential: Option<&str>,
    ) -> Option<OperationResponse> {
        request.set_header(API_VERSION_HEADER, IBM_API_VERSION);
        if let Some(token) = credential.filter(|t| !t.trim().is_empty()) {
            request.set_header(AUTHORIZATION_HEADER, format!("Bearer {token}"));
        }

        for &operation in candidates {
            match self.transport.invoke(operation, &request).await {
                Ok(response) if response.is_unauthorized() => {
                    debug!(operation, "unauthorized, trying next candidate");
                }
                Ok(response) => {
                    debug!(operation, status = response.status, "candidate responded");
                    return Some(response);
                }
                Err(e) => {
                    debug!(operation, error = %e, "candidate failed, trying next");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IbmError, IbmResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Responds per operation name from a fixed table and records calls.
    struct TableTransport {
        table: Vec<(&'static str, Option<u16>)>,
        calls: Mutex<Vec<(String, OperationRequest)>>,
    }

    impl TableTransport {
        fn new(table: Vec<(&'static str, Option<u16>)>) -> Arc<Self> {
            Arc::new(Self {
                table,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn called(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
        }
    }

    #[async_trait]
    impl Transport for TableTransport {
        async fn invoke(
            &self,
            operation: &str,
            request: &OperationRequest,
        ) -> IbmResult<OperationResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((operation.to_string(), request.clone()));
            match self.table.iter().find(|(n, _)| *n == operation) {
                Some((_, Some(status))) => {
                    Ok(OperationResponse::new(*status, json!({"op": operation})))
                }
                _ => Err(IbmError::UnknownOperation(operation.to_string())),
            }
        }
    }

    #[test]
    fn test_alias_counts() {
        assert!(Action::GetJob.candidates().len() >= 2);
        assert!(Action::GetJobResults.candidates().len() >= 3);
        assert!(Action::CancelJob.candidates().len() >= 3);
        for action in Action::ALL {
            assert!(!action.candidates().is_empty(), "{action} has no candidates");
        }
    }

    #[tokio::test]
    async fn test_first_authorized_response_wins() {
        let transport = TableTransport::new(vec![
            ("get_job_results_jid", Some(401)),
            ("get_job_results", Some(404)),
            ("get_results", Some(200)),
        ]);
        let dispatcher = Dispatcher::new(transport.clone());

        let response = dispatcher
            .dispatch(Action::GetJobResults, OperationRequest::new(), Some("tok"))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, json!({"op": "get_job_results"}));
        assert_eq!(transport.called(), vec!["get_job_results_jid", "get_job_results"]);
    }

    #[tokio::test]
    async fn test_transport_errors_are_skipped() {
        let transport = TableTransport::new(vec![("cancel_job", Some(200))]);
        let dispatcher = Dispatcher::new(transport.clone());

        let response = dispatcher
            .dispatch(Action::CancelJob, OperationRequest::new(), None)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.called(), vec!["cancel_job_jid", "cancel_job"]);
    }

    #[tokio::test]
    async fn test_exhausted_candidates_yield_none() {
        let transport = TableTransport::new(vec![
            ("get_job_details_jid", Some(401)),
            ("get_job_details", Some(401)),
        ]);
        let dispatcher = Dispatcher::new(transport.clone());

        let response = dispatcher
            .dispatch(Action::GetJob, OperationRequest::new(), Some("tok"))
            .await;

        assert!(response.is_none());
        assert_eq!(transport.called().len(), 2);
    }

    #[tokio::test]
    async fn test_headers_attached_per_candidate() {
        let transport = TableTransport::new(vec![("list_backends", Some(200))]);
        let dispatcher = Dispatcher::new(transport.clone());

        dispatcher
            .dispatch(Action::ListBackends, OperationRequest::new(), Some("abc"))
            .await
            .unwrap();

        let calls = transport.calls.lock().unwrap();
        let (_, request) = &calls[0];
        assert_eq!(request.header(API_VERSION_HEADER), Some(IBM_API_VERSION));
        assert_eq!(request.header(AUTHORIZATION_HEADER), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_credential() {
        let transport = TableTransport::new(vec![("list_backends", Some(200))]);
        let dispatcher = Dispatcher::new(transport.clone());

        dispatcher
            .dispatch(Action::ListBackends, OperationRequest::new(), None)
            .await
            .unwrap();

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].1.header(AUTHORIZATION_HEADER), None);
        assert_eq!(calls[0].1.header(API_VERSION_HEADER), Some(IBM_API_VERSION));
    }
}
