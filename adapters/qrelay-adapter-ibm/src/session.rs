//! Provider session management.
//!
//! Sessions are mirrored locally so that `session_info()` can fill gaps in
//! the provider's answer. Closing always removes the local record, even
//! when the provider's confirmation is missing or ambiguous; the two sides
//! may therefore diverge.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::dispatch::{Action, Dispatcher};
use crate::error::{IbmError, IbmResult};
use crate::normalize::{SESSION_ID_PATHS, first_string, parse_document};
use crate::request::CreateSessionRequest;
use crate::state::{AdapterState, SessionRecord};
use crate::transport::OperationRequest;

/// Default maximum session lifetime, in seconds.
pub const DEFAULT_MAX_TTL: u64 = 3600;

/// Marker carried by lookups on sessions neither side knows.
pub const UNKNOWN_SESSION: &str = "unknown-session";

/// Options for opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Target device.
    pub backend: String,
    /// Maximum lifetime in seconds; [`DEFAULT_MAX_TTL`] when unset.
    pub max_ttl: Option<u64>,
    /// Instance to bill.
    pub instance: Option<String>,
    /// Channel (`ibm_cloud`, `ibm_quantum`).
    pub channel: Option<String>,
}

impl SessionOptions {
    /// Options for `backend` with defaults elsewhere.
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            max_ttl: None,
            instance: None,
            channel: None,
        }
    }

    /// Set the maximum lifetime.
    pub fn with_max_ttl(mut self, seconds: u64) -> Self {
        self.max_ttl = Some(seconds);
        self
    }

    /// Set the instance.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Set the channel.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

/// A session acknowledged by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Provider-issued session id.
    pub id: String,
    /// Target device.
    pub backend: String,
    /// Requested maximum lifetime in seconds.
    pub max_ttl: u64,
    /// Local creation time.
    pub created_at: DateTime<Utc>,
    /// Provider response body.
    pub raw: Value,
}

/// Outcome of closing a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClosure {
    /// Session id.
    pub session_id: String,
    /// Whether a local record existed and was removed.
    pub removed_local: bool,
    /// Provider status code, if any candidate responded.
    pub status_code: Option<u16>,
    /// Whether the provider answered with a success status.
    pub confirmed: bool,
    /// Provider response body (`Null` when nothing responded).
    pub raw: Value,
}

/// Merged view of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    /// Session id.
    pub session_id: String,
    /// Provider fields, with local fields filling what the provider omits.
    pub fields: Map<String, Value>,
    /// Whether this instance holds a local record.
    pub known_locally: bool,
    /// Provider status code, if any candidate responded.
    pub status_code: Option<u16>,
    /// `unknown-session` when neither side knows the id.
    pub error: Option<String>,
}

impl SessionInfo {
    /// Whether neither side knows the session.
    pub fn is_unknown_session(&self) -> bool {
        self.error.as_deref() == Some(UNKNOWN_SESSION)
    }
}

/// Open a session and record it locally.
///
/// Requires a credential. The local record is written only once the
/// provider acknowledges with a success status and a session id.
#[instrument(skip(dispatcher, state))]
pub async fn create(
    dispatcher: &Dispatcher,
    state: &AdapterState,
    options: &SessionOptions,
) -> IbmResult<Session> {
    let token = state
        .token()
        .await
        .filter(|t| !t.trim().is_empty())
        .ok_or(IbmError::MissingToken)?;
    if options.backend.trim().is_empty() {
        return Err(IbmError::MissingOption("backend"));
    }

    let max_ttl = options.max_ttl.unwrap_or(DEFAULT_MAX_TTL);
    let body = serde_json::to_value(CreateSessionRequest {
        backend: options.backend.clone(),
        max_ttl,
        instance: options.instance.clone(),
        channel: options.channel.clone(),
    })?;

    let response = dispatcher
        .dispatch(
            Action::CreateSession,
            OperationRequest::new().with_body(body),
            Some(&token),
        )
        .await
        .ok_or_else(|| IbmError::DispatchFailed(Action::CreateSession.name().to_string()))?;

    if !response.is_success() {
        return Err(IbmError::ApiError {
            code: Some(response.status),
            message: format!("session creation rejected with HTTP {}", response.status),
        });
    }
    let id = parse_document(&response.body)
        .and_then(|doc| first_string(&doc, SESSION_ID_PATHS))
        .ok_or_else(|| IbmError::ApiError {
            code: Some(response.status),
            message: "session response carried no session id".to_string(),
        })?;

    let created_at = Utc::now();
    state
        .insert_session(
            id.clone(),
            SessionRecord {
                backend: options.backend.clone(),
                created_at,
                max_ttl,
            },
        )
        .await;
    info!(session_id = %id, backend = %options.backend, max_ttl, "session created");

    Ok(Session {
        id,
        backend: options.backend.clone(),
        max_ttl,
        created_at,
        raw: response.body,
    })
}

/// Close a session. Never fails; the local record is always removed.
#[instrument(skip(dispatcher, state))]
pub async fn close(
    dispatcher: &Dispatcher,
    state: &AdapterState,
    session_id: &str,
) -> SessionClosure {
    let token = state.token().await;
    let response = dispatcher
        .dispatch(
            Action::CloseSession,
            OperationRequest::new().param("session_id", session_id),
            token.as_deref(),
        )
        .await;
    let removed_local = state.remove_session(session_id).await.is_some();

    if response.is_none() {
        warn!(session_id, "session close not confirmed by provider");
    }

    SessionClosure {
        session_id: session_id.to_string(),
        removed_local,
        status_code: response.as_ref().map(|r| r.status),
        confirmed: response.as_ref().is_some_and(|r| r.is_success()),
        raw: response.map(|r| r.body).unwrap_or(Value::Null),
    }
}

/// Query a session and merge in what is known locally.
#[instrument(skip(dispatcher, state))]
pub async fn info(
    dispatcher: &Dispatcher,
    state: &AdapterState,
    session_id: &str,
) -> SessionInfo {
    let token = state.token().await;
    let local = state.session(session_id).await;
    let response = dispatcher
        .dispatch(
            Action::GetSession,
            OperationRequest::new().param("session_id", session_id),
            token.as_deref(),
        )
        .await;

    let mut fields = Map::new();
    let mut provider_knows = false;
    if let Some(resp) = response.as_ref().filter(|r| r.is_success()) {
        if let Some(doc) = parse_document(&resp.body) {
            if let Value::Object(map) = doc.into_owned() {
                fields = map;
            }
        }
        provider_knows = true;
    }

    if let Some(record) = &local {
        fill_absent(&mut fields, "backend", Value::from(record.backend.clone()));
        fill_absent(&mut fields, "created_at", Value::from(record.created_at.to_rfc3339()));
        fill_absent(&mut fields, "max_ttl", Value::from(record.max_ttl));
    }
    if provider_knows || local.is_some() {
        fill_absent(&mut fields, "id", Value::from(session_id.to_string()));
    }

    SessionInfo {
        session_id: session_id.to_string(),
        fields,
        known_locally: local.is_some(),
        status_code: response.map(|r| r.status),
        error: (!provider_knows && local.is_none()).then(|| UNKNOWN_SESSION.to_string()),
    }
}

/// Set `key` unless the provider already supplied a non-null value.
fn fill_absent(fields: &mut Map<String, Value>, key: &str, value: Value) {
    match fields.get_mut(key) {
        Some(existing) if !existing.is_null() => {}
        Some(existing) => *existing = value,
        None => {
            fields.insert(key.to_string(), value);
        }
    }
}
