//! Transport seam between the dispatcher and the network.
//!
//! The dispatcher speaks in operation names ("invoke `get_job_details_jid`
//! with these parameters"); a [`Transport`] turns that into a request and
//! hands back the status code and body. [`HttpTransport`] is the reqwest
//! implementation. Tests substitute a scripted transport.

use std::fmt;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Method, header};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::IbmConfig;
use crate::error::{IbmError, IbmResult};

/// User-Agent sent with requests (Cloudflare blocks the default reqwest UA).
const USER_AGENT: &str = concat!("qrelay/", env!("CARGO_PKG_VERSION"));

/// Everything but RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// One operation invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationRequest {
    /// Path and query parameters.
    pub params: Map<String, Value>,
    /// Headers to attach, in insertion order.
    pub headers: Vec<(String, String)>,
    /// JSON request body.
    pub body: Option<Value>,
}

impl OperationRequest {
    /// Empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a header, replacing any previous value with the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// Value of a header (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// String value of a parameter.
    pub fn param_str(&self, key: &str) -> Option<String> {
        match self.params.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Status code and body of a provider response.
///
/// Bodies that are not valid JSON arrive as [`Value::String`]; an empty body
/// is [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Value,
}

impl OperationResponse {
    /// Response with the given status and body.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the provider rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Invokes named provider operations.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `operation`. An `Err` means the operation never produced a
    /// response (unknown name, connection failure, timeout).
    async fn invoke(
        &self,
        operation: &str,
        request: &OperationRequest,
    ) -> IbmResult<OperationResponse>;
}

/// HTTP route for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// HTTP method.
    pub method: RouteMethod,
    /// Path template relative to the endpoint; `{name}` segments are filled
    /// from request parameters.
    pub path: &'static str,
}

/// HTTP methods used by the provider API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMethod {
    Get,
    Post,
    Delete,
}

impl RouteMethod {
    fn as_reqwest(self) -> Method {
        match self {
            RouteMethod::Get => Method::GET,
            RouteMethod::Post => Method::POST,
            RouteMethod::Delete => Method::DELETE,
        }
    }
}

const fn route(method: RouteMethod, path: &'static str) -> Route {
    Route { method, path }
}

/// Route table for every operation name the dispatcher may try.
///
/// `*_jid` and un-suffixed names resolve to the current `/v1` paths; the
/// older aliases resolve to the legacy `/runtime` paths.
pub fn resolve_route(operation: &str) -> Option<Route> {
    use RouteMethod::{Delete, Get, Post};

    let r = match operation {
        "list_backends" => route(Get, "/v1/backends"),
        "get_backends" => route(Get, "/runtime/backends"),
        "get_backend_properties" => route(Get, "/v1/backends/{backend_name}/properties"),
        "get_backend_properties_id" => route(Get, "/runtime/backends/{backend_name}/properties"),
        "get_backend_configuration" => route(Get, "/v1/backends/{backend_name}/configuration"),
        "get_backend_configuration_id" => {
            route(Get, "/runtime/backends/{backend_name}/configuration")
        }
        "get_backend_status" => route(Get, "/v1/backends/{backend_name}/status"),
        "create_job" => route(Post, "/v1/jobs"),
        "get_job_details_jid" => route(Get, "/v1/jobs/{id}"),
        "get_job_details" => route(Get, "/runtime/jobs/{id}"),
        "get_job_results_jid" => route(Get, "/v1/jobs/{id}/results"),
        "get_job_results" => route(Get, "/runtime/jobs/{id}/results"),
        "get_results" => route(Get, "/runtime/jobs/{id}/result"),
        "cancel_job_jid" => route(Post, "/v1/jobs/{id}/cancel"),
        "cancel_job" => route(Post, "/runtime/jobs/{id}/cancel"),
        "delete_job_jid" => route(Delete, "/v1/jobs/{id}"),
        "get_job_metrics_jid" => route(Get, "/v1/jobs/{id}/metrics"),
        "get_job_metrics" => route(Get, "/runtime/jobs/{id}/metrics"),
        "get_job_logs_jid" => route(Get, "/v1/jobs/{id}/logs"),
        "get_job_logs" => route(Get, "/runtime/jobs/{id}/logs"),
        "get_transpiled_circuits_jid" => route(Get, "/v1/jobs/{id}/transpiled_circuits"),
        "get_transpiled_circuits" => route(Get, "/runtime/jobs/{id}/transpiled_circuits"),
        "create_session" => route(Post, "/v1/sessions"),
        "delete_session_close" => route(Delete, "/v1/sessions/{session_id}/close"),
        "close_session" => route(Delete, "/runtime/sessions/{session_id}/close"),
        "get_session_information" => route(Get, "/v1/sessions/{session_id}"),
        "get_session" => route(Get, "/runtime/sessions/{session_id}"),
        "get_usage_analytics" => route(Get, "/v1/analytics/usage"),
        "get_analytics_usage" => route(Get, "/runtime/analytics/usage"),
        _ => return None,
    };
    Some(r)
}

/// Fill `{name}` segments of `template` from `request` parameters.
///
/// Each value is percent-encoded into exactly one path segment. Blank values
/// and values made only of dots are rejected. Returns the path and the
/// parameters left over for the query string.
pub fn expand_path(
    operation: &str,
    template: &'static str,
    request: &OperationRequest,
) -> IbmResult<(String, Vec<(String, String)>)> {
    let mut path = String::with_capacity(template.len());
    let mut used: Vec<&str> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        path.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            path.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name: &'static str = &after[..end];
        let value = request
            .param_str(name)
            .ok_or_else(|| IbmError::MissingParameter {
                operation: operation.to_string(),
                param: name,
            })?;
        if value.trim().is_empty() || value.chars().all(|c| c == '.') {
            return Err(IbmError::InvalidParameter {
                operation: operation.to_string(),
                param: name,
            });
        }
        path.extend(utf8_percent_encode(&value, PATH_SEGMENT));
        used.push(name);
        rest = &after[end + 1..];
    }
    path.push_str(rest);

    let query = request
        .params
        .keys()
        .filter(|k| !used.contains(&k.as_str()))
        .filter_map(|k| request.param_str(k).map(|v| (k.clone(), v)))
        .collect();

    Ok((path, query))
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    service_crn: Option<String>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("service_crn", &self.service_crn)
            .finish()
    }
}

impl HttpTransport {
    /// Build a transport from adapter configuration.
    ///
    /// The credential is not baked into the client: the dispatcher attaches
    /// it per call so that `authenticate()` takes effect immediately.
    pub fn new(config: &IbmConfig) -> IbmResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            service_crn: config.service_crn.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn invoke(
        &self,
        operation: &str,
        request: &OperationRequest,
    ) -> IbmResult<OperationResponse> {
        let route =
            resolve_route(operation).ok_or_else(|| IbmError::UnknownOperation(operation.into()))?;
        let (path, query) = expand_path(operation, route.path, request)?;
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self.client.request(route.method.as_reqwest(), &url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(crn) = &self.service_crn {
            builder = builder.header("Service-CRN", crn.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(operation, status, bytes = text.len(), "provider response");

        Ok(OperationResponse::new(status, body_from_text(&text)))
    }
}

/// Decode a response body: JSON when it parses, the raw text otherwise.
pub fn body_from_text(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
