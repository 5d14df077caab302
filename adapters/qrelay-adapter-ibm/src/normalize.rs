//! Response normalization.
//!
//! Provider bodies are loosely typed and change shape between API versions.
//! Every extraction here is an ordered list of candidate paths, tried in
//! sequence; the first present value wins. The lists are the single place
//! where fallback order is defined.
//!
//! Nothing in this module fails: malformed input degrades to `None`, an
//! empty mapping or [`JobStatus::Unknown`].

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::debug;

use qrelay_hal::JobStatus;

/// A path into a document. Numeric segments index arrays.
pub type FieldPath = &'static [&'static str];

/// Where a create-job response carries the provider job id.
pub const PROVIDER_ID_PATHS: &[FieldPath] = &[&["id"], &["job_id"]];

/// Where a get-job response carries the job status.
pub const STATUS_PATHS: &[FieldPath] = &[
    &["status"],
    &["state", "status"],
    &["Status"],
    &["job_status"],
    &["jobStatus"],
];

/// Where a results response carries measurements.
pub const MEASUREMENT_PATHS: &[FieldPath] = &[
    &["measurement-results"],
    &["counts"],
    &["results"],
    &["pubs", "0", "results"],
];

/// Where a create-session response carries the session id.
pub const SESSION_ID_PATHS: &[FieldPath] = &[&["id"], &["session_id"]];

/// Interpret a body as a structured document.
///
/// Objects and arrays pass through. A string is parsed as JSON and kept if
/// it yields an object or array. Anything else is `None`.
pub fn parse_document(body: &Value) -> Option<Cow<'_, Value>> {
    match body {
        Value::Object(_) | Value::Array(_) => Some(Cow::Borrowed(body)),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => Some(Cow::Owned(parsed)),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "string body is not a JSON document");
                None
            }
        },
        _ => None,
    }
}

/// Follow `path` into `doc`.
pub fn lookup<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |node, segment| match node {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// First path in `paths` that resolves to a non-null value.
pub fn first_present<'a>(doc: &'a Value, paths: &[FieldPath]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| lookup(doc, path))
        .find(|v| !v.is_null())
}

/// First path whose value renders as a non-empty string.
///
/// Numbers are accepted and rendered in decimal.
pub fn first_string(doc: &Value, paths: &[FieldPath]) -> Option<String> {
    paths.iter().filter_map(|path| lookup(doc, path)).find_map(scalar_string)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Provider job id from a create-job response.
///
/// Tries `id`, then `job_id`; a body that is plain non-JSON text is taken
/// as the id itself.
pub fn provider_id(body: &Value) -> Option<String> {
    match parse_document(body) {
        Some(doc) => first_string(&doc, PROVIDER_ID_PATHS),
        None => body
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

/// Map provider status text onto the canonical vocabulary.
///
/// Only the five canonical words are recognized, case-insensitively.
pub fn canonical_status(text: &str) -> JobStatus {
    match text.trim().to_lowercase().as_str() {
        "completed" => JobStatus::Completed,
        "running" => JobStatus::Running,
        "queued" => JobStatus::Queued,
        "cancelled" => JobStatus::Cancelled,
        "failed" => JobStatus::Failed,
        _ => JobStatus::Unknown,
    }
}

/// Canonical status of a get-job response body.
pub fn status_from_body(body: &Value) -> JobStatus {
    parse_document(body)
        .and_then(|doc| {
            STATUS_PATHS
                .iter()
                .filter_map(|path| lookup(&doc, path))
                .find_map(|v| v.as_str().map(canonical_status))
        })
        .unwrap_or(JobStatus::Unknown)
}

/// Measurement structure of a results response body.
///
/// Falls back to an empty mapping when nothing matches or the body does not
/// parse.
pub fn measurements(body: &Value) -> Value {
    parse_document(body)
        .and_then(|doc| first_present(&doc, MEASUREMENT_PATHS).cloned())
        .unwrap_or_else(|| Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_id_chain() {
        assert_eq!(provider_id(&json!({"id": "a", "job_id": "b"})).as_deref(), Some("a"));
        assert_eq!(provider_id(&json!({"job_id": "b"})).as_deref(), Some("b"));
        assert_eq!(provider_id(&json!({"id": 17})).as_deref(), Some("17"));
        assert_eq!(provider_id(&json!({"id": "", "job_id": "b"})).as_deref(), Some("b"));
        assert_eq!(provider_id(&json!({"other": 1})), None);
    }

    #[test]
    fn test_provider_id_from_string_bodies() {
        assert_eq!(provider_id(&json!(r#"{"id":"x"}"#)).as_deref(), Some("x"));
        assert_eq!(provider_id(&json!("  raw-job-9 \n")).as_deref(), Some("raw-job-9"));
        assert_eq!(provider_id(&json!("   ")), None);
        assert_eq!(provider_id(&Value::Null), None);
    }

    #[test]
    fn test_canonical_status_is_case_insensitive() {
        assert_eq!(canonical_status("COMPLETED"), JobStatus::Completed);
        assert_eq!(canonical_status("Running"), JobStatus::Running);
        assert_eq!(canonical_status("queued"), JobStatus::Queued);
        assert_eq!(canonical_status("Cancelled"), JobStatus::Cancelled);
        assert_eq!(canonical_status("FAILED"), JobStatus::Failed);
    }

    #[test]
    fn test_canonical_status_unrecognized() {
        assert_eq!(canonical_status("validating"), JobStatus::Unknown);
        assert_eq!(canonical_status("ERROR"), JobStatus::Unknown);
        assert_eq!(canonical_status(""), JobStatus::Unknown);
    }

    #[test]
    fn test_status_from_body_chain() {
        assert_eq!(status_from_body(&json!({"status": "Completed"})), JobStatus::Completed);
        assert_eq!(
            status_from_body(&json!({"state": {"status": "Running"}})),
            JobStatus::Running
        );
        assert_eq!(status_from_body(&json!({"Status": "QUEUED"})), JobStatus::Queued);
        assert_eq!(status_from_body(&json!({"jobStatus": "failed"})), JobStatus::Failed);
        assert_eq!(status_from_body(&json!({})), JobStatus::Unknown);
        assert_eq!(status_from_body(&json!("Completed")), JobStatus::Unknown);
    }

    #[test]
    fn test_status_skips_non_string_candidates() {
        let body = json!({"status": {"code": 3}, "state": {"status": "Cancelled"}});
        assert_eq!(status_from_body(&body), JobStatus::Cancelled);
    }

    #[test]
    fn test_measurement_chain_order() {
        let body = json!({
            "counts": {"00": 1},
            "measurement-results": {"11": 2},
        });
        assert_eq!(measurements(&body), json!({"11": 2}));
        assert_eq!(measurements(&json!({"counts": {"01": 3}})), json!({"01": 3}));
        assert_eq!(
            measurements(&json!({"results": [{"data": {}}]})),
            json!([{"data": {}}])
        );
        assert_eq!(
            measurements(&json!({"pubs": [{"results": {"10": 4}}]})),
            json!({"10": 4})
        );
        assert_eq!(measurements(&json!({"nothing": true})), json!({}));
    }

    #[test]
    fn test_measurements_from_string_body() {
        assert_eq!(measurements(&json!(r#"{"counts": {"0": 5}}"#)), json!({"0": 5}));
        assert_eq!(measurements(&json!("not json at all")), json!({}));
        assert_eq!(measurements(&Value::Null), json!({}));
    }
}
