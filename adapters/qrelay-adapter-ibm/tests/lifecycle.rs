//! Job lifecycle against a scripted provider.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use common::{MockTransport, Reply, anonymous_backend, backend, init_tracing};
use qrelay_adapter_ibm::IbmBackend;
use qrelay_adapter_ibm::dispatch::{API_VERSION_HEADER, AUTHORIZATION_HEADER, IBM_API_VERSION};
use qrelay_hal::{Backend, HalError, JobId, JobStatus, MISSING_PROVIDER_ID, SubmitOptions};
use qrelay_ir::Circuit;

#[tokio::test]
async fn test_submit_sends_sampler_body_and_headers() {
    init_tracing();
    let transport = MockTransport::new();
    transport.respond("create_job", 200, json!({"id": "prov-1", "backend": "ibm_torino"}));
    let backend = backend(&transport);

    let circuit = Circuit::bell().unwrap();
    let job_id = backend
        .submit(&circuit, &backend.default_options(1024))
        .await
        .unwrap();

    let record = backend.job_record(&job_id).await.unwrap();
    assert_eq!(record.provider_id.as_deref(), Some("prov-1"));
    assert_eq!(record.backend, "ibm_torino");
    assert_eq!(record.shots, 1024);

    let call = transport.last_call("create_job").unwrap();
    assert_eq!(call.request.header(API_VERSION_HEADER), Some(IBM_API_VERSION));
    assert_eq!(
        call.request.header(AUTHORIZATION_HEADER),
        Some("Bearer test-token")
    );

    let body = call.request.body.unwrap();
    assert_eq!(body["program_id"], "sampler");
    assert_eq!(body["backend"], "ibm_torino");
    assert_eq!(body["params"]["version"], 2);
    let pub_ = &body["params"]["pubs"][0];
    assert!(pub_[0].as_str().unwrap().starts_with("OPENQASM 3.0;"));
    assert!(pub_[0].as_str().unwrap().contains("include \"stdgates.inc\";"));
    assert_eq!(pub_[2], 1024);
}

#[tokio::test]
async fn test_unset_options_are_absent_from_body() {
    let transport = MockTransport::new();
    transport.respond("create_job", 200, json!({"id": "prov-1"}));
    let backend = backend(&transport);

    backend
        .submit(&Circuit::bell().unwrap(), &backend.default_options(100))
        .await
        .unwrap();

    let body = transport.last_call("create_job").unwrap().request.body.unwrap();
    let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    for optional in ["tags", "log_level", "runtime", "cost", "session_id"] {
        assert!(!keys.contains(&optional), "{optional} should be omitted");
    }
}

#[tokio::test]
async fn test_set_options_are_forwarded() {
    let transport = MockTransport::new();
    transport.respond("create_job", 200, json!({"id": "prov-1"}));
    let backend = backend(&transport);

    let options = backend
        .default_options(100)
        .with_tags(vec!["nightly".into()])
        .with_max_execution_time(300)
        .with_session("sess-9");
    backend
        .submit(&Circuit::bell().unwrap(), &options)
        .await
        .unwrap();

    let body = transport.last_call("create_job").unwrap().request.body.unwrap();
    assert_eq!(body["tags"], json!(["nightly"]));
    assert_eq!(body["cost"], 300);
    assert_eq!(body["session_id"], "sess-9");
    assert!(body.get("log_level").is_none());
}

#[tokio::test]
async fn test_handles_are_unique() {
    let transport = MockTransport::new();
    transport.respond("create_job", 200, json!({"id": "same-provider-id"}));
    let backend = backend(&transport);
    let circuit = Circuit::bell().unwrap();
    let options = backend.default_options(10);

    let mut seen = HashSet::new();
    for _ in 0..25 {
        let id = backend.submit(&circuit, &options).await.unwrap();
        assert!(seen.insert(id));
    }
}

#[tokio::test]
async fn test_submit_without_credential_makes_no_call() {
    let transport = MockTransport::new();
    transport.respond("create_job", 200, json!({"id": "prov-1"}));
    let backend = anonymous_backend(&transport);

    let err = backend
        .submit(&Circuit::bell().unwrap(), &backend.default_options(10))
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::AuthenticationFailed(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_submit_with_missing_options_makes_no_call() {
    let transport = MockTransport::new();
    let backend = backend(&transport);
    let circuit = Circuit::bell().unwrap();

    let no_program = SubmitOptions::new(10).with_backend("ibm_torino");
    let err = backend.submit(&circuit, &no_program).await.unwrap_err();
    assert!(matches!(err, HalError::InvalidOptions(_)));

    let blank_backend = SubmitOptions::new(10)
        .with_backend("  ")
        .with_program("sampler");
    let err = backend.submit(&circuit, &blank_backend).await.unwrap_err();
    assert!(matches!(err, HalError::InvalidOptions(_)));

    let zero_shots = backend.default_options(0);
    let err = backend.submit(&circuit, &zero_shots).await.unwrap_err();
    assert!(matches!(err, HalError::InvalidShots(_)));

    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_authenticate_enables_submission() {
    let transport = MockTransport::new();
    transport.respond("create_job", 200, json!({"id": "prov-1"}));
    let backend = anonymous_backend(&transport);

    backend.authenticate("late-token").await.unwrap();
    backend
        .submit(&Circuit::bell().unwrap(), &backend.default_options(10))
        .await
        .unwrap();

    let call = transport.last_call("create_job").unwrap();
    assert_eq!(
        call.request.header(AUTHORIZATION_HEADER),
        Some("Bearer late-token")
    );
}

#[tokio::test]
async fn test_submit_with_no_responding_candidate_is_dispatch_failure() {
    let transport = MockTransport::new();
    transport.fail("create_job");
    let backend = backend(&transport);

    let err = backend
        .submit(&Circuit::bell().unwrap(), &backend.default_options(10))
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::DispatchFailed(_)));
    assert_eq!(transport.operations(), vec!["create_job"]);
}

#[tokio::test]
async fn test_submit_response_without_id_registers_unresolved_job() {
    let transport = MockTransport::new();
    transport.respond("create_job", 200, json!({"backend": "ibm_torino"}));
    let backend = backend(&transport);

    let job_id = backend
        .submit(&Circuit::bell().unwrap(), &backend.default_options(10))
        .await
        .unwrap();
    assert_eq!(backend.job_record(&job_id).await.unwrap().provider_id, None);

    let before = transport.call_count();
    assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Unknown);
    let result = backend.result(&job_id).await.unwrap();
    assert_eq!(result.status, JobStatus::Failed);
    assert_eq!(result.error.as_deref(), Some(MISSING_PROVIDER_ID));
    assert_eq!(transport.call_count(), before);
}

#[tokio::test]
async fn test_plain_text_create_response_is_the_provider_id() {
    let transport = MockTransport::new();
    transport.respond("create_job", 200, json!("  prov-text  "));
    let backend = backend(&transport);

    let job_id = backend
        .submit(&Circuit::bell().unwrap(), &backend.default_options(10))
        .await
        .unwrap();
    assert_eq!(
        backend.job_record(&job_id).await.unwrap().provider_id.as_deref(),
        Some("prov-text")
    );
}

#[tokio::test]
async fn test_error_create_response_never_becomes_the_provider_id() {
    let transport = MockTransport::new();
    transport.respond(
        "create_job",
        500,
        json!("<html>Internal Server Error</html>"),
    );
    let backend = backend(&transport);

    let job_id = backend
        .submit(&Circuit::bell().unwrap(), &backend.default_options(10))
        .await
        .unwrap();
    assert_eq!(backend.job_record(&job_id).await.unwrap().provider_id, None);

    let result = backend.result(&job_id).await.unwrap();
    assert_eq!(result.error.as_deref(), Some(MISSING_PROVIDER_ID));
}

#[tokio::test]
async fn test_unknown_handle_is_answered_locally() {
    let transport = MockTransport::new();
    let backend = backend(&transport);
    let stranger = JobId::new("never-issued");

    assert_eq!(backend.status(&stranger).await.unwrap(), JobStatus::Unknown);

    let result = backend.result(&stranger).await.unwrap();
    assert!(result.is_unknown_job());
    assert_eq!(result.status, JobStatus::Failed);

    let cancel = backend.cancel(&stranger).await.unwrap();
    assert!(!cancel.accepted);

    assert_eq!(transport.call_count(), 0);
}

async fn submitted(transport: &Arc<MockTransport>) -> (IbmBackend, JobId) {
    transport.respond("create_job", 200, json!({"id": "prov-1"}));
    let backend = backend(transport);
    let job_id = backend
        .submit(&Circuit::bell().unwrap(), &backend.default_options(10))
        .await
        .unwrap();
    (backend, job_id)
}

#[tokio::test]
async fn test_status_is_normalized() {
    let transport = MockTransport::new();
    transport.respond_seq(
        "get_job_details_jid",
        vec![
            Reply::Respond(200, json!({"status": "Queued"})),
            Reply::Respond(200, json!({"state": {"status": "RUNNING"}})),
            Reply::Respond(200, json!(r#"{"status": "completed"}"#)),
            Reply::Respond(200, json!({"status": "Validating"})),
        ],
    );
    let (backend, job_id) = submitted(&transport).await;

    assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Queued);
    assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Running);
    assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Completed);
    assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Unknown);

    let call = transport.last_call("get_job_details_jid").unwrap();
    assert_eq!(call.request.param_str("id").as_deref(), Some("prov-1"));
}

#[tokio::test]
async fn test_alias_fallback_skips_unauthorized_and_failed_candidates() {
    let transport = MockTransport::new();
    transport.respond("get_job_details_jid", 401, json!({"errors": ["unauthorized"]}));
    transport.respond("get_job_details", 200, json!({"status": "Failed"}));
    let (backend, job_id) = submitted(&transport).await;

    assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Failed);
    assert_eq!(
        transport.operations(),
        vec!["create_job", "get_job_details_jid", "get_job_details"]
    );
}

#[tokio::test]
async fn test_non_success_status_is_returned_not_skipped() {
    let transport = MockTransport::new();
    transport.respond("get_job_details_jid", 404, json!({"errors": ["not found"]}));
    transport.respond("get_job_details", 200, json!({"status": "Completed"}));
    let (backend, job_id) = submitted(&transport).await;

    assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Unknown);
    assert_eq!(
        transport.operations(),
        vec!["create_job", "get_job_details_jid"]
    );
}

#[tokio::test]
async fn test_status_dispatch_failure_is_an_error() {
    let transport = MockTransport::new();
    let (backend, job_id) = submitted(&transport).await;

    let err = backend.status(&job_id).await.unwrap_err();
    assert!(matches!(err, HalError::DispatchFailed(_)));
}

#[tokio::test]
async fn test_result_extracts_measurements() {
    let transport = MockTransport::new();
    transport.fail("get_job_results_jid");
    transport.respond(
        "get_job_results",
        200,
        json!({"results": [{"data": {"c": {"samples": ["0x0", "0x3", "0x3"]}}}]}),
    );
    let (backend, job_id) = submitted(&transport).await;

    let result = backend.result(&job_id).await.unwrap();
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.provider_id.as_deref(), Some("prov-1"));
    assert!(result.error.is_none());

    let counts = result.counts();
    assert_eq!(counts.total_shots(), 3);
    assert_eq!(counts.get("11"), 2);
    assert_eq!(counts.get("00"), 1);
}

#[tokio::test]
async fn test_result_with_counts_mapping() {
    let transport = MockTransport::new();
    transport.respond(
        "get_job_results_jid",
        200,
        json!({"counts": {"00": 480, "11": 520}}),
    );
    let (backend, job_id) = submitted(&transport).await;

    let result = backend.result(&job_id).await.unwrap();
    let counts = result.counts();
    assert_eq!(counts.total_shots(), 1000);
    assert_eq!(counts.most_frequent(), Some(("11", 520)));
}

#[tokio::test]
async fn test_result_without_measurements_is_empty_mapping() {
    let transport = MockTransport::new();
    transport.respond("get_job_results_jid", 200, json!("not json at all"));
    let (backend, job_id) = submitted(&transport).await;

    let result = backend.result(&job_id).await.unwrap();
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.measurements, json!({}));
    assert_eq!(result.raw, json!("not json at all"));
}

#[tokio::test]
async fn test_result_error_status_is_failed_shaped() {
    let transport = MockTransport::new();
    transport.respond("get_job_results_jid", 500, json!({"errors": ["boom"]}));
    let (backend, job_id) = submitted(&transport).await;

    let result = backend.result(&job_id).await.unwrap();
    assert_eq!(result.status, JobStatus::Failed);
    assert_eq!(result.error.as_deref(), Some("provider returned HTTP 500"));
    assert_eq!(result.raw, json!({"errors": ["boom"]}));
}

#[tokio::test]
async fn test_result_dispatch_failure_is_an_error() {
    let transport = MockTransport::new();
    let (backend, job_id) = submitted(&transport).await;

    let err = backend.result(&job_id).await.unwrap_err();
    assert!(matches!(err, HalError::DispatchFailed(_)));
}

#[tokio::test]
async fn test_cancel_reports_provider_status() {
    let transport = MockTransport::new();
    transport.fail("cancel_job_jid");
    transport.respond("cancel_job", 204, serde_json::Value::Null);
    let (backend, job_id) = submitted(&transport).await;

    let outcome = backend.cancel(&job_id).await.unwrap();
    assert!(outcome.accepted);
    assert_eq!(outcome.status_code, Some(204));
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn test_wait_polls_until_terminal() {
    let transport = MockTransport::new();
    transport.respond_seq(
        "get_job_details_jid",
        vec![
            Reply::Respond(200, json!({"status": "Running"})),
            Reply::Respond(200, json!({"status": "Completed"})),
        ],
    );
    transport.respond("get_job_results_jid", 200, json!({"counts": {"00": 10}}));
    let (backend, job_id) = submitted(&transport).await;

    let result = backend.wait(&job_id).await.unwrap();
    assert_eq!(result.counts().get("00"), 10);
}

#[tokio::test]
async fn test_wait_surfaces_failure() {
    let transport = MockTransport::new();
    transport.respond("get_job_details_jid", 200, json!({"status": "Failed"}));
    let (backend, job_id) = submitted(&transport).await;

    let err = backend.wait(&job_id).await.unwrap_err();
    assert!(matches!(err, HalError::JobFailed(_)));
}
