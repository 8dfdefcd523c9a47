/// Error Tests Module
///
/// Tests for error display formatting and the mapping from failure kinds to
/// HTTP statuses and machine-readable kind strings.
use axum::http::StatusCode;
use inbox_agent::errors::{AgentError, AppError, GmailApiError, ModelError, StagingError};
use std::io;

#[test]
fn test_validation_error_maps_to_bad_request() {
    let error = AppError::Validation("Missing required field: Query".to_string());

    assert_eq!(error.kind(), "validation");
    assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error.to_string(),
        "Validation error: Missing required field: Query"
    );
}

#[test]
fn test_staging_error_maps_to_internal_server_error() {
    let error = AppError::Staging(StagingError::Io(io::Error::new(
        io::ErrorKind::PermissionDenied,
        "denied",
    )));

    assert_eq!(error.kind(), "staging");
    assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_mailbox_error_statuses() {
    let cases = [
        (
            GmailApiError::AuthError("rejected".to_string()),
            "auth",
            StatusCode::UNAUTHORIZED,
        ),
        (
            GmailApiError::CredentialError("no refresh_token".to_string()),
            "invalid_credentials",
            StatusCode::BAD_REQUEST,
        ),
        (
            GmailApiError::NetworkError("connection refused".to_string()),
            "connectivity",
            StatusCode::BAD_GATEWAY,
        ),
        (
            GmailApiError::ApiError("HTTP 500".to_string()),
            "mailbox_api",
            StatusCode::BAD_GATEWAY,
        ),
    ];

    for (inner, kind, status) in cases {
        let error = AppError::Mailbox(inner);
        assert_eq!(error.kind(), kind);
        assert_eq!(error.status(), status);
    }
}

#[test]
fn test_bounded_agent_failures_surface_as_results() {
    // Loop exhaustion is a bounded outcome of the run, not a server fault
    let step_limit = AppError::Agent(AgentError::StepLimitExceeded { max_steps: 12 });
    assert_eq!(step_limit.kind(), "step_limit_exceeded");
    assert_eq!(step_limit.status(), StatusCode::OK);
    assert_eq!(
        step_limit.to_string(),
        "Step limit of 12 exceeded without a final answer"
    );

    let parse = AppError::Agent(AgentError::Parse("no usable turn".to_string()));
    assert_eq!(parse.kind(), "parse");
    assert_eq!(parse.status(), StatusCode::OK);
}

#[test]
fn test_model_failures_map_to_bad_gateway() {
    let api = AppError::Agent(AgentError::Model(ModelError::Api("HTTP 500".to_string())));
    assert_eq!(api.kind(), "model");
    assert_eq!(api.status(), StatusCode::BAD_GATEWAY);

    let network = AppError::Agent(AgentError::Model(ModelError::Network(
        "timed out".to_string(),
    )));
    assert_eq!(network.kind(), "model_connectivity");
    assert_eq!(network.status(), StatusCode::BAD_GATEWAY);

    let tool = AppError::Agent(AgentError::Tool("mailbox unreachable".to_string()));
    assert_eq!(tool.kind(), "tool");
    assert_eq!(tool.status(), StatusCode::BAD_GATEWAY);
}
