/// Credential Bundle Tests Module
///
/// Tests for the per-request credential bundle, focusing on the wipe
/// contract and request-field validation.
use inbox_agent::credentials::{require_field, require_json_field, CredentialBundle};
use inbox_agent::errors::AppError;
use serde_json::json;

fn sample_bundle() -> CredentialBundle {
    CredentialBundle {
        api_key: "sk-test-key".to_string(),
        oauth_token: "{\"refresh_token\":\"rt\"}".to_string(),
        oauth_client_secret: "{\"installed\":{}}".to_string(),
        display_name: "Casey".to_string(),
        instruction: "Summarize my inbox".to_string(),
    }
}

#[test]
fn test_wipe_overwrites_every_field() {
    let mut bundle = sample_bundle();

    bundle.wipe();

    assert!(bundle.api_key.is_empty());
    assert!(bundle.oauth_token.is_empty());
    assert!(bundle.oauth_client_secret.is_empty());
    assert!(bundle.display_name.is_empty());
    assert!(bundle.instruction.is_empty());
}

#[test]
fn test_wipe_is_idempotent() {
    let mut bundle = sample_bundle();
    bundle.wipe();
    bundle.wipe();
    assert!(bundle.api_key.is_empty());
}

#[test]
fn test_debug_output_redacts_all_fields() {
    let bundle = sample_bundle();
    let rendered = format!("{:?}", bundle);

    assert!(!rendered.contains("sk-test-key"));
    assert!(!rendered.contains("refresh_token"));
    assert!(!rendered.contains("Casey"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn test_require_field_accepts_non_empty() {
    let value = require_field("name", Some("Casey".to_string())).unwrap();
    assert_eq!(value, "Casey");
}

#[test]
fn test_require_field_rejects_missing_and_empty() {
    for input in [None, Some(String::new()), Some("   ".to_string())] {
        match require_field("Query", input) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("Query")),
            other => panic!("Expected validation error, got {:?}", other.map(|_| ())),
        }
    }
}

#[test]
fn test_require_json_field_accepts_object_and_string() {
    let from_object =
        require_json_field("GoogleToken", Some(json!({"refresh_token": "rt"}))).unwrap();
    assert!(from_object.contains("refresh_token"));

    let from_string =
        require_json_field("GoogleToken", Some(json!("{\"refresh_token\":\"rt\"}"))).unwrap();
    assert_eq!(from_string, "{\"refresh_token\":\"rt\"}");
}

#[test]
fn test_require_json_field_rejects_empty_forms() {
    for input in [
        None,
        Some(json!(null)),
        Some(json!("")),
        Some(json!({})),
        Some(json!(42)),
    ] {
        match require_json_field("googleCreds", input) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("googleCreds")),
            other => panic!("Expected validation error, got {:?}", other.map(|_| ())),
        }
    }
}
