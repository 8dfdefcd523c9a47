/// Configuration Tests Module
///
/// Tests for default configuration values, environment overrides, and digest
/// instruction rendering. All env-mutating assertions live in a single test
/// function because the test harness runs tests in parallel threads sharing
/// one process environment.
use inbox_agent::config::{Config, DEFAULT_DIGEST_TEMPLATE, GREETING};
use inbox_agent::errors::ConfigError;
use std::env;

#[test]
fn test_greeting_constant_is_stable() {
    assert_eq!(GREETING, "Res user 1");
}

#[test]
fn test_digest_instruction_substitutes_name() {
    let config = Config {
        bind_addr: "127.0.0.1:8000".to_string(),
        model: "gpt-4".to_string(),
        max_steps: 12,
        max_corrections: 3,
        request_timeout_secs: 30,
        digest_template: "Catch {name} up, please, {name}.".to_string(),
        gmail_base_url: "https://gmail.googleapis.com/gmail/v1".to_string(),
        oauth_token_url: "https://oauth2.googleapis.com/token".to_string(),
        openai_base_url: "https://api.openai.com/v1".to_string(),
    };

    assert_eq!(
        config.digest_instruction("Casey"),
        "Catch Casey up, please, Casey."
    );
}

#[test]
fn test_default_digest_template_carries_name_placeholder() {
    assert!(DEFAULT_DIGEST_TEMPLATE.contains("{name}"));
}

#[test]
fn test_env_overrides_and_defaults() {
    // Single test for everything that touches the process environment.
    env::remove_var("BIND_ADDR");
    env::remove_var("OPENAI_MODEL");
    env::remove_var("AGENT_MAX_STEPS");
    env::remove_var("REQUEST_TIMEOUT_SECS");
    env::remove_var("DIGEST_PROMPT");

    let config = Config::from_env().unwrap();
    assert_eq!(config.bind_addr, "127.0.0.1:8000");
    assert_eq!(config.model, "gpt-4");
    assert_eq!(config.max_steps, 12);
    assert_eq!(config.max_corrections, 3);
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.digest_template, DEFAULT_DIGEST_TEMPLATE);

    env::set_var("OPENAI_MODEL", "gpt-4o-mini");
    env::set_var("AGENT_MAX_STEPS", "5");
    env::set_var("DIGEST_PROMPT", "Digest for {name}");
    let config = Config::from_env().unwrap();
    assert_eq!(config.model, "gpt-4o-mini");
    assert_eq!(config.max_steps, 5);
    assert_eq!(config.digest_template, "Digest for {name}");

    // Unparseable numeric overrides fall back to the default
    env::set_var("AGENT_MAX_STEPS", "plenty");
    let config = Config::from_env().unwrap();
    assert_eq!(config.max_steps, 12);

    // A bind address that cannot parse as a socket address refuses to load
    env::set_var("BIND_ADDR", "not-an-address");
    match Config::from_env() {
        Err(ConfigError::InvalidValue { name, value }) => {
            assert_eq!(name, "BIND_ADDR");
            assert_eq!(value, "not-an-address");
        }
        other => panic!("Expected InvalidValue, got {:?}", other.map(|_| ())),
    }

    env::remove_var("BIND_ADDR");
    env::remove_var("OPENAI_MODEL");
    env::remove_var("AGENT_MAX_STEPS");
    env::remove_var("DIGEST_PROMPT");
}
