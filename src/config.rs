use crate::errors::ConfigError;
use dotenv::dotenv;
use log::debug;
use std::env;
use std::net::SocketAddr;

// API URL constants
pub const GMAIL_API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";
pub const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Fixed greeting returned by the liveness endpoint.
pub const GREETING: &str = "Res user 1";

/// Default instruction template for the digest endpoint. `{name}` is
/// replaced with the requester's display name.
pub const DEFAULT_DIGEST_TEMPLATE: &str = "Can you catch me up on my emails, {name}? \
    Summarize anything important from the last two days and call out messages that \
    still need a reply. If nothing needs attention, say so.";

/// Server configuration, loaded once at startup.
///
/// Every field has a default; environment variables override them. Per-request
/// credentials never appear here: the only secrets this process handles arrive
/// in request bodies and are wiped before the handler returns.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub model: String,
    pub max_steps: u32,
    pub max_corrections: u32,
    pub request_timeout_secs: u64,
    pub digest_template: String,
    pub gmail_base_url: String,
    pub oauth_token_url: String,
    pub openai_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file if present
        if let Ok(path) = env::var("DOTENV_PATH") {
            let _ = dotenv::from_path(path);
        } else {
            let _ = dotenv();
        }

        debug!("Loading server configuration from environment");

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                name: "BIND_ADDR".to_string(),
                value: bind_addr.clone(),
            })?;

        let config = Config {
            bind_addr,
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_steps: env_u32("AGENT_MAX_STEPS", 12),
            max_corrections: env_u32("AGENT_MAX_CORRECTIONS", 3),
            request_timeout_secs: env_u64("REQUEST_TIMEOUT_SECS", 30),
            digest_template: env::var("DIGEST_PROMPT")
                .unwrap_or_else(|_| DEFAULT_DIGEST_TEMPLATE.to_string()),
            gmail_base_url: env::var("GMAIL_API_URL")
                .unwrap_or_else(|_| GMAIL_API_BASE_URL.to_string()),
            oauth_token_url: env::var("OAUTH_TOKEN_URL")
                .unwrap_or_else(|_| OAUTH_TOKEN_URL.to_string()),
            openai_base_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| OPENAI_API_BASE_URL.to_string()),
        };

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Render the digest instruction for one request.
    pub fn digest_instruction(&self, name: &str) -> String {
        self.digest_template.replace("{name}", name)
    }
}

// Numeric overrides fall back to the default on parse failure rather than
// refusing to start.
fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}
