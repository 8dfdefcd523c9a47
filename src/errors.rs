use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::env;
use thiserror::Error;

/// Configuration errors raised while loading server settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Environment error: {0}")]
    EnvError(#[from] env::VarError),
}

/// Errors raised while staging a secret to ephemeral storage.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to write ephemeral secret: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the Gmail connector and its mailbox actions.
#[derive(Debug, Error)]
pub enum GmailApiError {
    #[error("Gmail API error: {0}")]
    ApiError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Errors from the language-model completion provider.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model API error: {0}")]
    Api(String),

    #[error("Model network error: {0}")]
    Network(String),

    #[error("Model response parse error: {0}")]
    Parse(String),
}

/// Errors raised when dispatching an agent-selected action.
///
/// `UnknownTool` and `BadArguments` are recoverable inside the agent loop:
/// they are re-presented to the model as corrective observations. `Failed`
/// aborts the run.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Bad tool arguments: {0}")]
    BadArguments(String),

    #[error("Tool execution failed: {0}")]
    Failed(String),
}

/// Terminal outcomes of an agent run that did not produce an answer.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Step limit of {max_steps} exceeded without a final answer")]
    StepLimitExceeded { max_steps: u32 },

    #[error("Agent parse failure: {0}")]
    Parse(String),

    #[error("Tool failure: {0}")]
    Tool(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Top-level application error, mapped onto the HTTP surface.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Mailbox(#[from] GmailApiError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl AppError {
    /// Stable machine-readable failure kind, returned in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Staging(_) => "staging",
            AppError::Mailbox(GmailApiError::AuthError(_)) => "auth",
            AppError::Mailbox(GmailApiError::CredentialError(_)) => "invalid_credentials",
            AppError::Mailbox(GmailApiError::NetworkError(_)) => "connectivity",
            AppError::Mailbox(GmailApiError::ApiError(_)) => "mailbox_api",
            AppError::Agent(AgentError::StepLimitExceeded { .. }) => "step_limit_exceeded",
            AppError::Agent(AgentError::Parse(_)) => "parse",
            AppError::Agent(AgentError::Tool(_)) => "tool",
            AppError::Agent(AgentError::Model(ModelError::Network(_))) => "model_connectivity",
            AppError::Agent(AgentError::Model(_)) => "model",
        }
    }

    /// HTTP status for this failure.
    ///
    /// Agent loop exhaustion (`parse`, `step_limit_exceeded`) is a bounded
    /// failure result rather than a server fault, so it is surfaced with a
    /// 200 status and a structured error body.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Staging(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Mailbox(GmailApiError::AuthError(_)) => StatusCode::UNAUTHORIZED,
            AppError::Mailbox(GmailApiError::CredentialError(_)) => StatusCode::BAD_REQUEST,
            AppError::Mailbox(_) => StatusCode::BAD_GATEWAY,
            AppError::Agent(AgentError::StepLimitExceeded { .. })
            | AppError::Agent(AgentError::Parse(_)) => StatusCode::OK,
            AppError::Agent(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}
