use crate::agent::AgentRunner;
use crate::config::{Config, GREETING};
use crate::credentials::{require_field, require_json_field, CredentialBundle};
use crate::errors::AppError;
use crate::gmail::MailboxClient;
use crate::openai::ChatModel;
use crate::staging::{SecretKind, StagedSecret};
use crate::tools::MailboxToolset;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error, info};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Shared, immutable server state. Holds configuration only, never
/// credentials, mailbox clients, or anything else owned by a request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        AppState { config }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(greeting))
        .route("/email-Query", post(email_query))
        .route("/Catch-Me-UP", post(catch_me_up))
        .with_state(state)
}

/// Inbound body for `/email-Query`. Field names match the public API;
/// unknown fields are rejected before any side effect occurs.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryRequest {
    #[serde(rename = "OpenAiKey")]
    open_ai_key: Option<String>,
    #[serde(rename = "googleCreds")]
    google_creds: Option<Value>,
    #[serde(rename = "GoogleToken")]
    google_token: Option<Value>,
    name: Option<String>,
    #[serde(rename = "Query")]
    query: Option<String>,
}

impl QueryRequest {
    fn into_bundle(self) -> Result<CredentialBundle, AppError> {
        Ok(CredentialBundle {
            api_key: require_field("OpenAiKey", self.open_ai_key)?,
            oauth_client_secret: require_json_field("googleCreds", self.google_creds)?,
            oauth_token: require_json_field("GoogleToken", self.google_token)?,
            display_name: require_field("name", self.name)?,
            instruction: require_field("Query", self.query)?,
        })
    }
}

/// Inbound body for `/Catch-Me-UP`: same credentials, no client-supplied
/// instruction: the server provides the digest template.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DigestRequest {
    #[serde(rename = "OpenAiKey")]
    open_ai_key: Option<String>,
    #[serde(rename = "googleCreds")]
    google_creds: Option<Value>,
    #[serde(rename = "GoogleToken")]
    google_token: Option<Value>,
    name: Option<String>,
}

impl DigestRequest {
    fn into_bundle(self, config: &Config) -> Result<CredentialBundle, AppError> {
        let display_name = require_field("name", self.name)?;
        let instruction = config.digest_instruction(&display_name);
        Ok(CredentialBundle {
            api_key: require_field("OpenAiKey", self.open_ai_key)?,
            oauth_client_secret: require_json_field("googleCreds", self.google_creds)?,
            oauth_token: require_json_field("GoogleToken", self.google_token)?,
            display_name,
            instruction,
        })
    }
}

/// Liveness probe. Fixed payload, no side effects.
async fn greeting() -> Json<Value> {
    Json(json!({ "User": GREETING }))
}

async fn email_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    info!("[{}] POST /email-Query", request_id);

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return reject(request_id, rejection),
    };
    let bundle = match request.into_bundle() {
        Ok(bundle) => bundle,
        Err(e) => return fail(request_id, e),
    };

    respond(request_id, run_flow(&state.config, request_id, bundle).await)
}

async fn catch_me_up(
    State(state): State<AppState>,
    payload: Result<Json<DigestRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    info!("[{}] POST /Catch-Me-UP", request_id);

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return reject(request_id, rejection),
    };
    let bundle = match request.into_bundle(&state.config) {
        Ok(bundle) => bundle,
        Err(e) => return fail(request_id, e),
    };

    respond(request_id, run_flow(&state.config, request_id, bundle).await)
}

/// Drive one request through stage -> connect -> run, then wipe the bundle.
///
/// The wipe executes on every exit path of `execute`. If this future is
/// dropped before completing (client disconnect, transport timeout), the
/// bundle's `ZeroizeOnDrop` and the staged handles' `Drop` impls still erase
/// all secret material.
async fn run_flow(
    config: &Config,
    request_id: Uuid,
    mut bundle: CredentialBundle,
) -> Result<String, AppError> {
    let outcome = execute(config, request_id, &bundle).await;
    bundle.wipe();
    debug!("[{}] Credential bundle wiped", request_id);
    outcome
}

async fn execute(
    config: &Config,
    request_id: Uuid,
    bundle: &CredentialBundle,
) -> Result<String, AppError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    // Stage both secrets. Each handle deletes its file on release or drop.
    let token_handle = StagedSecret::stage(SecretKind::Token, bundle.oauth_token.as_bytes())?;
    let client_secret_handle = StagedSecret::stage(
        SecretKind::ClientSecret,
        bundle.oauth_client_secret.as_bytes(),
    )?;
    debug!("[{}] Secrets staged", request_id);

    // Exchange them for a mailbox capability; connect releases both handles
    // whether or not it succeeds.
    let mailbox = MailboxClient::connect(
        &config.oauth_token_url,
        &config.gmail_base_url,
        timeout,
        token_handle,
        client_secret_handle,
    )
    .await?;
    debug!("[{}] Mailbox connected", request_id);

    let toolset = MailboxToolset::new(mailbox);
    let model = ChatModel::new(
        &config.openai_base_url,
        config.model.clone(),
        SecretString::from(bundle.api_key.clone()),
        timeout,
    )
    .map_err(crate::errors::AgentError::from)?;

    let runner = AgentRunner::new(config.max_steps, config.max_corrections);
    let answer = runner.run(&model, &toolset, &bundle.instruction).await?;
    info!("[{}] Agent run completed", request_id);

    Ok(answer)
}

fn respond(request_id: Uuid, outcome: Result<String, AppError>) -> Response {
    match outcome {
        Ok(text) => {
            info!("[{}] Request succeeded", request_id);
            (StatusCode::OK, Json(json!({ "result": text }))).into_response()
        }
        Err(e) => fail(request_id, e),
    }
}

fn fail(request_id: Uuid, error: AppError) -> Response {
    error!("[{}] Request failed ({}): {}", request_id, error.kind(), error);
    error.into_response()
}

fn reject(request_id: Uuid, rejection: JsonRejection) -> Response {
    fail(request_id, AppError::Validation(rejection.body_text()))
}
