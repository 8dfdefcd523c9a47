/// Inbox Agent HTTP Service
///
/// This crate exposes a small HTTP service that answers natural-language
/// questions about a Gmail inbox. Each request carries its own OpenAI API key
/// and Google OAuth material; the server stages those secrets just long
/// enough to authorize one mailbox, runs a single instruction through a
/// tool-using agent, and erases everything before responding.
///
/// # Endpoints
///
/// - `GET /` - liveness greeting
/// - `POST /email-Query` - run a client-supplied instruction against the inbox
/// - `POST /Catch-Me-UP` - run the server's digest instruction
///
/// # Modules
///
/// - [`staging`] - short-lived secret files with guaranteed cleanup
/// - [`credentials`] - the per-request credential bundle and its wipe contract
/// - [`gmail`] - staged-secret exchange and the fixed mailbox action set
/// - [`tools`] - capability-described action registry
/// - [`openai`] - chat-completions provider behind a pluggable trait
/// - [`agent`] - the bounded ReAct loop
/// - [`server`] - request validation, orchestration, and error mapping
pub mod agent;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod gmail;
pub mod logging;
pub mod openai;
pub mod server;
pub mod staging;
pub mod tools;

pub use crate::config::Config;
pub use crate::errors::AppError;
pub use crate::logging::setup_logging;
pub use crate::server::{router, AppState};
