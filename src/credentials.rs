use crate::errors::AppError;
use serde_json::Value;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Everything secret (or secret-adjacent) a single request carries.
///
/// A bundle is built from a validated request body, lives on the handler's
/// stack for exactly one request, and is never stored anywhere shared. Its
/// fields are overwritten in place by [`CredentialBundle::wipe`] before the
/// handler returns; `ZeroizeOnDrop` covers abnormal exits where the future is
/// dropped mid-flight.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CredentialBundle {
    /// OpenAI API key, verbatim from the request.
    pub api_key: String,
    /// Opaque Google OAuth token material, as JSON text.
    pub oauth_token: String,
    /// Opaque Google OAuth client-secret material, as JSON text.
    pub oauth_client_secret: String,
    /// Requester display name.
    pub display_name: String,
    /// The single instruction to run through the agent.
    pub instruction: String,
}

impl CredentialBundle {
    /// Overwrite every field in place.
    ///
    /// The source of this service cleared fields and then re-assigned a fixed
    /// sentinel string; only the always-wipe contract is kept here.
    pub fn wipe(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("api_key", &"<redacted>")
            .field("oauth_token", &"<redacted>")
            .field("oauth_client_secret", &"<redacted>")
            .field("display_name", &"<redacted>")
            .field("instruction", &"<redacted>")
            .finish()
    }
}

/// Validate a required string field: present and non-empty.
pub fn require_field(name: &str, value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!(
            "Missing or empty required field: {}",
            name
        ))),
    }
}

/// Validate a required opaque-JSON field and normalize it to JSON text.
///
/// Clients may send the credential material either as a JSON object or as a
/// string already containing JSON; both are accepted, empty values are not.
pub fn require_json_field(name: &str, value: Option<Value>) -> Result<String, AppError> {
    let invalid = || AppError::Validation(format!("Missing or empty required field: {}", name));

    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::Object(map)) if !map.is_empty() => Ok(Value::Object(map).to_string()),
        Some(Value::Null) | Some(Value::String(_)) | Some(Value::Object(_)) | None => {
            Err(invalid())
        }
        // Arrays, numbers and booleans are not credential material.
        Some(_) => Err(invalid()),
    }
}
