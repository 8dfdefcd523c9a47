use crate::errors::GmailApiError;
use crate::staging::StagedSecret;
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

type Result<T> = std::result::Result<T, GmailApiError>;

/// Projection of one Gmail message: the headers the agent actually needs
/// plus the snippet.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EmailMessage {
    pub id: String,
    pub thread_id: String,
    pub subject: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub snippet: Option<String>,
}

// Wire shapes, Gmail REST API v1.

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    #[allow(dead_code)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
    #[serde(rename = "threadId", default)]
    thread_id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: MessagePayload,
}

#[derive(Debug, Deserialize, Default)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
}

#[derive(Debug, Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DraftResponse {
    id: String,
}

// Credential material shapes. Google emits the token as an authorized-user
// file and the client secret either bare or wrapped in "installed"/"web".

#[derive(Debug, Deserialize)]
struct AuthorizedUserFile {
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    #[serde(default)]
    installed: Option<OAuthClient>,
    #[serde(default)]
    web: Option<OAuthClient>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthClient {
    client_id: String,
    client_secret: String,
}

/// Capability object bound to one authorized mailbox.
///
/// Owned solely by the request that created it; exposes a fixed action set
/// (search, fetch, send) and nothing else. Never cached or shared.
pub struct MailboxClient {
    http: Client,
    gmail_base_url: String,
    access_token: String,
}

impl MailboxClient {
    /// Exchange two staged secrets for an authorized mailbox client.
    ///
    /// Both handles are consumed and released before this function returns,
    /// success or failure: the staged material is single-use for this
    /// exchange only.
    pub async fn connect(
        oauth_token_url: &str,
        gmail_base_url: &str,
        timeout: Duration,
        mut token_handle: StagedSecret,
        mut client_secret_handle: StagedSecret,
    ) -> Result<Self> {
        let result =
            Self::exchange(oauth_token_url, gmail_base_url, timeout, &token_handle, &client_secret_handle)
                .await;

        // Release both handles regardless of the exchange outcome. A failed
        // deletion is logged but never masks the exchange result.
        if let Err(e) = token_handle.release() {
            warn!("Failed to release staged token: {}", e);
        }
        if let Err(e) = client_secret_handle.release() {
            warn!("Failed to release staged client secret: {}", e);
        }

        result
    }

    async fn exchange(
        oauth_token_url: &str,
        gmail_base_url: &str,
        timeout: Duration,
        token_handle: &StagedSecret,
        client_secret_handle: &StagedSecret,
    ) -> Result<Self> {
        let (refresh_token, client_id, client_secret) =
            read_credential_material(token_handle, client_secret_handle)?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GmailApiError::NetworkError(e.to_string()))?;

        debug!("Requesting access token from {}", oauth_token_url);
        if log::log_enabled!(log::Level::Debug) {
            debug!("Using client_id: {} (truncated)", truncate_id(&client_id));
        }

        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = http
            .post(oauth_token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GmailApiError::NetworkError(e.to_string()))?;

        let status = response.status();
        debug!("Token response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no response body>".to_string());
            error!(
                "Token exchange rejected. Status: {}, Error: {}",
                status, error_text
            );
            return Err(GmailApiError::AuthError(format!(
                "Provider rejected credentials. Status: {}, Error: {}",
                status, error_text
            )));
        }

        let token_data: TokenResponse = response.json().await.map_err(|e| {
            GmailApiError::ApiError(format!("Failed to parse token response: {}", e))
        })?;

        debug!("Access token granted");

        Ok(MailboxClient {
            http,
            gmail_base_url: gmail_base_url.to_string(),
            access_token: token_data.access_token,
        })
    }

    /// Search messages with a Gmail query string, newest first.
    ///
    /// The list call only returns ids, so each hit is fetched for its
    /// headers. `max_results` is capped to keep one agent action bounded.
    pub async fn search_messages(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<EmailMessage>> {
        let max = max_results.clamp(1, 10);
        debug!("Searching messages: max_results={}", max);

        let url = format!("{}/users/me/messages", self.gmail_base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query.to_string()),
                ("maxResults", max.to_string()),
            ])
            .send()
            .await
            .map_err(|e| GmailApiError::NetworkError(e.to_string()))?;

        let list: MessageListResponse = Self::parse_response(response).await?;
        debug!("Found {} message references", list.messages.len());

        let mut messages = Vec::with_capacity(list.messages.len());
        for msg_ref in &list.messages {
            messages.push(self.fetch_message(&msg_ref.id).await?);
        }
        Ok(messages)
    }

    /// Fetch one message's headers and snippet.
    pub async fn fetch_message(&self, message_id: &str) -> Result<EmailMessage> {
        debug!("Fetching message {}", message_id);

        let url = format!("{}/users/me/messages/{}", self.gmail_base_url, message_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("format", "metadata"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "To"),
                ("metadataHeaders", "Date"),
            ])
            .send()
            .await
            .map_err(|e| GmailApiError::NetworkError(e.to_string()))?;

        let message: MessageResponse = Self::parse_response(response).await?;
        Ok(project_message(message))
    }

    /// Send a plain-text message from the authorized account.
    pub async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<String> {
        debug!("Sending message");

        let raw = encode_rfc822(to, subject, body);
        let url = format!("{}/users/me/messages/send", self.gmail_base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| GmailApiError::NetworkError(e.to_string()))?;

        let sent: SendResponse = Self::parse_response(response).await?;
        debug!("Message sent with id {}", sent.id);
        Ok(sent.id)
    }

    /// Create a plain-text draft in the authorized account without sending.
    pub async fn create_draft(&self, to: &str, subject: &str, body: &str) -> Result<String> {
        debug!("Creating draft");

        let raw = encode_rfc822(to, subject, body);
        let url = format!("{}/users/me/drafts", self.gmail_base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "message": { "raw": raw } }))
            .send()
            .await
            .map_err(|e| GmailApiError::NetworkError(e.to_string()))?;

        let draft: DraftResponse = Self::parse_response(response).await?;
        debug!("Draft created with id {}", draft.id);
        Ok(draft.id)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let text = response.text().await.unwrap_or_default();
            return Err(GmailApiError::AuthError(format!(
                "Gmail rejected the access token. Status: {}, Error: {}",
                status, text
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GmailApiError::ApiError(format!(
                "Gmail API request failed. Status: {}, Error: {}",
                status, text
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| GmailApiError::ApiError(format!("Failed to parse Gmail response: {}", e)))
    }
}

// Minimal RFC 2822 message, URL-safe base64 as the Gmail API expects.
fn encode_rfc822(to: &str, subject: &str, body: &str) -> String {
    let rfc822 = format!(
        "To: {to}\r\nSubject: {subject}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{body}"
    );
    base64::encode_config(rfc822.as_bytes(), base64::URL_SAFE)
}

fn project_message(message: MessageResponse) -> EmailMessage {
    let mut subject = None;
    let mut from = None;
    let mut to = None;
    let mut date = None;

    for header in &message.payload.headers {
        match header.name.as_str() {
            "Subject" => subject = Some(header.value.clone()),
            "From" => from = Some(header.value.clone()),
            "To" => to = Some(header.value.clone()),
            "Date" => date = Some(header.value.clone()),
            _ => {}
        }
    }

    let snippet = if message.snippet.is_empty() {
        None
    } else {
        Some(message.snippet)
    };

    EmailMessage {
        id: message.id,
        thread_id: message.thread_id,
        subject,
        from,
        to,
        date,
        snippet,
    }
}

/// Read and parse both staged credential files.
///
/// The refresh token must come from the token file; the client id/secret pair
/// comes from the client-secret file (unwrapping "installed"/"web"), falling
/// back to the token file's own fields when absent.
fn read_credential_material(
    token_handle: &StagedSecret,
    client_secret_handle: &StagedSecret,
) -> Result<(String, String, String)> {
    let token_path = token_handle.path().ok_or_else(|| {
        GmailApiError::CredentialError("Token handle was already released".to_string())
    })?;
    let secret_path = client_secret_handle.path().ok_or_else(|| {
        GmailApiError::CredentialError("Client secret handle was already released".to_string())
    })?;

    let token_text = fs::read_to_string(token_path)
        .map_err(|e| GmailApiError::CredentialError(format!("Cannot read staged token: {}", e)))?;
    let secret_text = fs::read_to_string(secret_path).map_err(|e| {
        GmailApiError::CredentialError(format!("Cannot read staged client secret: {}", e))
    })?;

    let token: AuthorizedUserFile = serde_json::from_str(&token_text)
        .map_err(|e| GmailApiError::CredentialError(format!("Malformed token JSON: {}", e)))?;
    let secrets: ClientSecretFile = serde_json::from_str(&secret_text).map_err(|e| {
        GmailApiError::CredentialError(format!("Malformed client secret JSON: {}", e))
    })?;

    let refresh_token = token.refresh_token.filter(|t| !t.is_empty()).ok_or_else(|| {
        GmailApiError::CredentialError("Token material has no refresh_token".to_string())
    })?;

    let (client_id, client_secret) = match (secrets.installed, secrets.web) {
        (Some(client), _) | (None, Some(client)) => (client.client_id, client.client_secret),
        (None, None) => {
            let id = secrets.client_id.or(token.client_id);
            let secret = secrets.client_secret.or(token.client_secret);
            match (id, secret) {
                (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => (id, secret),
                _ => {
                    return Err(GmailApiError::CredentialError(
                        "Credential material has no client_id/client_secret pair".to_string(),
                    ))
                }
            }
        }
    };

    Ok((refresh_token, client_id, client_secret))
}

// Never log full identifiers or tokens. Identifiers are client-supplied and
// may contain multi-byte characters, so truncate by char, not by byte.
fn truncate_id(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "<short-id>".to_string()
    }
}
