use crate::errors::ToolError;
use crate::gmail::MailboxClient;
use serde::Deserialize;
use serde_json::{json, Value};

/// Capability description of one action the agent may invoke: a name, what
/// it does, and a JSON schema for its arguments.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// The seam between the deterministic agent loop and whatever capabilities
/// back it. Stub implementations drive the loop in tests.
#[allow(async_fn_in_trait)]
pub trait ToolDispatch {
    /// The fixed, enumerable action set.
    fn specs(&self) -> &[ToolSpec];

    /// Invoke one action by name with already-parsed JSON arguments.
    async fn invoke(&self, name: &str, args: Value) -> Result<String, ToolError>;
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FetchArgs {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SendArgs {
    to: String,
    subject: String,
    body: String,
}

#[derive(Debug, Deserialize)]
struct DraftArgs {
    to: String,
    subject: String,
    body: String,
}

/// The mailbox action set, dispatching onto one request's [`MailboxClient`].
pub struct MailboxToolset {
    client: MailboxClient,
    specs: Vec<ToolSpec>,
}

impl MailboxToolset {
    pub fn new(client: MailboxClient) -> Self {
        MailboxToolset {
            client,
            specs: mailbox_tool_specs(),
        }
    }
}

impl ToolDispatch for MailboxToolset {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn invoke(&self, name: &str, args: Value) -> Result<String, ToolError> {
        match name {
            "search_messages" => {
                let args: SearchArgs = parse_args(args)?;
                let messages = self
                    .client
                    .search_messages(&args.query, args.max_results.unwrap_or(5))
                    .await
                    .map_err(|e| ToolError::Failed(e.to_string()))?;
                if messages.is_empty() {
                    return Ok("No messages matched the query.".to_string());
                }
                serde_json::to_string_pretty(&messages)
                    .map_err(|e| ToolError::Failed(e.to_string()))
            }
            "fetch_message" => {
                let args: FetchArgs = parse_args(args)?;
                let message = self
                    .client
                    .fetch_message(&args.id)
                    .await
                    .map_err(|e| ToolError::Failed(e.to_string()))?;
                serde_json::to_string_pretty(&message)
                    .map_err(|e| ToolError::Failed(e.to_string()))
            }
            "send_message" => {
                let args: SendArgs = parse_args(args)?;
                let id = self
                    .client
                    .send_message(&args.to, &args.subject, &args.body)
                    .await
                    .map_err(|e| ToolError::Failed(e.to_string()))?;
                Ok(format!("Message sent with id {}", id))
            }
            "create_draft" => {
                let args: DraftArgs = parse_args(args)?;
                let id = self
                    .client
                    .create_draft(&args.to, &args.subject, &args.body)
                    .await
                    .map_err(|e| ToolError::Failed(e.to_string()))?;
                Ok(format!("Draft created with id {}", id))
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::BadArguments(e.to_string()))
}

fn mailbox_tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "search_messages".to_string(),
            description: "Search the user's mailbox with a Gmail query string \
                          (e.g. \"is:unread newer_than:2d\"). Returns matching \
                          messages with headers and snippets."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Gmail search query"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum messages to return (1-10, default 5)"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolSpec {
            name: "fetch_message".to_string(),
            description: "Fetch one message by id, returning its Subject, From, \
                          To, Date headers and snippet."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "Message id from a previous search"
                    }
                },
                "required": ["id"]
            }),
        },
        ToolSpec {
            name: "send_message".to_string(),
            description: "Send a plain-text email from the user's account.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "to": { "type": "string", "description": "Recipient address" },
                    "subject": { "type": "string", "description": "Subject line" },
                    "body": { "type": "string", "description": "Plain-text body" }
                },
                "required": ["to", "subject", "body"]
            }),
        },
        ToolSpec {
            name: "create_draft".to_string(),
            description: "Save a plain-text email as a draft in the user's account \
                          without sending it."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "to": { "type": "string", "description": "Recipient address" },
                    "subject": { "type": "string", "description": "Subject line" },
                    "body": { "type": "string", "description": "Plain-text body" }
                },
                "required": ["to", "subject", "body"]
            }),
        },
    ]
}
