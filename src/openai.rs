use crate::errors::ModelError;
use crate::tools::ToolSpec;
use log::{debug, error};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

type Result<T> = std::result::Result<T, ModelError>;

/// One entry in the agent transcript, shaped for the chat-completions wire
/// format.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system",
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user",
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        ChatMessage {
            role: "assistant",
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Observation fed back for one tool call.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage {
            role: "tool",
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// An action selection emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments; parsed (and possibly corrected) by the agent
    /// loop, not here.
    pub arguments: String,
}

/// What the model produced for one step: a final answer, action selections,
/// or (malformed) neither.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// The pluggable completion-provider seam. The agent loop only ever sees
/// this trait, so tests drive it with scripted stubs.
#[allow(async_fn_in_trait)]
pub trait CompletionModel {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ModelTurn>;
}

// Response wire shapes.

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

/// Chat-completions client over one request's ephemeral API key.
///
/// Constructed per request and dropped with it; the key is held in a
/// [`SecretString`] so it is overwritten when the handle goes away.
pub struct ChatModel {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl ChatModel {
    pub fn new(
        base_url: &str,
        model: String,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::Network(e.to_string()))?;

        Ok(ChatModel {
            http,
            base_url: base_url.to_string(),
            model,
            api_key,
        })
    }
}

impl CompletionModel for ChatModel {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ModelTurn> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if !tools.is_empty() {
            let defs: Vec<Value> = tools
                .iter()
                .map(|spec| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": spec.name,
                            "description": spec.description,
                            "parameters": spec.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(defs);
        }

        debug!(
            "Requesting completion: model={}, transcript_len={}",
            self.model,
            messages.len()
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Completion request failed. Status: {}", status);
            return Err(ModelError::Api(format!(
                "Completion request failed. Status: {}, Error: {}",
                status, text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Parse(format!("Malformed completion response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Parse("Completion response has no choices".to_string()))?;

        Ok(ModelTurn {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls,
        })
    }
}
