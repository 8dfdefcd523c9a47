use crate::errors::{AgentError, ToolError};
use crate::openai::{ChatMessage, CompletionModel};
use crate::tools::ToolDispatch;
use log::{debug, info, warn};

const SYSTEM_PROMPT: &str = "You are an email assistant operating on the user's own mailbox. \
    Use the available tools to search, read, draft, or send mail as needed. When you have enough \
    information, reply with the final answer as plain text and make no further tool calls.";

/// Bounded ReAct loop: the model alternates between selecting an action and
/// observing its result until it emits a final answer.
///
/// States: Thinking -> {ActingOnTool, Answering}; ActingOnTool -> Observing
/// -> Thinking; Answering -> Done. One `run` owns its whole transcript;
/// nothing persists between invocations.
#[derive(Debug, Clone, Copy)]
pub struct AgentRunner {
    max_steps: u32,
    max_corrections: u32,
}

impl AgentRunner {
    pub fn new(max_steps: u32, max_corrections: u32) -> Self {
        AgentRunner {
            max_steps,
            max_corrections,
        }
    }

    /// Execute one instruction. Returns the model's final answer text, or a
    /// terminal failure when the loop cannot complete within its bounds.
    pub async fn run<M, T>(
        &self,
        model: &M,
        tools: &T,
        instruction: &str,
    ) -> Result<String, AgentError>
    where
        M: CompletionModel,
        T: ToolDispatch,
    {
        let mut transcript = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(instruction),
        ];
        let mut corrections = 0u32;
        let mut last_parse_failure = String::new();

        for step in 0..self.max_steps {
            // Thinking: one model turn over the transcript so far.
            let turn = model.complete(&transcript, tools.specs()).await?;

            if turn.tool_calls.is_empty() {
                match turn.content {
                    // Answering -> Done.
                    Some(text) if !text.trim().is_empty() => {
                        info!("Agent answered after {} step(s)", step + 1);
                        return Ok(text);
                    }
                    // Neither an answer nor an action: corrective re-prompt.
                    _ => {
                        warn!("Model turn had no answer and no tool call");
                        last_parse_failure =
                            "turn contained neither an answer nor a tool call".to_string();
                        corrections += 1;
                        if corrections > self.max_corrections {
                            break;
                        }
                        transcript.push(ChatMessage::assistant(None, Vec::new()));
                        transcript.push(ChatMessage::user(
                            "Your last reply contained neither an answer nor a tool call. \
                             Either call one of the available tools or reply with the final \
                             answer.",
                        ));
                        continue;
                    }
                }
            }

            // ActingOnTool: invoke each selected action and feed the
            // observation back.
            transcript.push(ChatMessage::assistant(
                turn.content.clone(),
                turn.tool_calls.clone(),
            ));

            let mut exhausted = false;
            for call in &turn.tool_calls {
                let observation = match serde_json::from_str(&call.function.arguments) {
                    Ok(args) => match tools.invoke(&call.function.name, args).await {
                        Ok(result) => {
                            debug!("Tool '{}' succeeded", call.function.name);
                            result
                        }
                        Err(ToolError::UnknownTool(name)) => {
                            warn!("Model selected unknown tool '{}'", name);
                            last_parse_failure = format!("unknown tool '{}'", name);
                            corrections += 1;
                            let available: Vec<&str> =
                                tools.specs().iter().map(|s| s.name.as_str()).collect();
                            format!(
                                "There is no tool named '{}'. Available tools: {}. \
                                 Choose one of them.",
                                name,
                                available.join(", ")
                            )
                        }
                        Err(ToolError::BadArguments(msg)) => {
                            warn!(
                                "Model sent invalid arguments to '{}': {}",
                                call.function.name, msg
                            );
                            last_parse_failure =
                                format!("bad arguments for '{}': {}", call.function.name, msg);
                            corrections += 1;
                            format!(
                                "The arguments for tool '{}' did not match its schema: {}. \
                                 Call the tool again with corrected arguments.",
                                call.function.name, msg
                            )
                        }
                        Err(ToolError::Failed(msg)) => {
                            return Err(AgentError::Tool(msg));
                        }
                    },
                    Err(e) => {
                        warn!(
                            "Model sent unparseable arguments to '{}': {}",
                            call.function.name, e
                        );
                        last_parse_failure =
                            format!("unparseable arguments for '{}': {}", call.function.name, e);
                        corrections += 1;
                        format!(
                            "The arguments for tool '{}' were not valid JSON: {}. \
                             Call the tool again with corrected arguments.",
                            call.function.name, e
                        )
                    }
                };

                // Observing: every tool call gets a response message, even a
                // corrective one, so the transcript stays well-formed.
                transcript.push(ChatMessage::tool(call.id.clone(), observation));

                if corrections > self.max_corrections {
                    exhausted = true;
                    break;
                }
            }

            if exhausted {
                break;
            }
            // -> Thinking.
        }

        if corrections > self.max_corrections {
            return Err(AgentError::Parse(format!(
                "Model exceeded {} corrective re-prompts; last failure: {}",
                self.max_corrections, last_parse_failure
            )));
        }

        Err(AgentError::StepLimitExceeded {
            max_steps: self.max_steps,
        })
    }
}
