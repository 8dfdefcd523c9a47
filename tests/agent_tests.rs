/// Agent Runner Tests Module
///
/// Tests for the bounded ReAct loop using scripted stub models and stub
/// toolsets, covering the happy path, step-limit exhaustion, and the
/// corrective re-prompt bound.
use inbox_agent::agent::AgentRunner;
use inbox_agent::errors::{AgentError, ModelError, ToolError};
use inbox_agent::openai::{ChatMessage, CompletionModel, FunctionCall, ModelTurn, ToolCall};
use inbox_agent::tools::{ToolDispatch, ToolSpec};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        call_type: "function".to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

fn acting_turn(call: ToolCall) -> ModelTurn {
    ModelTurn {
        content: None,
        tool_calls: vec![call],
    }
}

fn answering_turn(text: &str) -> ModelTurn {
    ModelTurn {
        content: Some(text.to_string()),
        tool_calls: Vec::new(),
    }
}

/// Model that plays back a fixed script of turns.
struct ScriptedModel {
    turns: Mutex<VecDeque<ModelTurn>>,
    invocations: AtomicU32,
}

impl ScriptedModel {
    fn new(turns: Vec<ModelTurn>) -> Self {
        ScriptedModel {
            turns: Mutex::new(turns.into()),
            invocations: AtomicU32::new(0),
        }
    }

    fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl CompletionModel for ScriptedModel {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<ModelTurn, ModelError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let turn = self.turns.lock().unwrap().pop_front();
        Ok(turn.unwrap_or_else(|| panic!("model invoked past the end of its script")))
    }
}

/// Model that emits the same turn forever (never answers).
struct LoopingModel {
    turn: ModelTurn,
    invocations: AtomicU32,
}

impl LoopingModel {
    fn new(turn: ModelTurn) -> Self {
        LoopingModel {
            turn,
            invocations: AtomicU32::new(0),
        }
    }

    fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl CompletionModel for LoopingModel {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<ModelTurn, ModelError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(self.turn.clone())
    }
}

/// Toolset with one scripted action that records every invocation.
struct StubTools {
    specs: Vec<ToolSpec>,
    observation: String,
    calls: Mutex<Vec<(String, Value)>>,
}

impl StubTools {
    fn new(observation: &str) -> Self {
        StubTools {
            specs: vec![ToolSpec {
                name: "lookup".to_string(),
                description: "Look something up.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } },
                    "required": ["query"]
                }),
            }],
            observation: observation.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn recorded_calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolDispatch for StubTools {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn invoke(&self, name: &str, args: Value) -> Result<String, ToolError> {
        self.calls.lock().unwrap().push((name.to_string(), args));
        if name == "lookup" {
            Ok(self.observation.clone())
        } else {
            Err(ToolError::UnknownTool(name.to_string()))
        }
    }
}

#[tokio::test]
async fn test_scripted_run_returns_exact_final_answer() {
    // Model requests the action, observes its result, then answers.
    let model = ScriptedModel::new(vec![
        acting_turn(tool_call("c1", "lookup", r#"{"query":"unread mail"}"#)),
        answering_turn("You have two unread messages."),
    ]);
    let tools = StubTools::new("2 unread messages found");
    let runner = AgentRunner::new(8, 3);

    let answer = runner.run(&model, &tools, "any unread mail?").await.unwrap();

    assert_eq!(answer, "You have two unread messages.");
    assert_eq!(model.invocations(), 2);
    let calls = tools.recorded_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "lookup");
    assert_eq!(calls[0].1, json!({"query": "unread mail"}));
}

#[tokio::test]
async fn test_step_limit_when_model_never_answers() {
    let model = LoopingModel::new(acting_turn(tool_call(
        "c1",
        "lookup",
        r#"{"query":"again"}"#,
    )));
    let tools = StubTools::new("still looking");
    let runner = AgentRunner::new(4, 3);

    let result = runner.run(&model, &tools, "never finishes").await;

    match result {
        Err(AgentError::StepLimitExceeded { max_steps }) => assert_eq!(max_steps, 4),
        other => panic!("Expected StepLimitExceeded, got {:?}", other),
    }
    // Exactly max_steps model turns, never more
    assert_eq!(model.invocations(), 4);
}

#[tokio::test]
async fn test_unknown_tool_is_corrected_and_run_recovers() {
    let model = ScriptedModel::new(vec![
        acting_turn(tool_call("c1", "read_calendar", r#"{}"#)),
        answering_turn("Done without the calendar."),
    ]);
    let tools = StubTools::new("unused");
    let runner = AgentRunner::new(8, 3);

    let answer = runner.run(&model, &tools, "check things").await.unwrap();

    assert_eq!(answer, "Done without the calendar.");
}

#[tokio::test]
async fn test_persistent_malformed_arguments_fail_with_parse_error() {
    let model = LoopingModel::new(acting_turn(tool_call("c1", "lookup", "definitely not json")));
    let tools = StubTools::new("unused");
    let runner = AgentRunner::new(20, 2);

    let result = runner.run(&model, &tools, "hopeless").await;

    match result {
        Err(AgentError::Parse(msg)) => {
            assert!(msg.contains("corrective"));
        }
        other => panic!("Expected Parse error, got {:?}", other),
    }
    // Bounded corrections, far below the step limit
    assert_eq!(model.invocations(), 3);
}

#[tokio::test]
async fn test_empty_turns_fail_with_parse_error() {
    let model = LoopingModel::new(ModelTurn {
        content: None,
        tool_calls: Vec::new(),
    });
    let tools = StubTools::new("unused");
    let runner = AgentRunner::new(20, 2);

    let result = runner.run(&model, &tools, "silence").await;

    match result {
        Err(AgentError::Parse(_)) => {}
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tool_provider_failure_aborts_run() {
    struct FailingTools {
        specs: Vec<ToolSpec>,
    }

    impl ToolDispatch for FailingTools {
        fn specs(&self) -> &[ToolSpec] {
            &self.specs
        }

        async fn invoke(&self, _name: &str, _args: Value) -> Result<String, ToolError> {
            Err(ToolError::Failed("mailbox unreachable".to_string()))
        }
    }

    let model = LoopingModel::new(acting_turn(tool_call("c1", "lookup", r#"{"query":"x"}"#)));
    let tools = FailingTools {
        specs: StubTools::new("unused").specs,
    };
    let runner = AgentRunner::new(8, 3);

    let result = runner.run(&model, &tools, "doomed").await;

    match result {
        Err(AgentError::Tool(msg)) => assert!(msg.contains("mailbox unreachable")),
        other => panic!("Expected Tool error, got {:?}", other),
    }
    assert_eq!(model.invocations(), 1);
}
