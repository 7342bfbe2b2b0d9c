//! Agent control loop
//!
//! A state machine alternating between asking the model and executing the
//! tools it requested, until the model returns a plain answer.

use std::sync::Arc;

use anyhow::Result;

use crate::agent::types::{Message, Role, ToolCallRequest};
use crate::ai::ChatModel;
use crate::tools::ToolRegistry;

/// Control-loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Submit history to the model and wait for its reply
    AwaitModel,
    /// Execute the tool calls of the latest assistant message
    ExecuteTools,
    /// Terminal: the history ends with a plain assistant answer
    Done,
}

/// Where the loop goes after appending `last` to the history.
/// Only an assistant message ends a round; tool calls route back through
/// the tool executor.
pub fn next_state(last: &Message) -> LoopState {
    match last.role {
        Role::Assistant if last.has_tool_calls() => LoopState::ExecuteTools,
        Role::Assistant => LoopState::Done,
        _ => LoopState::AwaitModel,
    }
}

/// Runs one turn of the conversation against a model and a tool registry
pub struct AgentRunner {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    system_prompt: String,
    /// Cap on tool-call rounds per turn, so a model that never stops
    /// requesting tools cannot spin the loop forever
    max_tool_rounds: usize,
}

impl AgentRunner {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        system_prompt: impl Into<String>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            model,
            tools,
            system_prompt: system_prompt.into(),
            max_tool_rounds: max_tool_rounds.max(1),
        }
    }

    /// Run one full turn: history in, extended history out. The returned
    /// history always ends with a plain assistant message.
    pub async fn run(&self, mut history: Vec<Message>) -> Result<Vec<Message>> {
        let catalog = self.tools.catalog();
        let mut rounds = 0usize;
        let mut state = LoopState::AwaitModel;

        loop {
            match state {
                LoopState::AwaitModel => {
                    let mut request = Vec::with_capacity(history.len() + 1);
                    request.push(Message::system(self.system_prompt.clone()));
                    request.extend(history.iter().cloned());

                    let reply = self.model.chat(&request, &catalog).await?;
                    let message = Message::assistant(reply.content, reply.tool_calls);
                    state = next_state(&message);
                    history.push(message);
                }
                LoopState::ExecuteTools => {
                    rounds += 1;
                    if rounds > self.max_tool_rounds {
                        tracing::warn!(rounds, "tool-call round limit reached, ending turn");
                        history.push(Message::assistant(
                            Some(
                                "I reached the limit of tool calls for this turn without \
                                 arriving at an answer. Please try rephrasing your request."
                                    .to_string(),
                            ),
                            None,
                        ));
                        state = LoopState::Done;
                        continue;
                    }

                    let requests: Vec<ToolCallRequest> = history
                        .last()
                        .and_then(|message| message.tool_calls.clone())
                        .unwrap_or_default();
                    for request in &requests {
                        let output = self.execute(request);
                        history.push(Message::tool_result(
                            request.id.clone(),
                            request.function.name.clone(),
                            output,
                        ));
                    }
                    state = LoopState::AwaitModel;
                }
                LoopState::Done => return Ok(history),
            }
        }
    }

    /// Execute one tool call. Never fails: every problem becomes the text
    /// of the tool result so the model can react to it.
    fn execute(&self, request: &ToolCallRequest) -> String {
        let name = &request.function.name;
        tracing::info!(tool = %name, "dispatching tool call");

        let Some(tool) = self.tools.get(name) else {
            return format!("Error: unknown tool '{}'.", name);
        };

        let raw = request.function.arguments.trim();
        let args: serde_json::Value = if raw.is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(raw) {
                Ok(value) => value,
                Err(e) => return format!("Error: tool arguments are not valid JSON: {}", e),
            }
        };

        match tool.invoke(args) {
            Ok(output) => output,
            Err(message) => {
                tracing::warn!(tool = %name, error = %message, "tool call failed");
                format!("Error: {}", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AssistantReply;
    use crate::tools::CalculatorTool;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed script of replies, recording what it was sent
    struct ScriptedModel {
        replies: Mutex<VecDeque<AssistantReply>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<AssistantReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn chat(
            &self,
            messages: &[Message],
            _tools: &[serde_json::Value],
        ) -> Result<AssistantReply> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("scripted model ran out of replies"))
        }
    }

    fn answer(text: &str) -> AssistantReply {
        AssistantReply {
            content: Some(text.to_string()),
            tool_calls: None,
        }
    }

    fn tool_request(id: &str, name: &str, arguments: &str) -> AssistantReply {
        AssistantReply {
            content: None,
            tool_calls: Some(vec![ToolCallRequest::new(id, name, arguments)]),
        }
    }

    fn calculator_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CalculatorTool));
        registry
    }

    #[test]
    fn test_next_state_transitions() {
        let plain = Message::assistant(Some("done".to_string()), None);
        assert_eq!(next_state(&plain), LoopState::Done);

        let with_calls = Message::assistant(
            None,
            Some(vec![ToolCallRequest::new("c1", "calculator", "{}")]),
        );
        assert_eq!(next_state(&with_calls), LoopState::ExecuteTools);

        assert_eq!(next_state(&Message::user("hi")), LoopState::AwaitModel);
        assert_eq!(
            next_state(&Message::tool_result("c1", "calculator", "4")),
            LoopState::AwaitModel
        );
    }

    #[tokio::test]
    async fn test_arithmetic_turn_goes_through_tools() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_request("call_1", "calculator", r#"{"expression": "2+2"}"#),
            answer("2+2 equals 4."),
        ]));
        let runner = AgentRunner::new(model.clone(), calculator_registry(), "You are a test agent.", 25);

        let history = runner.run(vec![Message::user("What's 2+2?")]).await.unwrap();

        // user, assistant(tool call), tool result, assistant answer
        assert_eq!(history.len(), 4);
        assert_eq!(history[1].role, Role::Assistant);
        assert!(history[1].has_tool_calls());
        assert_eq!(history[2].role, Role::Tool);
        assert_eq!(history[2].text(), "4");
        assert_eq!(history[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(history[3].role, Role::Assistant);
        assert!(history[3].text().contains('4'));

        // The model saw the tool result on the second round, prefixed by
        // the system prompt
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0][0].role, Role::System);
        assert!(seen[1].iter().any(|m| m.role == Role::Tool));
    }

    #[tokio::test]
    async fn test_failing_tool_still_terminates() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_request("call_1", "calculator", r#"{"expression": "1/0"}"#),
            answer("That division is undefined."),
        ]));
        let runner = AgentRunner::new(model, calculator_registry(), "system", 25);

        let history = runner.run(vec![Message::user("1/0?")]).await.unwrap();

        assert_eq!(history[2].role, Role::Tool);
        assert!(history[2].text().starts_with("Error:"));
        let last = history.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(!last.text().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_result() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_request("call_1", "no_such_tool", "{}"),
            answer("Sorry, I cannot do that."),
        ]));
        let runner = AgentRunner::new(model, calculator_registry(), "system", 25);

        let history = runner.run(vec![Message::user("do it")]).await.unwrap();
        assert!(history[2].text().contains("unknown tool"));
        assert_eq!(history.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_malformed_arguments_become_error_result() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_request("call_1", "calculator", "{not json"),
            answer("Let me try again."),
        ]));
        let runner = AgentRunner::new(model, calculator_registry(), "system", 25);

        let history = runner.run(vec![Message::user("calc")]).await.unwrap();
        assert!(history[2].text().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_multiple_calls_execute_in_request_order() {
        let model = Arc::new(ScriptedModel::new(vec![
            AssistantReply {
                content: None,
                tool_calls: Some(vec![
                    ToolCallRequest::new("call_1", "calculator", r#"{"expression": "1+1"}"#),
                    ToolCallRequest::new("call_2", "calculator", r#"{"expression": "3*3"}"#),
                ]),
            },
            answer("2 and 9."),
        ]));
        let runner = AgentRunner::new(model, calculator_registry(), "system", 25);

        let history = runner.run(vec![Message::user("both")]).await.unwrap();
        assert_eq!(history[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(history[2].text(), "2");
        assert_eq!(history[3].tool_call_id.as_deref(), Some("call_2"));
        assert_eq!(history[3].text(), "9");
    }

    #[tokio::test]
    async fn test_round_cap_ends_the_turn() {
        // A model that always wants another tool call
        struct LoopingModel;

        #[async_trait]
        impl ChatModel for LoopingModel {
            async fn chat(
                &self,
                _messages: &[Message],
                _tools: &[serde_json::Value],
            ) -> Result<AssistantReply> {
                Ok(tool_request("call_n", "calculator", r#"{"expression": "1"}"#))
            }
        }

        let runner = AgentRunner::new(Arc::new(LoopingModel), calculator_registry(), "system", 3);
        let history = runner.run(vec![Message::user("loop")]).await.unwrap();

        let last = history.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.text().contains("limit"));
    }
}
