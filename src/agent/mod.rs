//! High-level agent API
//!
//! This module combines the pieces a conversational agent needs:
//! - **types**: message and tool-call wire shapes
//! - **memory**: the durable user-profile record and its merge semantics
//! - **runner**: the control loop alternating between model and tools
//!
//! [`Agent`] is the entry point wiring a chat model, the tool registry and
//! the system prompt together for the conversation driver.

pub mod memory;
pub mod runner;
pub mod types;

pub use memory::{update_memory, AgentMemory, MemoryUpdate};
pub use runner::{next_state, AgentRunner, LoopState};
pub use types::{FunctionCall, Message, Role, ToolCallRequest};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::ai::{ChatModel, LlmClient};
use crate::config::Config;
use crate::error::{DocqError, DocqResult};
use crate::kb::KnowledgeBase;
use crate::tools::{
    kb_tools, memory_tools, CalculatorTool, CurrentDateTool, CurrentTimeTool, ToolRegistry,
};

/// Instruction steering the model toward the knowledge base and memory tools
pub const SYSTEM_PROMPT: &str = "\
You are an intelligent assistant with access to an internal knowledge base \
built from local documentation, as well as persistent memory tools.

Guidelines:
1. Read the user's question carefully to determine what they are asking for.
2. Use the knowledge-base tools to retrieve documentation relevant to the question.
3. Use the memory tools to recall or record information about the user when it helps.
4. Do not invent information: if nothing relevant is found, say that the knowledge base \
does not contain an answer.";

/// A conversational agent: chat model + tool registry + system prompt
pub struct Agent {
    runner: AgentRunner,
}

impl Agent {
    /// Build an agent from explicit parts (tests use this with a scripted model)
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        system_prompt: impl Into<String>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            runner: AgentRunner::new(model, tools, system_prompt, max_tool_rounds),
        }
    }

    /// Build the production agent: LLM client, knowledge-base service, and
    /// the full tool set from the configuration.
    pub fn from_config(config: &Config) -> DocqResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok();
        let model = LlmClient::new(
            config.inference_url.clone(),
            config.model.clone(),
            api_key,
            Duration::from_secs(config.request_timeout_secs),
            config.max_retries,
        )
        .map_err(|e| DocqError::Configuration(e.to_string()))?;

        let kb = Arc::new(KnowledgeBase::for_config(config));
        let tools = build_registry(kb, config.memory_path.clone());

        Ok(Self::new(
            Arc::new(model),
            tools,
            SYSTEM_PROMPT,
            config.max_tool_rounds,
        ))
    }

    /// Run one conversation turn. The control loop may go through several
    /// tool rounds internally, but only the visible outcome is retained:
    /// the caller's history (which already ends with the user message)
    /// gains exactly one plain assistant reply. Tool-call and tool-result
    /// messages never leak into cross-turn history, where truncation could
    /// strand a tool result without its originating call. On failure the
    /// history is left untouched.
    pub async fn run_turn(&self, history: &mut Vec<Message>) -> Result<String> {
        let turn = self.runner.run(history.clone()).await?;
        let reply = turn
            .last()
            .map(|message| message.text().to_string())
            .unwrap_or_default();
        history.push(Message::assistant(Some(reply.clone()), None));
        Ok(reply)
    }
}

/// The full tool set: date/time, arithmetic, knowledge base, memory
pub fn build_registry(kb: Arc<KnowledgeBase>, memory_path: std::path::PathBuf) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CurrentDateTool));
    registry.register(Arc::new(CurrentTimeTool));
    registry.register(Arc::new(CalculatorTool));
    for tool in kb_tools(kb) {
        registry.register(tool);
    }
    for tool in memory_tools(memory_path) {
        registry.register(tool);
    }
    registry
}
