//! docq: a conversational agent grounded in a local document knowledge base.
//!
//! This library provides:
//! - A knowledge base built from chunked local documents, persisted with
//!   fjall and searched with usearch over fastembed embeddings
//! - An agent control loop speaking the OpenAI chat-completions format,
//!   executing the tools the model requests
//! - Tools for dates, arithmetic, knowledge-base queries, and a durable
//!   user-profile memory
//! - A CLI conversation driver
//!
//! # Example
//!
//! ```rust,ignore
//! use docq::{Agent, Config};
//!
//! let config = Config::load_from_file("config.json".as_ref())?;
//! let agent = Agent::from_config(&config)?;
//! // feed user turns through agent.run_turn(&mut history)
//! ```

pub mod agent;
pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod kb;
pub mod tools;

// Re-export key types
pub use crate::agent::{Agent, AgentMemory, Message, Role};
pub use crate::ai::{ChatModel, EmbeddingWrapper, LlmClient};
pub use crate::config::Config;
pub use crate::error::{DocqError, DocqResult};
pub use crate::kb::KnowledgeBase;
pub use crate::tools::{Tool, ToolRegistry};
