//! Knowledge base: document loading, persistent chunk storage, and the
//! lazy retrieval service the agent's tools talk to.

pub mod loader;
pub mod service;
pub mod store;

pub use loader::{load_and_split, split_text, DocumentChunk};
pub use service::{KnowledgeBase, Retrieve, Retriever, RetrieverBuilder, NO_RESULTS_SENTINEL};
pub use store::{chunk_id, ChunkRecord, ChunkStore};
