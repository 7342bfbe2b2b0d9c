//! Lazy, idempotent knowledge-base access
//!
//! The service owns an optional retriever handle behind a mutex: the first
//! query (or an explicit initialize) builds it, later calls reuse it, and a
//! forced rebuild replaces it only after the new handle is ready.

use std::sync::{Arc, Mutex};

use crate::ai::EmbeddingWrapper;
use crate::config::Config;
use crate::error::{DocqError, DocqResult};
use crate::kb::loader::load_and_split;
use crate::kb::store::{chunk_id, ChunkRecord, ChunkStore};

/// Returned when a query matches nothing; a sentinel, never an error
pub const NO_RESULTS_SENTINEL: &str =
    "I found no relevant documentation in the knowledge base.";

/// Nearest-chunk lookup by query text, the only capability a ready
/// knowledge base exposes
pub trait Retrieve: Send + Sync {
    fn retrieve(&self, query: &str) -> DocqResult<Vec<ChunkRecord>>;
}

/// Builds a retriever handle from scratch: load, chunk, embed, upsert
pub type RetrieverBuilder = Box<dyn Fn() -> DocqResult<Arc<dyn Retrieve>> + Send + Sync>;

/// A live handle over the persisted similarity index
pub struct Retriever {
    store: ChunkStore,
    embedding: EmbeddingWrapper,
    top_k: usize,
}

impl Retrieve for Retriever {
    fn retrieve(&self, query: &str) -> DocqResult<Vec<ChunkRecord>> {
        let vector = self
            .embedding
            .generate_one(query)
            .map_err(|e| DocqError::Embedding(e.to_string()))?;
        let hits = self
            .store
            .search(&vector, self.top_k)
            .map_err(|e| DocqError::Index(e.to_string()))?;

        let mut records = Vec::with_capacity(hits.len());
        for (id, _distance) in hits {
            if let Some(record) = self
                .store
                .get(id)
                .map_err(|e| DocqError::Index(e.to_string()))?
            {
                records.push(record);
            }
        }
        Ok(records)
    }
}

/// Process-wide knowledge-base service: `ensure_ready`, `query`, `is_ready`
pub struct KnowledgeBase {
    builder: RetrieverBuilder,
    current: Mutex<Option<Arc<dyn Retrieve>>>,
}

impl KnowledgeBase {
    pub fn new(builder: RetrieverBuilder) -> Self {
        Self {
            builder,
            current: Mutex::new(None),
        }
    }

    /// Wire the standard builder: load and chunk documents from the
    /// configured path, embed every chunk, and upsert into the persistent
    /// collection.
    pub fn for_config(config: &Config) -> Self {
        let config = config.clone();
        Self::new(Box::new(move || build_retriever(&config)))
    }

    /// Return the current handle, building it first if absent or forced.
    ///
    /// The mutex is held across the build, so at most one rebuild runs at a
    /// time and readers never observe a half-built handle. If the build
    /// fails, any prior handle stays in place.
    pub fn ensure_ready(&self, force: bool) -> DocqResult<Arc<dyn Retrieve>> {
        let mut current = self.current.lock().unwrap();
        if !force {
            if let Some(handle) = current.as_ref() {
                return Ok(handle.clone());
            }
        }
        tracing::info!(force, "building knowledge-base retriever");
        let handle = (self.builder)()?;
        *current = Some(handle.clone());
        Ok(handle)
    }

    /// Search the knowledge base, initializing it lazily on first use.
    /// Results come back as numbered document blocks; an empty result is
    /// the sentinel text, not an error.
    pub fn query(&self, text: &str) -> DocqResult<String> {
        let handle = self.ensure_ready(false)?;
        tracing::info!(query = text, "searching knowledge base");

        let records = handle.retrieve(text)?;
        if records.is_empty() {
            return Ok(NO_RESULTS_SENTINEL.to_string());
        }

        let blocks: Vec<String> = records
            .iter()
            .enumerate()
            .map(|(i, record)| format!("Document {}:\n{}", i + 1, record.content))
            .collect();
        Ok(blocks.join("\n\n"))
    }

    /// Whether a handle currently exists; never triggers a build
    pub fn is_ready(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }
}

fn build_retriever(config: &Config) -> DocqResult<Arc<dyn Retrieve>> {
    let embedding = EmbeddingWrapper::for_model(&config.embedding_name)
        .map_err(|e| DocqError::Configuration(e.to_string()))?;

    let chunks = load_and_split(
        &config.docs_path,
        &config.docs_glob,
        config.chunk_size,
        config.chunk_overlap,
    )?;

    let store = ChunkStore::open(&config.db_path, &config.collection_name, embedding.dimensions())
        .map_err(|e| DocqError::Index(e.to_string()))?;

    if !chunks.is_empty() {
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let vectors = embedding
            .generate(texts)
            .map_err(|e| DocqError::Embedding(e.to_string()))?;

        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            let record = ChunkRecord {
                id: chunk_id(chunk),
                content: chunk.content.clone(),
                source: chunk.source.to_string_lossy().into_owned(),
            };
            store
                .upsert(&record, vector)
                .map_err(|e| DocqError::Index(e.to_string()))?;
        }
    }

    store.save().map_err(|e| DocqError::Index(e.to_string()))?;
    tracing::info!(chunks = chunks.len(), "knowledge-base retriever ready");

    Ok(Arc::new(Retriever {
        store,
        embedding,
        top_k: config.top_k,
    }))
}
