//! Persistent chunk store
//!
//! Chunk records live in a fjall partition; their embeddings live in a
//! usearch index saved alongside it. Both persist under
//! `db_path/collection_name` and survive process restart.

use std::path::Path;
#[cfg(feature = "vector")]
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::kb::loader::DocumentChunk;

#[cfg(feature = "vector")]
const VECTOR_INDEX_FILE: &str = "vectors.idx";
#[cfg(feature = "vector")]
const MIN_INDEX_CAPACITY: usize = 1024;

/// A chunk as persisted: id, text, and where it came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkRecord {
    pub id: u64,
    pub content: String,
    pub source: String,
}

/// Stable identity of a chunk for upsert purposes: the source path, or a
/// hash of the content when no path is known.
///
/// Two chunks cut from the same file share an id, so the later upsert
/// overwrites the earlier one (last chunk per file wins).
pub fn chunk_id(chunk: &DocumentChunk) -> u64 {
    let key = chunk.source.to_string_lossy();
    if key.is_empty() {
        hash64(chunk.content.as_bytes())
    } else {
        hash64(key.as_bytes())
    }
}

fn hash64(bytes: &[u8]) -> u64 {
    let digest = Sha256::digest(bytes);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(prefix)
}

/// Persistent storage for chunk records and their vectors
pub struct ChunkStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
    #[cfg(feature = "vector")]
    index: usearch::Index,
    #[cfg(feature = "vector")]
    index_path: PathBuf,
    dimensions: usize,
}

impl ChunkStore {
    /// Open (or create) the collection under `db_path/collection_name`
    pub fn open(db_path: &Path, collection_name: &str, dimensions: usize) -> Result<Self> {
        let dir = db_path.join(collection_name);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create collection directory '{}'", dir.display()))?;

        let keyspace = fjall::Config::new(&dir)
            .open()
            .context("Failed to open fjall keyspace")?;
        let partition = keyspace
            .open_partition("chunks", PartitionCreateOptions::default())
            .context("Failed to open chunks partition")?;

        #[cfg(feature = "vector")]
        let index_path = dir.join(VECTOR_INDEX_FILE);

        #[cfg(feature = "vector")]
        let index = {
            let options = usearch::IndexOptions {
                dimensions,
                metric: usearch::MetricKind::Cos,
                quantization: usearch::ScalarKind::F32,
                ..Default::default()
            };
            let index = usearch::new_index(&options)
                .map_err(|e| anyhow!("Failed to create vector index: {}", e))?;
            if index_path.exists() {
                if let Err(e) = index.load(&index_path.to_string_lossy()) {
                    tracing::warn!(
                        path = %index_path.display(),
                        "failed to load vector index, starting empty: {}", e
                    );
                }
            }
            if index.capacity() < MIN_INDEX_CAPACITY {
                index
                    .reserve(MIN_INDEX_CAPACITY)
                    .map_err(|e| anyhow!("Failed to reserve vector index: {}", e))?;
            }
            index
        };

        tracing::info!(collection = collection_name, dimensions, "opened chunk store");

        Ok(Self {
            keyspace,
            partition,
            #[cfg(feature = "vector")]
            index,
            #[cfg(feature = "vector")]
            index_path,
            dimensions,
        })
    }

    /// Insert or replace a chunk record and its embedding.
    ///
    /// Idempotent per id: re-running with the same chunk set never creates
    /// duplicates; an existing id has its record and vector replaced.
    pub fn upsert(&self, record: &ChunkRecord, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(anyhow!(
                "embedding has {} dimensions, index expects {}",
                embedding.len(),
                self.dimensions
            ));
        }

        let key = record_key(record.id);
        let value = serde_json::to_vec(record).context("Failed to serialize chunk record")?;
        self.partition
            .insert(key.as_bytes(), value)
            .context("Failed to store chunk record")?;

        #[cfg(feature = "vector")]
        {
            if self.index.contains(record.id) {
                self.index
                    .remove(record.id)
                    .map_err(|e| anyhow!("Failed to replace vector {}: {}", record.id, e))?;
            }
            if self.index.capacity() <= self.index.size() {
                self.index
                    .reserve(self.index.capacity() * 2)
                    .map_err(|e| anyhow!("Failed to grow vector index: {}", e))?;
            }
            self.index
                .add(record.id, embedding)
                .map_err(|e| anyhow!("Failed to index vector {}: {}", record.id, e))?;
        }

        Ok(())
    }

    /// Nearest-neighbor lookup; returns (id, distance) pairs, closest first
    pub fn search(&self, vector: &[f32], k: usize) -> Result<Vec<(u64, f32)>> {
        #[cfg(feature = "vector")]
        {
            let matches = self
                .index
                .search(vector, k)
                .map_err(|e| anyhow!("Vector search failed: {}", e))?;
            Ok(matches
                .keys
                .into_iter()
                .zip(matches.distances)
                .collect())
        }
        #[cfg(not(feature = "vector"))]
        {
            let _ = (vector, k);
            anyhow::bail!("vector feature is disabled")
        }
    }

    /// Fetch a chunk record by id
    pub fn get(&self, id: u64) -> Result<Option<ChunkRecord>> {
        let key = record_key(id);
        match self
            .partition
            .get(key.as_bytes())
            .context("Failed to read chunk record")?
        {
            Some(data) => {
                let record = serde_json::from_slice(&data)
                    .context("Failed to deserialize chunk record")?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Number of stored chunk records
    pub fn chunk_count(&self) -> usize {
        self.partition.iter().count()
    }

    /// Flush records and save the vector index to disk
    pub fn save(&self) -> Result<()> {
        #[cfg(feature = "vector")]
        self.index
            .save(&self.index_path.to_string_lossy())
            .map_err(|e| anyhow!("Failed to save vector index: {}", e))?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist chunk store")?;
        Ok(())
    }
}

fn record_key(id: u64) -> String {
    // Zero-padded for lexicographic ordering
    format!("chunk:{:016x}", id)
}

#[cfg(all(test, feature = "vector"))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: u64, content: &str, source: &str) -> ChunkRecord {
        ChunkRecord {
            id,
            content: content.to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_upsert_and_search_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::open(dir.path(), "docs", 4).unwrap();

        store
            .upsert(&record(1, "alpha", "a.md"), &[1.0, 0.0, 0.0, 0.0])
            .unwrap();
        store
            .upsert(&record(2, "beta", "b.md"), &[0.0, 1.0, 0.0, 0.0])
            .unwrap();

        let hits = store.search(&[1.0, 0.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 1);

        let fetched = store.get(1).unwrap().unwrap();
        assert_eq!(fetched.content, "alpha");
    }

    #[test]
    fn test_upsert_is_idempotent_per_id() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::open(dir.path(), "docs", 4).unwrap();

        store
            .upsert(&record(7, "first version", "doc.md"), &[0.5, 0.5, 0.0, 0.0])
            .unwrap();
        store
            .upsert(&record(7, "second version", "doc.md"), &[0.0, 0.0, 0.5, 0.5])
            .unwrap();

        assert_eq!(store.chunk_count(), 1);
        // Last write wins
        assert_eq!(store.get(7).unwrap().unwrap().content, "second version");

        let hits = store.search(&[0.0, 0.0, 0.5, 0.5], 5).unwrap();
        let ids: Vec<u64> = hits.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![7]);
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::open(dir.path(), "docs", 4).unwrap();
        let err = store
            .upsert(&record(1, "x", "x.md"), &[1.0, 0.0])
            .unwrap_err();
        assert!(err.to_string().contains("dimensions"));
    }

    #[test]
    fn test_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = ChunkStore::open(dir.path(), "docs", 4).unwrap();
            store
                .upsert(&record(3, "persisted", "p.md"), &[0.0, 0.0, 1.0, 0.0])
                .unwrap();
            store.save().unwrap();
        }
        {
            let store = ChunkStore::open(dir.path(), "docs", 4).unwrap();
            assert_eq!(store.get(3).unwrap().unwrap().content, "persisted");
            let hits = store.search(&[0.0, 0.0, 1.0, 0.0], 1).unwrap();
            assert_eq!(hits[0].0, 3);
        }
    }

    #[test]
    fn test_chunk_id_keyed_by_source_path() {
        use crate::kb::loader::DocumentChunk;
        use std::path::PathBuf;

        let first = DocumentChunk {
            content: "one".to_string(),
            source: PathBuf::from("docs/guide.md"),
            ordinal: 0,
        };
        let second = DocumentChunk {
            content: "two".to_string(),
            source: PathBuf::from("docs/guide.md"),
            ordinal: 1,
        };
        // Same source path, same id: last chunk per file wins
        assert_eq!(chunk_id(&first), chunk_id(&second));

        let pathless = DocumentChunk {
            content: "one".to_string(),
            source: PathBuf::new(),
            ordinal: 0,
        };
        assert_ne!(chunk_id(&pathless), 0);
    }
}
