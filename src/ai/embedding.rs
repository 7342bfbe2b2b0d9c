use anyhow::{anyhow, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;

/// Embedding models the agent can be configured with, by name
const SUPPORTED_MODELS: &[(&str, EmbeddingModel, usize)] = &[
    ("all-minilm-l6-v2", EmbeddingModel::AllMiniLML6V2, 384),
    ("bge-small-en-v1.5", EmbeddingModel::BGESmallENV15, 384),
    ("bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15, 768),
    ("nomic-embed-text-v1.5", EmbeddingModel::NomicEmbedTextV15, 768),
];

/// A wrapper around fastembed TextEmbedding for generating text embeddings
pub struct EmbeddingWrapper {
    model: Arc<TextEmbedding>,
    dimensions: usize,
}

impl EmbeddingWrapper {
    /// Create a new EmbeddingWrapper for the model with the given configured name
    pub fn for_model(name: &str) -> Result<Self> {
        let (_, model, dimensions) = SUPPORTED_MODELS
            .iter()
            .find(|(candidate, _, _)| candidate.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                anyhow!(
                    "Unknown embedding model '{}'; supported models: {}",
                    name,
                    SUPPORTED_MODELS
                        .iter()
                        .map(|(n, _, _)| *n)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })?;

        let model = TextEmbedding::try_new(InitOptions::new(model.clone()))
            .map_err(|e| anyhow!("Failed to create TextEmbedding for '{}': {}", name, e))?;

        Ok(Self {
            model: Arc::new(model),
            dimensions: *dimensions,
        })
    }

    /// Generate embeddings for a list of texts
    pub fn generate(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        self.model
            .embed(texts, None)
            .map_err(|e| anyhow!("Failed to generate embeddings: {}", e))
    }

    /// Generate an embedding for a single text
    pub fn generate_one(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self
            .model
            .embed(vec![text], None)
            .map_err(|e| anyhow!("Failed to generate embedding: {}", e))?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Embedding model returned no vector"))
    }

    /// Vector dimensionality of the selected model
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl Clone for EmbeddingWrapper {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            dimensions: self.dimensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_name_lists_supported() {
        let err = EmbeddingWrapper::for_model("no-such-model").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("no-such-model"));
        assert!(message.contains("all-minilm-l6-v2"));
    }
}
