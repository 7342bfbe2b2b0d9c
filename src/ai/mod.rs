#[cfg(feature = "embedding")]
mod embedding;
pub mod llm;

pub use llm::{AssistantReply, ChatModel, LlmClient};

#[cfg(feature = "embedding")]
pub use embedding::EmbeddingWrapper;

#[cfg(not(feature = "embedding"))]
pub struct EmbeddingWrapper;

#[cfg(not(feature = "embedding"))]
impl EmbeddingWrapper {
    pub fn for_model(_name: &str) -> anyhow::Result<Self> {
        Ok(Self)
    }
    pub fn generate(&self, _texts: Vec<&str>) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("embedding feature is disabled")
    }
    pub fn generate_one(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("embedding feature is disabled")
    }
    pub fn dimensions(&self) -> usize {
        0
    }
}

#[cfg(not(feature = "embedding"))]
impl Clone for EmbeddingWrapper {
    fn clone(&self) -> Self {
        Self
    }
}
