//! Text embeddings for the dense half of retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::{Result, VidraError};
use async_trait::async_trait;

/// Maps texts to fixed-width vectors whose cosine similarity tracks meaning.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed many texts in one go; output order matches input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| VidraError::Embedding("Empty embedding response".to_string()))
    }

    fn dimensions(&self) -> usize;
}
