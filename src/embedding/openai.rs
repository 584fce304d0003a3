//! OpenAI embeddings.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{Result, VidraError};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Maximum number of inputs per embeddings request.
const MAX_BATCH: usize = 100;

/// Embeds chunk texts and queries with the OpenAI embeddings endpoint.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        if !settings.provider.eq_ignore_ascii_case("openai") {
            return Err(VidraError::Config(format!(
                "Unsupported embedding provider '{}'",
                settings.provider
            )));
        }
        Self::with_config(&settings.model, settings.dimensions as usize)
    }

    pub fn with_config(model: &str, dimensions: usize) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            dimensions,
        })
    }

    async fn embed_request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(inputs.to_vec()))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| VidraError::Embedding(format!("Failed to build request: {}", e)))?;

        let mut data = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| VidraError::Embedding(format!("Embedding API error: {}", e)))?
            .data;

        // The API may return items out of order.
        data.sort_by_key(|e| e.index);
        let vectors: Vec<Vec<f32>> = data.into_iter().map(|e| e.embedding).collect();
        check_shape(&vectors, inputs.len(), self.dimensions)?;
        Ok(vectors)
    }
}

/// One vector per input, each of the configured width.
fn check_shape(vectors: &[Vec<f32>], expected: usize, dimensions: usize) -> Result<()> {
    if vectors.len() != expected {
        return Err(VidraError::Embedding(format!(
            "Expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(VidraError::Embedding(format!(
            "Expected {} dimensions, got {}",
            dimensions,
            bad.len()
        )));
    }
    Ok(())
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            vectors.extend(self.embed_request(batch).await?);
        }
        debug!("Embedded {} texts with {}", vectors.len(), self.model);
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
