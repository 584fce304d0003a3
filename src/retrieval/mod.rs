//! Hybrid retrieval over transcript chunks.
//!
//! [`DualRetriever`] keeps two independent indexes over the same chunks:
//! a dense embedding index searched by cosine similarity and a BM25 keyword
//! index. Their rankings are merged with weighted reciprocal rank fusion.

mod dense;
mod fusion;
mod sparse;

pub use dense::{cosine_similarity, DenseIndex};
pub use fusion::RankFusion;
pub use sparse::{tokenize, Bm25Index};

use crate::chunking::Chunk;
use crate::config::RetrievalSettings;
use crate::embedding::Embedder;
use crate::error::{Result, VidraError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Anything that can rank chunks for a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` chunks, best first, without duplicates.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Chunk>>;

    /// Number of indexed chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dense + sparse index over one video's chunks.
pub struct DualRetriever {
    chunks: Vec<Chunk>,
    dense: DenseIndex,
    sparse: Bm25Index,
    fusion: RankFusion,
    embedder: Arc<dyn Embedder>,
}

impl DualRetriever {
    /// Embed and index the chunks.
    ///
    /// An empty chunk list builds an empty index without calling the embedder.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn Embedder>,
        settings: &RetrievalSettings,
    ) -> Result<Self> {
        let vectors = if chunks.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder
                .embed_batch(&texts)
                .await
                .map_err(|e| VidraError::IndexBuild(format!("Embedding chunks failed: {}", e)))?;

            if vectors.len() != chunks.len() {
                return Err(VidraError::IndexBuild(format!(
                    "Embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    chunks.len()
                )));
            }
            vectors
        };

        let sparse = Bm25Index::build(
            &chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(),
            settings.bm25_k1,
            settings.bm25_b,
        );

        info!("Built hybrid index over {} chunks", chunks.len());

        Ok(Self {
            chunks,
            dense: DenseIndex::new(vectors),
            sparse,
            fusion: RankFusion::new(
                settings.dense_weight,
                settings.sparse_weight,
                settings.rrf_constant,
            ),
            embedder,
        })
    }
}

#[async_trait]
impl Retriever for DualRetriever {
    #[instrument(skip(self), fields(indexed = self.chunks.len()))]
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Chunk>> {
        if k == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let dense_hits = match self.embedder.embed(text).await {
            Ok(query_vector) => self.dense.search(&query_vector, k),
            Err(e) => {
                warn!(kind = "retrieval_degraded", "Query embedding failed, using keyword ranking only: {}", e);
                Vec::new()
            }
        };
        let sparse_hits = self.sparse.search(text, k);

        let fused = self
            .fusion
            .fuse(&dense_hits, &sparse_hits, |idx| self.chunks[idx].start_seconds());

        let mut seen = HashSet::new();
        let results: Vec<Chunk> = fused
            .into_iter()
            .map(|(idx, _)| &self.chunks[idx])
            .filter(|chunk| seen.insert(chunk.id))
            .take(k)
            .cloned()
            .collect();

        debug!(
            dense = dense_hits.len(),
            sparse = sparse_hits.len(),
            "Retrieved {} chunks",
            results.len()
        );
        Ok(results)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}
