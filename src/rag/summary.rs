//! Whole-video summaries.

use super::{AnswerGenerator, Generation};
use crate::error::{Result, VidraError};
use crate::retrieval::Retriever;
use tracing::{info, instrument};

/// Summarize a video from the chunks most relevant to `query`.
///
/// Does not read or write conversation history.
#[instrument(skip(retriever, generator))]
pub async fn summarize(
    retriever: &dyn Retriever,
    generator: &dyn AnswerGenerator,
    query: &str,
    k: usize,
) -> Result<String> {
    let context = retriever.query(query, k).await?;
    info!("Summarizing from {} chunks", context.len());

    match generator.summarize(&context).await {
        Generation::Answered(answer) => Ok(answer.text),
        Generation::Failed(failure) => Err(VidraError::Generation(failure.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::TranscriptSegmenter;
    use crate::config::{GenerationSettings, RetrievalSettings};
    use crate::rag::LlmAnswerGenerator;
    use crate::retrieval::DualRetriever;
    use crate::testing::{HashEmbedder, ScriptedModel};
    use std::sync::Arc;

    async fn retriever() -> DualRetriever {
        let chunks = TranscriptSegmenter::default().segment(
            "[00:00:00.000] --> [00:00:04.000] the main content of the video is rust ownership",
        );
        DualRetriever::build(chunks, Arc::new(HashEmbedder::new(32)), &RetrievalSettings::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_summarize_returns_model_text() {
        let model = Arc::new(ScriptedModel::new(|_| Ok("This video explains ownership.".to_string())));
        let generator = LlmAnswerGenerator::new(model.clone(), &GenerationSettings::default());

        let summary = summarize(&retriever().await, &generator, "main content of the video", 3)
            .await
            .unwrap();

        assert_eq!(summary, "This video explains ownership.");
        assert!(model.prompts()[0].contains("rust ownership"));
    }

    #[tokio::test]
    async fn test_summarize_failure_is_generation_error() {
        let generator =
            LlmAnswerGenerator::new(Arc::new(ScriptedModel::failing()), &GenerationSettings::default());
        let err = summarize(&retriever().await, &generator, "main content of the video", 3)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "generation_failure");
    }
}
