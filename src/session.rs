//! Conversational QA session over one video.
//!
//! A session starts uninitialized, becomes ready once a transcript has been
//! indexed, and then answers questions turn by turn. All state sits behind a
//! single async mutex, so calls on one session run one at a time and a
//! question asked during a rebuild waits for the new index.

use crate::chunking::{Chunk, TranscriptSegmenter};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, VidraError};
use crate::llm::{LanguageModel, OpenAIChatModel};
use crate::rag::{
    self, AnswerGenerator, Generation, LlmAnswerGenerator, LlmQueryRewriter, QueryRewriter, Turn,
};
use crate::retrieval::{DualRetriever, Retriever};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Result of one `ask` call.
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    /// The answer shown to the user (the fallback text if generation failed).
    pub answer: String,
    /// The question actually used for retrieval.
    pub standalone_question: String,
    /// Chunks the answer was drawn from.
    pub sources: Vec<Chunk>,
    /// Full history, including this turn.
    pub history: Vec<Turn>,
    /// Whether `answer` is the fallback text.
    pub fallback: bool,
}

#[derive(Default)]
struct SessionState {
    retriever: Option<Arc<dyn Retriever>>,
    history: Vec<Turn>,
}

/// One user's conversation about one video.
pub struct ConversationSession {
    embedder: Arc<dyn Embedder>,
    rewriter: Arc<dyn QueryRewriter>,
    generator: Arc<dyn AnswerGenerator>,
    segmenter: TranscriptSegmenter,
    settings: Settings,
    state: Mutex<SessionState>,
}

impl ConversationSession {
    /// Create an uninitialized session from its collaborators.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        rewriter: Arc<dyn QueryRewriter>,
        generator: Arc<dyn AnswerGenerator>,
        settings: &Settings,
    ) -> Self {
        Self {
            embedder,
            rewriter,
            generator,
            segmenter: TranscriptSegmenter::from_settings(&settings.segmenter),
            settings: settings.clone(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Create a session backed by OpenAI embeddings and chat completions.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let model: Arc<dyn LanguageModel> =
            Arc::new(OpenAIChatModel::from_settings(&settings.generation)?);

        Ok(Self::with_model(embedder, model, prompts, settings))
    }

    /// Create a session whose rewriter and generator share one language model.
    pub fn with_model(
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
        prompts: Prompts,
        settings: &Settings,
    ) -> Self {
        let rewriter = LlmQueryRewriter::new(model.clone())
            .with_prompts(prompts.clone())
            .with_history_window(settings.generation.max_history_turns)
            .with_timeout(Duration::from_secs(settings.generation.timeout_seconds));
        let generator = LlmAnswerGenerator::new(model, &settings.generation).with_prompts(prompts);

        Self::new(embedder, Arc::new(rewriter), Arc::new(generator), settings)
    }

    /// Install a prebuilt retriever, making the session ready.
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.state.get_mut().retriever = Some(retriever);
        self
    }

    /// Segment and index a transcript. Returns the number of chunks.
    ///
    /// History is kept. On failure the session is left uninitialized.
    #[instrument(skip_all, fields(chars = transcript_text.len()))]
    pub async fn build_index(&self, transcript_text: &str) -> Result<usize> {
        let mut state = self.state.lock().await;
        self.rebuild(&mut state, transcript_text).await
    }

    /// Switch to a different video: discard index and history, then index the new transcript.
    #[instrument(skip_all, fields(chars = transcript_text.len()))]
    pub async fn new_video(&self, transcript_text: &str) -> Result<usize> {
        let mut state = self.state.lock().await;
        state.history.clear();
        self.rebuild(&mut state, transcript_text).await
    }

    async fn rebuild(&self, state: &mut SessionState, transcript_text: &str) -> Result<usize> {
        state.retriever = None;

        let chunks = self.segmenter.segment(transcript_text);
        if chunks.is_empty() {
            return Err(VidraError::IndexBuild("Transcript is empty".to_string()));
        }

        let retriever =
            DualRetriever::build(chunks, self.embedder.clone(), &self.settings.retrieval).await?;
        let count = retriever.len();
        state.retriever = Some(Arc::new(retriever));

        info!("Session ready with {} chunks", count);
        Ok(count)
    }

    /// Answer a question in the context of the conversation so far.
    ///
    /// A failed generation still produces an outcome carrying the fallback
    /// answer, and the turn is recorded either way.
    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> Result<AskOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(VidraError::InvalidInput("Question is empty".to_string()));
        }

        let mut state = self.state.lock().await;
        let retriever = state
            .retriever
            .clone()
            .ok_or_else(|| VidraError::NotReady("No video has been indexed yet".to_string()))?;

        let standalone_question = self.rewriter.rewrite(&state.history, question).await;

        let context = match retriever
            .query(&standalone_question, self.settings.retrieval.top_k)
            .await
        {
            Ok(context) => Some(context),
            Err(e) => {
                warn!(kind = e.kind(), "Retrieval failed: {}", e);
                None
            }
        };

        let generation = match context {
            Some(context) => self.generator.answer(&standalone_question, &context).await,
            None => Generation::Failed(rag::GenerationFailure::Error("retrieval failed".to_string())),
        };

        let (answer, sources, fallback) = match generation {
            Generation::Answered(answer) => (answer.text, answer.used_chunks, false),
            Generation::Failed(_) => (self.settings.generation.fallback_answer.clone(), Vec::new(), true),
        };

        state.history.push(Turn::new(question, answer.clone()));

        Ok(AskOutcome {
            answer,
            standalone_question,
            sources,
            history: state.history.clone(),
            fallback,
        })
    }

    /// Summarize the indexed video. Does not touch history.
    #[instrument(skip(self))]
    pub async fn summarize(&self) -> Result<String> {
        let state = self.state.lock().await;
        let retriever = state
            .retriever
            .as_deref()
            .ok_or_else(|| VidraError::NotReady("No video has been indexed yet".to_string()))?;

        rag::summarize(
            retriever,
            self.generator.as_ref(),
            &self.settings.generation.summary_query,
            self.settings.retrieval.top_k,
        )
        .await
    }

    /// Retrieve chunks for a query without generating an answer.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        let state = self.state.lock().await;
        match state.retriever.as_deref() {
            Some(retriever) => retriever.query(query, k).await,
            None => Err(VidraError::NotReady("No video has been indexed yet".to_string())),
        }
    }

    pub async fn history(&self) -> Vec<Turn> {
        self.state.lock().await.history.clone()
    }

    /// Forget the conversation but keep the index.
    pub async fn clear_history(&self) {
        self.state.lock().await.history.clear();
    }

    pub async fn is_ready(&self) -> bool {
        self.state.lock().await.retriever.is_some()
    }

    pub async fn chunk_count(&self) -> usize {
        self.state
            .lock()
            .await
            .retriever
            .as_ref()
            .map_or(0, |r| r.len())
    }
}
