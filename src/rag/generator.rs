//! Grounded answer generation.

use super::{format_context, Answer, Generation, GenerationFailure};
use crate::chunking::Chunk;
use crate::config::{GenerationSettings, Prompts};
use crate::llm::LanguageModel;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Answers a standalone question from ranked context chunks.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn answer(&self, question: &str, context: &[Chunk]) -> Generation;

    /// Summarize the video from representative chunks.
    async fn summarize(&self, context: &[Chunk]) -> Generation;
}

/// Answer generator backed by a language model.
pub struct LlmAnswerGenerator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    language: String,
    max_sources: usize,
    not_covered_answer: String,
    timeout: Duration,
}

impl LlmAnswerGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, settings: &GenerationSettings) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
            language: settings.language.clone(),
            max_sources: settings.max_sources,
            not_covered_answer: settings.not_covered_answer.clone(),
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    fn render(&self, template: &str, question: &str, context: &[Chunk]) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context(context));
        vars.insert("question".to_string(), question.to_string());
        vars.insert("language".to_string(), self.language.clone());
        self.prompts.render_with_custom(template, &vars)
    }

    async fn call_model(&self, prompt: &str) -> Result<String, GenerationFailure> {
        match tokio::time::timeout(self.timeout, self.model.generate(prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(Ok(_)) => Err(GenerationFailure::Error("model returned an empty answer".to_string())),
            Ok(Err(e)) => Err(GenerationFailure::Error(e.to_string())),
            Err(_) => Err(GenerationFailure::TimedOut {
                seconds: self.timeout.as_secs(),
            }),
        }
    }

    #[instrument(skip(self, template, context), fields(model = self.model.name(), chunks = context.len()))]
    async fn generate_from(&self, template: &str, question: &str, context: &[Chunk]) -> Generation {
        if context.is_empty() {
            debug!("No context retrieved, answering as not covered");
            return Generation::Answered(Answer {
                text: self.not_covered_answer.clone(),
                used_chunks: Vec::new(),
            });
        }

        let prompt = self.render(template, question, context);

        match self.call_model(&prompt).await {
            Ok(text) => {
                let used_chunks: Vec<Chunk> =
                    context.iter().take(self.max_sources).cloned().collect();
                debug!("Answered with {} sources", used_chunks.len());
                Generation::Answered(Answer { text, used_chunks })
            }
            Err(failure) => {
                warn!(kind = "generation_failure", "Answer generation failed: {}", failure);
                Generation::Failed(failure)
            }
        }
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn answer(&self, question: &str, context: &[Chunk]) -> Generation {
        self.generate_from(&self.prompts.qa.answer, question, context).await
    }

    async fn summarize(&self, context: &[Chunk]) -> Generation {
        self.generate_from(&self.prompts.qa.summary, "", context).await
    }
}
