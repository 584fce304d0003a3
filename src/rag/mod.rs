//! Retrieval-augmented question answering over one video transcript.
//!
//! The per-turn flow is: [`QueryRewriter`] turns the latest question into a
//! standalone one, a [`Retriever`](crate::retrieval::Retriever) ranks chunks
//! for it, and an [`AnswerGenerator`] answers from those chunks.

mod generator;
mod rewriter;
mod summary;

pub use generator::{AnswerGenerator, LlmAnswerGenerator};
pub use rewriter::{normalize_rewrite, LlmQueryRewriter, QueryRewriter};
pub use summary::summarize;

use crate::chunking::Chunk;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One completed question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

impl Turn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A grounded answer and the chunks it was drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub used_chunks: Vec<Chunk>,
}

/// Why an answer could not be produced.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationFailure {
    /// The model call returned an error.
    Error(String),
    /// The model did not respond within the configured timeout.
    TimedOut { seconds: u64 },
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationFailure::Error(msg) => write!(f, "{}", msg),
            GenerationFailure::TimedOut { seconds } => {
                write!(f, "model did not respond within {}s", seconds)
            }
        }
    }
}

/// Outcome of one answer attempt. Callers branch on it to pick fallback text.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    Answered(Answer),
    Failed(GenerationFailure),
}

impl Generation {
    pub fn is_answered(&self) -> bool {
        matches!(self, Generation::Answered(_))
    }
}

/// Render context chunks in rank order for a prompt.
pub(crate) fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
