//! Language model abstraction.
//!
//! Every prompt-driven step (query rewriting, answering, summarizing,
//! translation) goes through [`LanguageModel`], so tests can swap in a
//! scripted model.

mod openai;

pub use openai::OpenAIChatModel;

use crate::error::Result;
use async_trait::async_trait;

/// A text-in, text-out language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logs.
    fn name(&self) -> &str;
}
