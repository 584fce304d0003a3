//! Turning follow-up questions into standalone ones.

use super::Turn;
use crate::config::Prompts;
use crate::llm::LanguageModel;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Rewrites a question so it can be understood without the conversation.
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    /// Never fails: on any problem the original question is returned.
    async fn rewrite(&self, history: &[Turn], question: &str) -> String;
}

/// Query rewriter backed by a language model.
pub struct LlmQueryRewriter {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    max_history_turns: usize,
    timeout: Duration,
}

impl LlmQueryRewriter {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
            max_history_turns: 10,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Only the most recent `turns` turns are shown to the model.
    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.max_history_turns = turns;
        self
    }

    /// Give up on the model after `timeout` and keep the original question.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn render_history(&self, history: &[Turn]) -> String {
        let start = history.len().saturating_sub(self.max_history_turns);
        history[start..]
            .iter()
            .map(|turn| format!("User: {}\nAssistant: {}", turn.question, turn.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl QueryRewriter for LlmQueryRewriter {
    #[instrument(skip(self, history), fields(turns = history.len()))]
    async fn rewrite(&self, history: &[Turn], question: &str) -> String {
        if history.is_empty() || self.max_history_turns == 0 {
            return question.to_string();
        }

        let mut vars = HashMap::new();
        vars.insert("history".to_string(), self.render_history(history));
        vars.insert("question".to_string(), question.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.qa.rewrite, &vars);

        let output = match tokio::time::timeout(self.timeout, self.model.generate(&prompt)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    kind = "rewrite_failure",
                    "Question rewrite timed out after {}s",
                    self.timeout.as_secs()
                );
                return question.to_string();
            }
        };

        match output {
            Ok(output) => match normalize_rewrite(&output) {
                Some(standalone) => {
                    debug!("Rewrote question to: {}", standalone);
                    standalone
                }
                None => {
                    warn!(kind = "rewrite_failure", "Model returned an empty rewrite");
                    question.to_string()
                }
            },
            Err(e) => {
                warn!(kind = "rewrite_failure", "Question rewrite failed: {}", e);
                question.to_string()
            }
        }
    }
}

/// Reduce model output to one question line.
///
/// Takes the first non-empty line, drops a leading "Standalone question:"
/// label and surrounding quotes. Returns `None` when nothing is left.
pub fn normalize_rewrite(output: &str) -> Option<String> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;

    let line = match line.get(..20) {
        Some(prefix) if prefix.eq_ignore_ascii_case("standalone question:") => line[20..].trim(),
        _ => line,
    };

    let line = line
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '「' | '」'))
        .trim();

    (!line.is_empty()).then(|| line.to_string())
}
