//! Per-segment transcript translation.
//!
//! A failed segment keeps its original text; translation never aborts the
//! whole transcript.

use super::{single_line, Transcript};
use crate::config::Prompts;
use crate::error::{Result, VidraError};
use crate::llm::LanguageModel;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Trait for text translation services.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language`.
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Translator backed by a language model.
pub struct LlmTranslator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl LlmTranslator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), text.to_string());
        vars.insert("target_language".to_string(), target_language.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.translation.segment, &vars);

        let translated = self
            .model
            .generate(&prompt)
            .await
            .map_err(|e| VidraError::Translation(e.to_string()))?;

        let translated = single_line(&translated);
        if translated.is_empty() {
            return Err(VidraError::Translation("Empty translation".to_string()));
        }
        Ok(translated)
    }
}

/// Outcome counts of a transcript translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationReport {
    pub translated: usize,
    /// Blank segments, passed through without a translation call.
    pub skipped: usize,
    pub failed: usize,
}

enum SegmentOutcome {
    Translated(String),
    Blank,
    Failed,
}

/// Translate every segment of a transcript, keeping timestamps.
///
/// Segments are translated with bounded concurrency and reassembled in
/// their original order.
#[instrument(skip(transcript, translator), fields(segments = transcript.segments.len()))]
pub async fn translate_transcript(
    transcript: &Transcript,
    translator: &dyn Translator,
    target_language: &str,
    max_concurrent: usize,
) -> (Transcript, TranslationReport) {
    let outcomes: Vec<SegmentOutcome> = stream::iter(transcript.segments.iter().enumerate())
        .map(|(idx, segment)| async move {
            if segment.is_blank() {
                return SegmentOutcome::Blank;
            }
            match translator.translate(segment.text.trim(), target_language).await {
                Ok(translated) => SegmentOutcome::Translated(translated),
                Err(e) => {
                    let err = VidraError::Translation(e.to_string());
                    warn!(kind = err.kind(), segment = idx, "Keeping original text: {}", e);
                    SegmentOutcome::Failed
                }
            }
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let mut report = TranslationReport::default();
    let mut outcomes = outcomes.into_iter();
    let translated = transcript.map_text(|segment| match outcomes.next() {
        Some(SegmentOutcome::Translated(text)) => {
            report.translated += 1;
            text
        }
        Some(SegmentOutcome::Blank) => {
            report.skipped += 1;
            segment.text.clone()
        }
        Some(SegmentOutcome::Failed) | None => {
            report.failed += 1;
            segment.text.clone()
        }
    });

    info!(
        "Translated {} segments into {} ({} kept original)",
        report.translated, target_language, report.failed
    );

    (translated, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use crate::transcription::TranscriptSegment;

    struct UppercaseTranslator;

    #[async_trait]
    impl Translator for UppercaseTranslator {
        async fn translate(&self, text: &str, _target: &str) -> Result<String> {
            if text.contains("fail") {
                return Err(VidraError::Translation("service unavailable".to_string()));
            }
            Ok(text.to_uppercase())
        }
    }

    fn transcript() -> Transcript {
        Transcript::new(
            "v".to_string(),
            vec![
                TranscriptSegment::new(0.0, 1.0, "hello".to_string()),
                TranscriptSegment::new(1.0, 2.0, "please fail here".to_string()),
                TranscriptSegment::new(2.0, 3.0, "goodbye".to_string()),
            ],
        )
    }

    #[tokio::test]
    async fn test_failed_segment_keeps_original_text() {
        let (translated, report) =
            translate_transcript(&transcript(), &UppercaseTranslator, "en", 2).await;

        assert_eq!(report, TranslationReport { translated: 2, skipped: 0, failed: 1 });
        let texts: Vec<&str> = translated.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["HELLO", "please fail here", "GOODBYE"]);
        assert_eq!(translated.segments[2].start_seconds, 2.0);
    }

    #[tokio::test]
    async fn test_blank_segments_are_skipped_not_translated() {
        let transcript = Transcript::new(
            "v",
            vec![
                TranscriptSegment::new(0.0, 1.0, "hello"),
                TranscriptSegment::new(1.0, 2.0, "   "),
            ],
        );
        let (translated, report) =
            translate_transcript(&transcript, &UppercaseTranslator, "en", 1).await;

        assert_eq!(report, TranslationReport { translated: 1, skipped: 1, failed: 0 });
        assert_eq!(translated.segments[1].text, "   ");
    }

    #[tokio::test]
    async fn test_multiline_translation_becomes_one_line() {
        let model = Arc::new(ScriptedModel::new(|_| {
            Ok("first line of translation\nsecond line of translation\n".to_string())
        }));
        let translator = LlmTranslator::new(model);
        let out = translator.translate("a long sentence", "French").await.unwrap();
        assert_eq!(out, "first line of translation second line of translation");
    }

    #[tokio::test]
    async fn test_llm_translator_renders_prompt() {
        let model = Arc::new(ScriptedModel::new(|prompt| {
            assert!(prompt.contains("into French"));
            assert!(prompt.contains("good morning"));
            Ok("  bonjour \n".to_string())
        }));
        let translator = LlmTranslator::new(model);
        let out = translator.translate("good morning", "French").await.unwrap();
        assert_eq!(out, "bonjour");
    }

    #[tokio::test]
    async fn test_llm_translator_empty_output_is_error() {
        let model = Arc::new(ScriptedModel::new(|_| Ok("   ".to_string())));
        let translator = LlmTranslator::new(model);
        assert!(translator.translate("x", "French").await.is_err());
    }
}
