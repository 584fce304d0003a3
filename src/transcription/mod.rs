//! Transcription module for Vidra.
//!
//! Turns extracted audio into timestamped segments with OpenAI Whisper,
//! optionally translates every segment, and converts transcripts to and
//! from the persisted timestamped text format.

mod format;
mod models;
mod translate;
mod whisper;

pub use format::{
    format_transcript, is_timestamped_line, parse_clock, parse_timestamped, render_timestamped,
    single_line, strip_timestamps, timestamp_tag, timestamps_in, OutputFormat, SegmentExport,
    TranscriptExport,
};
pub use models::{format_timestamp, Transcript, TranscriptSegment};
pub use translate::{translate_transcript, LlmTranslator, TranslationReport, Translator};
pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return segments with timestamps.
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;

    /// Transcribe an audio file with a specific language hint.
    async fn transcribe_with_language(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<Transcript>;
}
