//! OpenAI Whisper transcription implementation.

use super::{Transcriber, Transcript, TranscriptSegment};
use crate::audio::split_audio;
use crate::config::TranscriptionSettings;
use crate::error::{Result, VidraError};
use crate::openai::create_client;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
}

impl WhisperTranscriber {
    /// Create a transcriber from settings.
    pub fn from_settings(settings: &TranscriptionSettings) -> Result<Self> {
        Self::with_config(
            &settings.model,
            settings.chunk_duration_seconds,
            settings.max_concurrent_chunks,
        )
    }

    /// Create a new Whisper transcriber with custom configuration.
    pub fn with_config(
        model: &str,
        chunk_duration_seconds: u32,
        max_concurrent_chunks: usize,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            chunk_duration_seconds,
            max_concurrent_chunks: max_concurrent_chunks.max(1),
        })
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<Vec<TranscriptSegment>> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.wav")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| VidraError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| VidraError::OpenAI(format!("Whisper API error: {}", e)))?;

        let segments = match response.segments {
            Some(segments) => speech_only(
                segments
                    .iter()
                    .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text.trim())),
            ),
            None => speech_only(std::iter::once(TranscriptSegment::new(
                0.0,
                response.duration as f64,
                response.text.trim(),
            ))),
        };

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }

    /// Transcribe an audio file, splitting it first if it is long.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_with_splitting(
        &self,
        audio_path: &Path,
        language: Option<&str>,
        video_id: &str,
    ) -> Result<Transcript> {
        let temp_dir = tempfile::tempdir()?;
        let chunks = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;

        if chunks.len() == 1 {
            let segments = self.transcribe_single(audio_path, language).await?;
            return Ok(Transcript::new(video_id, segments));
        }

        let chunk_count = chunks.len();
        info!("Processing {} audio chunks with {}", chunk_count, self.model);

        let pb = ProgressBar::new(chunk_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Whisper   [{bar:30.cyan/blue}] {pos}/{len}")
                .map_err(|e| VidraError::Transcription(e.to_string()))?
                .progress_chars("█▓░"),
        );

        // Ordered buffering keeps chunk order, so offsets line up without sorting.
        let mut stream = stream::iter(chunks)
            .map(|(chunk_path, time_offset)| {
                let language = language.map(|s| s.to_string());
                async move {
                    let result = self.transcribe_single(&chunk_path, language.as_deref()).await;
                    (time_offset, result)
                }
            })
            .buffered(self.max_concurrent_chunks);

        let mut all_segments = Vec::new();
        while let Some((time_offset, result)) = stream.next().await {
            pb.inc(1);
            let segments = result.map_err(|e| {
                pb.finish_and_clear();
                VidraError::Transcription(format!("Chunk at {:.0}s failed: {}", time_offset, e))
            })?;

            all_segments.extend(shifted(segments, time_offset));
        }

        pb.finish_and_clear();

        Ok(Transcript::new(video_id, all_segments))
    }
}

/// Whisper emits empty segments over silence; they carry nothing to index.
fn speech_only(segments: impl Iterator<Item = TranscriptSegment>) -> Vec<TranscriptSegment> {
    segments.filter(|s| !s.is_blank()).collect()
}

/// Moves chunk-relative segment times onto the timeline of the whole file.
fn shifted(
    segments: Vec<TranscriptSegment>,
    offset: f64,
) -> impl Iterator<Item = TranscriptSegment> {
    segments.into_iter().map(move |mut s| {
        s.start_seconds += offset;
        s.end_seconds += offset;
        s
    })
}

fn video_id_for(audio_path: &Path) -> String {
    audio_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        self.transcribe_with_splitting(audio_path, None, &video_id_for(audio_path))
            .await
    }

    async fn transcribe_with_language(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<Transcript> {
        self.transcribe_with_splitting(audio_path, Some(language), &video_id_for(audio_path))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_from_audio_path() {
        assert_eq!(video_id_for(Path::new("/tmp/vidra/lecture.wav")), "lecture");
    }

    #[test]
    fn test_blank_segments_are_dropped() {
        let segments = speech_only(
            vec![
                TranscriptSegment::new(0.0, 1.0, ""),
                TranscriptSegment::new(1.0, 2.0, "hello"),
                TranscriptSegment::new(2.0, 3.0, "   "),
            ]
            .into_iter(),
        );
        assert_eq!(segments, vec![TranscriptSegment::new(1.0, 2.0, "hello")]);
    }

    #[test]
    fn test_chunk_segments_are_shifted_by_offset() {
        let chunk = vec![TranscriptSegment::new(1.5, 4.0, "second chunk")];
        let moved: Vec<_> = shifted(chunk, 120.0).collect();
        assert_eq!(moved, vec![TranscriptSegment::new(121.5, 124.0, "second chunk")]);
    }

    #[test]
    fn test_concurrency_is_at_least_one() {
        let transcriber = WhisperTranscriber::with_config("whisper-1", 60, 0).unwrap();
        assert_eq!(transcriber.max_concurrent_chunks, 1);
    }
}
