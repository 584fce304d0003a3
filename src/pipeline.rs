//! Video processing pipeline for Vidra.
//!
//! Coordinates everything from audio extraction to a ready conversation
//! session: extract, transcribe, optionally translate, persist the
//! timestamped transcript, then index it.

use crate::audio::{cleanup, extract_audio};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, VidraError};
use crate::llm::{LanguageModel, OpenAIChatModel};
use crate::session::ConversationSession;
use crate::transcription::{
    render_timestamped, translate_transcript, LlmTranslator, Transcriber, Transcript,
    TranslationReport, Translator, WhisperTranscriber,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main pipeline from video file to conversation session.
pub struct Pipeline {
    settings: Settings,
    prompts: Prompts,
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn Translator>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn LanguageModel>,
}

/// A transcribed (and possibly translated) video.
#[derive(Debug)]
pub struct TranscribedVideo {
    pub transcript: Transcript,
    /// Where the timestamped transcript text was written.
    pub transcript_path: PathBuf,
    /// Present when the transcript was translated.
    pub translation: Option<TranslationReport>,
}

/// A processed video with its ready session.
pub struct ProcessedVideo {
    pub transcribed: TranscribedVideo,
    pub session: ConversationSession,
    pub chunks_indexed: usize,
}

impl Pipeline {
    /// Create a pipeline backed by OpenAI services.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let transcriber: Arc<dyn Transcriber> =
            Arc::new(WhisperTranscriber::from_settings(&settings.transcription)?);
        let model: Arc<dyn LanguageModel> =
            Arc::new(OpenAIChatModel::from_settings(&settings.generation)?);
        let translator: Arc<dyn Translator> =
            Arc::new(LlmTranslator::new(model.clone()).with_prompts(prompts.clone()));
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);

        Ok(Self::with_components(
            settings,
            prompts,
            transcriber,
            translator,
            embedder,
            model,
        ))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            settings,
            prompts,
            transcriber,
            translator,
            embedder,
            model,
        }
    }

    /// Process a video end to end and return a ready session.
    ///
    /// `translate_to` overrides the configured translation target.
    #[instrument(skip(self), fields(video = %video.display()))]
    pub async fn process_video(
        &self,
        video: &Path,
        translate_to: Option<&str>,
    ) -> Result<ProcessedVideo> {
        let transcribed = self.transcribe_video(video, translate_to).await?;

        let session = self.new_session();
        let text = render_timestamped(&transcribed.transcript);
        let chunks_indexed = session.build_index(&text).await?;

        Ok(ProcessedVideo {
            transcribed,
            session,
            chunks_indexed,
        })
    }

    /// Extract, transcribe, translate and persist a video's transcript.
    #[instrument(skip(self), fields(video = %video.display()))]
    pub async fn transcribe_video(
        &self,
        video: &Path,
        translate_to: Option<&str>,
    ) -> Result<TranscribedVideo> {
        let temp_dir = self.settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        eprintln!("  Extracting audio...");
        let audio_path = extract_audio(video, &temp_dir).await?;

        let result = self.transcribe_audio(&audio_path, translate_to).await;

        if !self.settings.transcription.keep_audio {
            cleanup(&[audio_path]);
        }

        result
    }

    /// Transcribe an already extracted audio file and persist the transcript.
    pub async fn transcribe_audio(
        &self,
        audio_path: &Path,
        translate_to: Option<&str>,
    ) -> Result<TranscribedVideo> {
        info!("Transcribing audio...");
        eprintln!("  Transcribing...");
        let transcript = match &self.settings.transcription.language {
            Some(language) => {
                self.transcriber
                    .transcribe_with_language(audio_path, language)
                    .await?
            }
            None => self.transcriber.transcribe(audio_path).await?,
        };
        eprintln!("  Transcription complete ({} segments)", transcript.segments.len());

        if transcript.is_empty() {
            return Err(VidraError::Transcription(
                "No speech was recognized in the audio".to_string(),
            ));
        }

        let target = translate_to
            .map(str::to_string)
            .or_else(|| self.settings.transcription.translate_to.clone());

        let (transcript, translation) = match target {
            Some(target) => {
                eprintln!("  Translating into {}...", target);
                let (translated, report) = translate_transcript(
                    &transcript,
                    self.translator.as_ref(),
                    &target,
                    self.settings.transcription.max_concurrent_translations,
                )
                .await;
                if report.failed > 0 {
                    warn!("{} segments kept their original text", report.failed);
                }
                (translated, Some(report))
            }
            None => (transcript, None),
        };

        let transcript_path = self.save_transcript(&transcript)?;

        Ok(TranscribedVideo {
            transcript,
            transcript_path,
            translation,
        })
    }

    /// A fresh, uninitialized session using this pipeline's services.
    pub fn new_session(&self) -> ConversationSession {
        ConversationSession::with_model(
            self.embedder.clone(),
            self.model.clone(),
            self.prompts.clone(),
            &self.settings,
        )
    }

    /// Open a ready session over a stored transcript.
    pub async fn open_session(&self, video_id: &str) -> Result<ConversationSession> {
        let text = self.load_transcript(video_id)?;
        let session = self.new_session();
        session.build_index(&text).await?;
        Ok(session)
    }

    /// Write the transcript as timestamped text under the transcripts directory.
    fn save_transcript(&self, transcript: &Transcript) -> Result<PathBuf> {
        std::fs::create_dir_all(self.settings.transcripts_dir())?;
        let path = self.settings.transcript_path(&transcript.video_id)?;
        std::fs::write(&path, render_timestamped(transcript))?;
        info!("Saved transcript to {:?}", path);
        Ok(path)
    }

    /// Read a stored timestamped transcript.
    pub fn load_transcript(&self, video_id: &str) -> Result<String> {
        let path = self.settings.transcript_path(video_id)?;
        if !path.exists() {
            return Err(VidraError::InvalidInput(format!(
                "No stored transcript for '{}'. Run `vidra process` first.",
                video_id
            )));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    /// List stored transcripts as (video id, path) pairs, sorted by id.
    pub fn list_transcripts(&self) -> Result<Vec<(String, PathBuf)>> {
        let dir = self.settings.transcripts_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut transcripts: Vec<(String, PathBuf)> = std::fs::read_dir(dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .filter_map(|path| {
                let id = path.file_stem()?.to_str()?.to_string();
                Some((id, path))
            })
            .collect();
        transcripts.sort();
        Ok(transcripts)
    }
}
