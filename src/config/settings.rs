//! Configuration settings for Vidra.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub embedding: EmbeddingSettings,
    pub segmenter: SegmenterSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (transcripts).
    pub data_dir: String,
    /// Directory for temporary files (extracted audio).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.vidra".to_string(),
            temp_dir: "/tmp/vidra".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Language hint passed to the transcriber (ISO-639-1), if any.
    pub language: Option<String>,
    /// Translate every segment into this language after transcription.
    pub translate_to: Option<String>,
    /// Duration in seconds for splitting long audio files.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent chunk transcriptions.
    pub max_concurrent_chunks: usize,
    /// Maximum concurrent segment translations.
    pub max_concurrent_translations: usize,
    /// Keep the extracted audio file after transcription.
    pub keep_audio: bool,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            translate_to: None,
            chunk_duration_seconds: 120,
            max_concurrent_chunks: 3,
            max_concurrent_translations: 4,
            keep_audio: false,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Transcript segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterSettings {
    /// Maximum chunk length in characters.
    pub max_chunk_chars: usize,
    /// Trailing characters carried into the next chunk.
    pub overlap_chars: usize,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self {
            max_chunk_chars: 400,
            overlap_chars: 50,
        }
    }
}

/// Hybrid retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks returned per query.
    pub top_k: usize,
    /// Fusion weight of the embedding ranking.
    pub dense_weight: f32,
    /// Fusion weight of the BM25 ranking.
    pub sparse_weight: f32,
    /// Reciprocal rank fusion constant.
    pub rrf_constant: f32,
    /// BM25 term frequency saturation.
    pub bm25_k1: f32,
    /// BM25 length normalization.
    pub bm25_b: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            // Spoken transcripts repeat domain terms verbatim, so lexical matches weigh more.
            dense_weight: 0.4,
            sparse_weight: 0.6,
            rrf_constant: 60.0,
            bm25_k1: 1.5,
            bm25_b: 0.75,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// LLM model for rewriting, answering and summarizing.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
    /// Number of context chunks returned as sources.
    pub max_sources: usize,
    /// Number of recent turns shown to the query rewriter.
    pub max_history_turns: usize,
    /// Natural language answers are written in.
    pub language: String,
    /// Answer shown to the user when generation fails.
    pub fallback_answer: String,
    /// Answer used when retrieval finds nothing.
    pub not_covered_answer: String,
    /// Internal query used to gather context for summaries.
    pub summary_query: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            max_tokens: 1024,
            timeout_seconds: 120,
            max_sources: 2,
            max_history_turns: 10,
            language: "English".to_string(),
            fallback_answer: "Sorry, something went wrong while processing your request."
                .to_string(),
            not_covered_answer: "The video does not mention this.".to_string(),
            summary_query: "main content of the video".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        let seg = &self.segmenter;
        if seg.max_chunk_chars == 0 {
            return Err(crate::error::VidraError::Config(
                "segmenter.max_chunk_chars must be greater than zero".to_string(),
            ));
        }
        if seg.overlap_chars >= seg.max_chunk_chars {
            return Err(crate::error::VidraError::Config(format!(
                "segmenter.overlap_chars ({}) must be smaller than max_chunk_chars ({})",
                seg.overlap_chars, seg.max_chunk_chars
            )));
        }
        let r = &self.retrieval;
        if r.dense_weight < 0.0 || r.sparse_weight < 0.0 || r.dense_weight + r.sparse_weight <= 0.0 {
            return Err(crate::error::VidraError::Config(
                "retrieval weights must be non-negative and not both zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VidraError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidra")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Directory where timestamped transcripts are written.
    pub fn transcripts_dir(&self) -> PathBuf {
        self.data_dir().join("transcripts")
    }

    /// Stored transcript file for a video.
    ///
    /// The id must name a file directly inside the transcripts directory.
    pub fn transcript_path(&self, video_id: &str) -> crate::error::Result<PathBuf> {
        check_video_id(video_id)?;
        Ok(self.transcripts_dir().join(format!("{}.txt", video_id)))
    }
}

/// Rejects ids that are empty, hidden, or could step out of a directory.
fn check_video_id(video_id: &str) -> crate::error::Result<()> {
    let invalid = video_id.trim().is_empty()
        || video_id.starts_with('.')
        || video_id.contains("..")
        || video_id.contains(|c| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        return Err(crate::error::VidraError::InvalidInput(format!(
            "Invalid video id '{}'",
            video_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.segmenter.max_chunk_chars, 400);
        assert_eq!(settings.segmenter.overlap_chars, 50);
        assert!((settings.retrieval.dense_weight - 0.4).abs() < f32::EPSILON);
        assert!((settings.retrieval.sparse_weight - 0.6).abs() < f32::EPSILON);
        assert_eq!(settings.generation.max_sources, 2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_transcript_path_stays_in_transcripts_dir() {
        let settings = Settings::default();
        assert_eq!(
            settings.transcript_path("lecture-01").unwrap(),
            settings.transcripts_dir().join("lecture-01.txt")
        );

        for id in ["../../secret", "a/b", "a\\b", "..", ".hidden", "", "x..y"] {
            let err = settings.transcript_path(id).unwrap_err();
            assert_eq!(err.kind(), "invalid_input", "id {:?}", id);
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [retrieval]
            dense_weight = 0.5
            sparse_weight = 0.5
            "#,
        )
        .unwrap();
        assert!((settings.retrieval.dense_weight - 0.5).abs() < f32::EPSILON);
        assert_eq!(settings.retrieval.top_k, 3);
        assert_eq!(settings.generation.model, "gpt-4o-mini");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut settings = Settings::default();
        settings.segmenter.overlap_chars = 400;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_and_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut settings = Settings::default();
        settings.generation.language = "Chinese".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.generation.language, "Chinese");
    }
}
