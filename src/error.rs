//! Error types for Vidra.

use thiserror::Error;

/// Library-level error type for Vidra operations.
#[derive(Error, Debug)]
pub enum VidraError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio extraction failed: {0}")]
    Audio(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Session is not ready: {0}")]
    NotReady(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl VidraError {
    /// Short, stable label used as the `kind` field in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            VidraError::Config(_) => "config",
            VidraError::Audio(_) => "audio",
            VidraError::Transcription(_) => "transcription_failure",
            VidraError::Translation(_) => "translation_failure",
            VidraError::Embedding(_) => "embedding_failure",
            VidraError::IndexBuild(_) => "index_build_failure",
            VidraError::NotReady(_) => "not_ready",
            VidraError::Generation(_) => "generation_failure",
            VidraError::Io(_) => "io",
            VidraError::Json(_) => "json",
            VidraError::TomlParse(_) => "toml",
            VidraError::Http(_) => "http",
            VidraError::OpenAI(_) => "openai",
            VidraError::ToolNotFound(_) => "tool_not_found",
            VidraError::InvalidInput(_) => "invalid_input",
        }
    }
}

/// Result type alias for Vidra operations.
pub type Result<T> = std::result::Result<T, VidraError>;
