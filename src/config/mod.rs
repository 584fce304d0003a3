//! Configuration module for Vidra.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QaPrompts, TranslationPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, GenerationSettings, PromptSettings, RetrievalSettings,
    SegmenterSettings, Settings, TranscriptionSettings,
};
