//! Vidra - Ask questions about a video
//!
//! Vidra turns a video into a conversation partner: it extracts the audio,
//! transcribes it with timestamps, indexes the transcript for hybrid search,
//! and answers questions grounded in what was actually said.
//!
//! # Overview
//!
//! Vidra allows you to:
//! - Transcribe local video files, optionally translating every segment
//! - Summarize a video with timestamped key points
//! - Ask follow-up questions in a multi-turn conversation
//! - Serve many conversations over HTTP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `audio` - Audio extraction with ffmpeg
//! - `transcription` - Speech-to-text, translation and transcript formats
//! - `chunking` - Transcript segmentation
//! - `embedding` - Embedding generation
//! - `llm` - Language model access
//! - `retrieval` - Dense + keyword hybrid retrieval
//! - `rag` - Query rewriting, answering and summaries
//! - `session` - Conversation sessions
//! - `pipeline` - Video to session coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use vidra::config::Settings;
//! use vidra::pipeline::Pipeline;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     let processed = pipeline.process_video(Path::new("talk.mp4"), None).await?;
//!     println!("{}", processed.session.summarize().await?);
//!
//!     let outcome = processed.session.ask("What is the main argument?").await?;
//!     println!("{}", outcome.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod retrieval;
pub mod session;
pub mod transcription;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, VidraError};
pub use session::{AskOutcome, ConversationSession};
