//! CLI module for Vidra.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{format_duration, Output};

use clap::{Parser, Subcommand};

/// Vidra - Ask questions about a video
///
/// Transcribes a video, indexes what was said, and answers questions about it
/// with timestamp citations.
#[derive(Parser, Debug)]
#[command(name = "vidra")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Transcribe a video, store its transcript, and summarize it
    Process {
        /// Path to a local video file
        video: String,

        /// Translate every transcript segment into this language
        #[arg(short, long)]
        translate_to: Option<String>,

        /// Skip the summary after indexing
        #[arg(long)]
        no_summary: bool,
    },

    /// Summarize a processed video
    Summarize {
        /// Video ID (the video's file name without extension)
        video_id: String,
    },

    /// Ask a single question about a processed video
    Ask {
        /// Video ID
        video_id: String,

        /// The question to ask
        question: String,
    },

    /// Start an interactive conversation about a processed video
    Chat {
        /// Video ID
        video_id: String,
    },

    /// Show the transcript chunks retrieved for a query
    Search {
        /// Video ID
        video_id: String,

        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Export a stored transcript
    Export {
        /// Video ID to export
        video_id: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (text, json, srt, vtt)
        #[arg(long, default_value = "srt")]
        format: String,
    },

    /// Start HTTP API server holding many conversation sessions
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "retrieval.top_k")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_with_translation() {
        let cli = Cli::try_parse_from(["vidra", "-vv", "process", "talk.mp4", "-t", "French"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Process { video, translate_to, no_summary } => {
                assert_eq!(video, "talk.mp4");
                assert_eq!(translate_to.as_deref(), Some("French"));
                assert!(!no_summary);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_defaults() {
        let cli = Cli::try_parse_from(["vidra", "search", "talk", "tides"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { limit: 5, .. }));
    }
}
