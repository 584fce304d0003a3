//! Transcript chunking for retrieval.
//!
//! A timestamped transcript is split into overlapping text chunks that never
//! cut through a timestamp line. Chunks are what the retrieval index stores.

mod segmenter;

pub use segmenter::{TranscriptSegmenter, SEPARATORS};

use crate::transcription::{format_timestamp, timestamps_in};
use serde::{Deserialize, Serialize};

/// Approximate time range a chunk covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

/// Metadata attached to a chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Range between the first and last timestamp tag in the chunk text.
    pub source_span: Option<TimeSpan>,
}

/// A chunk of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the transcript; unique within an index.
    pub id: usize,
    /// Text content, timestamp tags included.
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a chunk, deriving its time span from the timestamp tags in `text`.
    pub fn new(id: usize, text: String) -> Self {
        let stamps = timestamps_in(&text);
        let source_span = match (stamps.first(), stamps.last()) {
            (Some(&first), Some(&last)) => Some(TimeSpan {
                start_seconds: first,
                end_seconds: last.max(first),
            }),
            _ => None,
        };

        Self {
            id,
            text,
            metadata: ChunkMetadata { source_span },
        }
    }

    /// Start of the chunk in seconds, if it carries a timestamp.
    pub fn start_seconds(&self) -> Option<f64> {
        self.metadata.source_span.map(|s| s.start_seconds)
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Format the time span for display, e.g. `01:05 - 01:40`.
    pub fn format_span(&self) -> String {
        match self.metadata.source_span {
            Some(span) => format!(
                "{} - {}",
                format_timestamp(span.start_seconds),
                format_timestamp(span.end_seconds)
            ),
            None => "--:--".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_span_from_tags() {
        let chunk = Chunk::new(
            0,
            "[00:01:05.000] --> [00:01:10.000] first\n[00:01:10.000] --> [00:01:40.000] second"
                .to_string(),
        );
        let span = chunk.metadata.source_span.unwrap();
        assert_eq!(span.start_seconds, 65.0);
        assert_eq!(span.end_seconds, 100.0);
        assert_eq!(chunk.format_span(), "01:05 - 01:40");
    }

    #[test]
    fn test_chunk_without_tags() {
        let chunk = Chunk::new(3, "just words".to_string());
        assert!(chunk.metadata.source_span.is_none());
        assert_eq!(chunk.start_seconds(), None);
        assert_eq!(chunk.format_span(), "--:--");
    }

    #[test]
    fn test_char_len_counts_characters() {
        let chunk = Chunk::new(0, "你好世界".to_string());
        assert_eq!(chunk.char_len(), 4);
    }
}
