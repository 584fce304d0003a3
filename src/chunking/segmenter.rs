//! Recursive separator-based transcript segmenter.

use super::Chunk;
use crate::config::SegmenterSettings;
use crate::transcription::is_timestamped_line;
use std::collections::VecDeque;
use tracing::debug;

/// Separators tried from coarsest to finest: paragraph, line, word.
pub const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Splits timestamped transcript text into overlapping chunks.
///
/// Pieces are measured in characters. A timestamp-tagged line is never split;
/// if it alone exceeds `max_chunk_chars` it becomes a chunk of its own.
#[derive(Debug, Clone)]
pub struct TranscriptSegmenter {
    max_chunk_chars: usize,
    overlap_chars: usize,
}

impl TranscriptSegmenter {
    pub fn new(max_chunk_chars: usize, overlap_chars: usize) -> Self {
        let max_chunk_chars = max_chunk_chars.max(1);
        Self {
            max_chunk_chars,
            overlap_chars: overlap_chars.min(max_chunk_chars - 1),
        }
    }

    pub fn from_settings(settings: &SegmenterSettings) -> Self {
        Self::new(settings.max_chunk_chars, settings.overlap_chars)
    }

    /// Segment transcript text into ordered chunks. Empty input gives no chunks.
    pub fn segment(&self, transcript_text: &str) -> Vec<Chunk> {
        let text = transcript_text.replace("\r\n", "\n");
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chunks: Vec<Chunk> = self
            .split_text(&text, &SEPARATORS)
            .into_iter()
            .enumerate()
            .map(|(id, text)| Chunk::new(id, text))
            .collect();

        debug!(
            "Segmented {} characters into {} chunks",
            text.chars().count(),
            chunks.len()
        );
        chunks
    }

    fn split_text(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if char_len(trimmed) <= self.max_chunk_chars || is_atomic(trimmed) {
            return vec![trimmed.to_string()];
        }

        // Coarsest separator that actually occurs; the finest one otherwise.
        let position = separators
            .iter()
            .position(|sep| trimmed.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let Some(separator) = separators.get(position).copied() else {
            return vec![trimmed.to_string()];
        };
        let finer = &separators[position + 1..];

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in trimmed.split(separator).filter(|p| !p.trim().is_empty()) {
            if char_len(piece) <= self.max_chunk_chars {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge_pieces(&pending, separator));
                pending.clear();
            }

            if finer.is_empty() || is_atomic(piece) {
                chunks.push(piece.trim().to_string());
            } else {
                chunks.extend(self.split_text(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge_pieces(&pending, separator));
        }

        chunks
    }

    /// Greedily join pieces up to the size limit, carrying trailing pieces
    /// worth at most `overlap_chars` into the next chunk.
    fn merge_pieces(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joining = if current.is_empty() { 0 } else { sep_len };

            if total + len + joining > self.max_chunk_chars && !current.is_empty() {
                if let Some(chunk) = join(&current, separator) {
                    chunks.push(chunk);
                }

                while let Some(first) = current.front() {
                    let joining = if current.is_empty() { 0 } else { sep_len };
                    let over_overlap = total > self.overlap_chars;
                    let no_room = total + len + joining > self.max_chunk_chars;
                    if !(over_overlap || no_room) {
                        break;
                    }
                    total -= char_len(first) + if current.len() > 1 { sep_len } else { 0 };
                    current.pop_front();
                }
            }

            current.push_back(piece);
            total += len + if current.len() > 1 { sep_len } else { 0 };
        }

        if let Some(chunk) = join(&current, separator) {
            chunks.push(chunk);
        }

        chunks
    }
}

impl Default for TranscriptSegmenter {
    fn default() -> Self {
        Self::from_settings(&SegmenterSettings::default())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// A single timestamp-tagged line must stay whole.
fn is_atomic(piece: &str) -> bool {
    let piece = piece.trim();
    !piece.contains('\n') && is_timestamped_line(piece)
}

fn join(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = pieces
        .iter()
        .copied()
        .collect::<Vec<_>>()
        .join(separator);
    let joined = joined.trim();
    (!joined.is_empty()).then(|| joined.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(start: u32, text: &str) -> String {
        format!(
            "[00:00:{:02}.000] --> [00:00:{:02}.000] {}",
            start,
            start + 3,
            text
        )
    }

    fn long_transcript() -> String {
        (0..20)
            .map(|i| line(i * 2, &format!("segment number {} talks about topic {}", i, i % 3)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_empty_input_gives_no_chunks() {
        let segmenter = TranscriptSegmenter::default();
        assert!(segmenter.segment("").is_empty());
        assert!(segmenter.segment("   \n\n  ").is_empty());
    }

    #[test]
    fn test_single_segment_is_one_chunk() {
        let segmenter = TranscriptSegmenter::default();
        let chunks = segmenter.segment("[00:00:00.000] --> [00:00:03.000] hello world test clip");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, 0);
        assert_eq!(chunks[0].metadata.source_span.unwrap().end_seconds, 3.0);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let segmenter = TranscriptSegmenter::new(200, 50);
        let text = long_transcript();
        assert_eq!(segmenter.segment(&text), segmenter.segment(&text));
    }

    #[test]
    fn test_chunks_respect_max_size_and_keep_lines_whole() {
        let segmenter = TranscriptSegmenter::new(200, 50);
        let text = long_transcript();
        let chunks = segmenter.segment(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 200, "chunk too long: {}", chunk.text);
            for l in chunk.text.lines() {
                assert!(text.lines().any(|orig| orig == l), "line was cut: {}", l);
            }
        }
        let ids: Vec<usize> = chunks.iter().map(|c| c.id).collect();
        assert_eq!(ids, (0..chunks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_oversized_timestamp_line_is_kept_whole() {
        let long = line(10, &"word ".repeat(40));
        let text = format!("{}\n{}\n{}", line(0, "short intro"), long, line(20, "short outro"));
        let segmenter = TranscriptSegmenter::new(80, 10);
        let chunks = segmenter.segment(&text);

        let oversized: Vec<&Chunk> = chunks.iter().filter(|c| c.char_len() > 80).collect();
        assert_eq!(oversized.len(), 1);
        assert_eq!(oversized[0].text, long.trim());
        assert!(chunks.iter().any(|c| c.text.contains("short intro")));
        assert!(chunks.iter().any(|c| c.text.contains("short outro")));
    }

    #[test]
    fn test_untagged_long_line_falls_back_to_words_with_overlap() {
        let segmenter = TranscriptSegmenter::new(30, 10);
        let chunks = segmenter.segment("aa bb cc dd ee ff gg hh ii jj kk");
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aa bb cc dd ee ff gg hh ii jj", "hh ii jj kk"]);
    }

    #[test]
    fn test_paragraphs_split_before_lines() {
        let para_a = format!("{}\n{}", line(0, "alpha one"), line(3, "alpha two"));
        let para_b = format!("{}\n{}", line(6, "beta one"), line(9, "beta two"));
        let text = format!("{}\n\n{}", para_a, para_b);
        let segmenter = TranscriptSegmenter::new(para_a.chars().count() + 5, 0);
        let chunks = segmenter.segment(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, para_a);
        assert_eq!(chunks[1].text, para_b);
    }

    #[test]
    fn test_cjk_measured_in_characters() {
        let text = format!("{}\n{}", line(0, "你好世界"), line(3, "再见世界"));
        let segmenter = TranscriptSegmenter::new(char_len(&text), 0);
        assert_eq!(segmenter.segment(&text).len(), 1);
    }
}
