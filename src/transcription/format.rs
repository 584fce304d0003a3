//! Transcript text formats.
//!
//! The timestamped text format is what gets persisted and indexed:
//! one line per segment, `[HH:MM:SS.mmm] --> [HH:MM:SS.mmm] text`.
//! SRT, WebVTT and JSON are export formats for other tools.

use super::{Transcript, TranscriptSegment};
use crate::error::{Result, VidraError};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::warn;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
    Srt,
    Vtt,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" | "webvtt" => Ok(OutputFormat::Vtt),
            _ => Err(format!("Unknown format: {}. Use text, json, srt, or vtt.", s)),
        }
    }
}

/// JSON-serializable transcript for export.
#[derive(Debug, Serialize)]
pub struct TranscriptExport {
    pub media_id: String,
    pub duration_seconds: f64,
    pub segments: Vec<SegmentExport>,
}

#[derive(Debug, Serialize)]
pub struct SegmentExport {
    pub text: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl From<&Transcript> for TranscriptExport {
    fn from(transcript: &Transcript) -> Self {
        Self {
            media_id: transcript.video_id.clone(),
            duration_seconds: transcript.duration_seconds,
            segments: transcript
                .segments
                .iter()
                .map(|s| SegmentExport {
                    text: s.text.clone(),
                    start_seconds: s.start_seconds,
                    end_seconds: s.end_seconds,
                })
                .collect(),
        }
    }
}

fn line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[(\d{2,}:\d{2}:\d{2}(?:\.\d{1,3})?)\]\s*-->\s*\[(\d{2,}:\d{2}:\d{2}(?:\.\d{1,3})?)\]\s?(.*)$")
            .expect("timestamp line pattern is valid")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[(\d{2,}:\d{2}:\d{2}(?:\.\d{1,3})?)\]").expect("timestamp tag pattern is valid")
    })
}

/// Format a timestamp tag, e.g. `[00:01:02.500]`.
pub fn timestamp_tag(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("[{:02}:{:02}:{:02}.{:03}]", hours, minutes, secs, ms)
}

/// Parse the inside of a tag (`HH:MM:SS.mmm`) into seconds.
pub fn parse_clock(clock: &str) -> Option<f64> {
    let mut parts = clock.splitn(3, ':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let secs: f64 = parts.next()?.parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + secs)
}

/// Whether a line starts with a timestamp tag.
pub fn is_timestamped_line(line: &str) -> bool {
    tag_regex()
        .find(line.trim_start())
        .is_some_and(|m| m.start() == 0)
}

/// All timestamp values (in seconds) appearing in `text`, in order.
pub fn timestamps_in(text: &str) -> Vec<f64> {
    tag_regex()
        .captures_iter(text)
        .filter_map(|c| parse_clock(&c[1]))
        .collect()
}

/// Remove all timestamp tags and arrows, leaving the spoken text.
pub fn strip_timestamps(text: &str) -> String {
    tag_regex().replace_all(text, " ").replace("-->", " ")
}

/// Collapse every run of whitespace, newlines included, into one space.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a transcript in the timestamped text format.
///
/// Each segment occupies exactly one line, whatever its text contains.
pub fn render_timestamped(transcript: &Transcript) -> String {
    transcript
        .segments
        .iter()
        .map(|s| {
            format!(
                "{} --> {} {}",
                timestamp_tag(s.start_seconds),
                timestamp_tag(s.end_seconds),
                single_line(&s.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse the timestamped text format back into a transcript.
///
/// Blank lines are ignored and malformed lines are skipped with a warning.
/// Fails only when no line could be parsed.
pub fn parse_timestamped(video_id: &str, text: &str) -> Result<Transcript> {
    let mut segments = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = line_regex().captures(line).and_then(|caps| {
            let start = parse_clock(&caps[1])?;
            let end = parse_clock(&caps[2])?;
            Some(TranscriptSegment::new(start, end, caps[3].trim().to_string()))
        });

        match parsed {
            Some(segment) => segments.push(segment),
            None => warn!("Skipping malformed transcript line {}: {}", lineno + 1, line),
        }
    }

    if segments.is_empty() {
        return Err(VidraError::InvalidInput(
            "No timestamped lines found in transcript".to_string(),
        ));
    }

    Ok(Transcript::new(video_id.to_string(), segments))
}

/// Format a transcript for output.
pub fn format_transcript(transcript: &Transcript, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_timestamped(transcript),
        OutputFormat::Json => format_json(transcript),
        OutputFormat::Srt => format_srt(transcript),
        OutputFormat::Vtt => format_vtt(transcript),
    }
}

fn format_json(transcript: &Transcript) -> String {
    let export = TranscriptExport::from(transcript);
    serde_json::to_string_pretty(&export).unwrap_or_else(|_| "{}".to_string())
}

/// Format as SRT (SubRip).
fn format_srt(transcript: &Transcript) -> String {
    let mut output = String::new();

    for (i, segment) in transcript.segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(segment.start_seconds),
            format_srt_timestamp(segment.end_seconds)
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

/// Format as WebVTT.
fn format_vtt(transcript: &Transcript) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for (i, segment) in transcript.segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_timestamp(segment.start_seconds),
            format_vtt_timestamp(segment.end_seconds)
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

/// Format timestamp for SRT (00:00:00,000).
fn format_srt_timestamp(seconds: f64) -> String {
    format_vtt_timestamp(seconds).replace('.', ",")
}

/// Format timestamp for VTT (00:00:00.000).
fn format_vtt_timestamp(seconds: f64) -> String {
    let tag = timestamp_tag(seconds);
    tag.trim_matches(|c| c == '[' || c == ']').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transcript() -> Transcript {
        Transcript::new(
            "test123".to_string(),
            vec![
                TranscriptSegment::new(0.0, 2.5, "Hello world.".to_string()),
                TranscriptSegment::new(2.5, 5.0, "This is a test.".to_string()),
            ],
        )
    }

    #[test]
    fn test_timestamp_tag() {
        assert_eq!(timestamp_tag(0.0), "[00:00:00.000]");
        assert_eq!(timestamp_tag(1.2), "[00:00:01.200]");
        assert_eq!(timestamp_tag(3661.123), "[01:01:01.123]");
    }

    #[test]
    fn test_render_timestamped() {
        let text = render_timestamped(&sample_transcript());
        assert_eq!(
            text,
            "[00:00:00.000] --> [00:00:02.500] Hello world.\n[00:00:02.500] --> [00:00:05.000] This is a test."
        );
    }

    #[test]
    fn test_multiline_segment_round_trips_as_one_line() {
        let transcript = Transcript::new(
            "translated",
            vec![
                TranscriptSegment::new(0.0, 4.0, "first line of translation\nsecond line of translation"),
                TranscriptSegment::new(4.0, 6.0, "  spaced\r\n\tout  "),
            ],
        );

        let text = render_timestamped(&transcript);
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(is_timestamped_line));

        let parsed = parse_timestamped("translated", &text).unwrap();
        assert_eq!(
            parsed.segments,
            vec![
                TranscriptSegment::new(0.0, 4.0, "first line of translation second line of translation"),
                TranscriptSegment::new(4.0, 6.0, "spaced out"),
            ]
        );
    }

    #[test]
    fn test_parse_timestamped_skips_malformed_lines() {
        let text = "[00:00:00.000] --> [00:00:03.000] hello world test clip\n\nnot a segment\n[00:01:00.500] --> [00:01:02.000] 你好";
        let transcript = parse_timestamped("clip", text).unwrap();
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.segments[0].text, "hello world test clip");
        assert_eq!(transcript.segments[0].end_seconds, 3.0);
        assert_eq!(transcript.segments[1].start_seconds, 60.5);
        assert_eq!(transcript.segments[1].text, "你好");
    }

    #[test]
    fn test_parse_timestamped_rejects_empty() {
        assert!(parse_timestamped("x", "").is_err());
        assert!(parse_timestamped("x", "just words\nmore words").is_err());
    }

    #[test]
    fn test_timestamp_helpers() {
        let line = "[00:00:05.000] --> [00:00:09.250] the borrow checker";
        assert!(is_timestamped_line(line));
        assert!(!is_timestamped_line("the borrow checker [00:00:05.000]"));
        assert_eq!(timestamps_in(line), vec![5.0, 9.25]);
        assert_eq!(strip_timestamps(line).trim(), "the borrow checker");
    }

    #[test]
    fn test_format_srt() {
        let srt = format_transcript(&sample_transcript(), OutputFormat::Srt);
        assert!(srt.contains("1\n00:00:00,000 --> 00:00:02,500"));
        assert!(srt.contains("Hello world."));
    }

    #[test]
    fn test_format_vtt() {
        let vtt = format_transcript(&sample_transcript(), OutputFormat::Vtt);
        assert!(vtt.starts_with("WEBVTT"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:02.500"));
    }

    #[test]
    fn test_format_json() {
        let json = format_transcript(&sample_transcript(), OutputFormat::Json);
        assert!(json.contains("\"media_id\": \"test123\""));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("srt".parse::<OutputFormat>().unwrap(), OutputFormat::Srt);
        assert_eq!("webvtt".parse::<OutputFormat>().unwrap(), OutputFormat::Vtt);
        assert!("doc".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(61.5), "00:01:01,500");
        assert_eq!(format_srt_timestamp(3661.123), "01:01:01,123");
    }
}
