//! Transcript data types.

use serde::{Deserialize, Serialize};

/// The timestamped transcript of one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Identifier the transcript is stored under, usually the video's file stem.
    pub video_id: String,
    pub segments: Vec<TranscriptSegment>,
    /// End of the last segment.
    pub duration_seconds: f64,
}

impl Transcript {
    pub fn new(video_id: impl Into<String>, segments: Vec<TranscriptSegment>) -> Self {
        let duration_seconds = segments
            .iter()
            .map(|s| s.end_seconds)
            .fold(0.0, f64::max);

        Self {
            video_id: video_id.into(),
            segments,
            duration_seconds,
        }
    }

    /// True when no segment carries any recognized speech.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(TranscriptSegment::is_blank)
    }

    /// Same timing, different text per segment.
    pub fn map_text<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&TranscriptSegment) -> String,
    {
        let segments = self
            .segments
            .iter()
            .map(|s| TranscriptSegment::new(s.start_seconds, s.end_seconds, f(s)))
            .collect();
        Self::new(self.video_id.clone(), segments)
    }
}

/// One utterance with its time span in the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Short human clock for chunk labels: `MM:SS`, or `HH:MM:SS` past an hour.
pub fn format_timestamp(seconds: f64) -> String {
    let whole = seconds.max(0.0) as u64;
    let (h, m, s) = (whole / 3600, (whole / 60) % 60, whole % 60);

    if h == 0 {
        format!("{:02}:{:02}", m, s)
    } else {
        format!("{:02}:{:02}:{:02}", h, m, s)
    }
}
