//! Audio extraction and processing with ffmpeg.
//!
//! Videos are decoded to 16 kHz mono WAV, which is what Whisper expects, and
//! long audio is cut into fixed-length segments for upload.

use crate::error::{Result, VidraError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Sample rate of extracted audio.
pub const SAMPLE_RATE: u32 = 16_000;

/// Extracts the audio track of a video into `output_dir` as 16 kHz mono WAV.
///
/// Returns the path of the WAV file, named after the video's file stem.
#[instrument(skip(output_dir), fields(video = %video.display()))]
pub async fn extract_audio(video: &Path, output_dir: &Path) -> Result<PathBuf> {
    if !video.is_file() {
        return Err(VidraError::InvalidInput(format!(
            "Video file not found: {}",
            video.display()
        )));
    }

    std::fs::create_dir_all(output_dir)?;

    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");
    let target_path = output_dir.join(format!("{}.wav", stem));

    info!("Extracting audio to {:?}", target_path);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(video)
        .arg("-vn")
        .arg("-ac").arg("1")
        .arg("-ar").arg(SAMPLE_RATE.to_string())
        .arg("-acodec").arg("pcm_s16le")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(&target_path)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(target_path),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(VidraError::Audio(format!(
                "Video file is invalid or has no audio track: {}",
                err.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidraError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(VidraError::Audio(format!("ffmpeg error: {e}"))),
    }
}

/// Segments a long audio file into smaller chunks for processing.
///
/// Each chunk will be approximately `chunk_seconds` long. Returns tuples of
/// (chunk_path, offset_seconds) for each segment.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let chunk_len = chunk_seconds.max(1) as f64;

    if total_duration <= chunk_len {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let extension = source
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("wav");

    let offsets = segment_offsets(total_duration, chunk_len);
    let mut segments = Vec::with_capacity(offsets.len());

    for (idx, (offset, length)) in offsets.into_iter().enumerate() {
        let segment_path = output_dir.join(format!("{}_{:04}.{}", base_name, idx, extension));
        extract_segment(source, &segment_path, offset, length).await?;

        debug!("Created segment {} at offset {:.1}s", idx, offset);
        segments.push((segment_path, offset));
    }

    info!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// Start offset and length of each segment when cutting `total` seconds
/// into pieces of at most `chunk_len` seconds.
fn segment_offsets(total: f64, chunk_len: f64) -> Vec<(f64, f64)> {
    let mut offsets = Vec::new();
    let mut offset = 0.0;
    while offset < total {
        offsets.push((offset, chunk_len.min(total - offset)));
        offset += chunk_len;
    }
    offsets
}

/// Extracts a time segment from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Ok(status) = copy_result {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding segment");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-ac").arg("1")
        .arg("-ar").arg(SAMPLE_RATE.to_string())
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(VidraError::Audio(format!("Segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidraError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(VidraError::Audio(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of a media file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VidraError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(VidraError::Audio(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(VidraError::Audio("ffprobe returned error".into()));
    }

    parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_duration(json: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json)
        .map_err(|_| VidraError::Audio("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| VidraError::Audio("Could not determine audio duration".into()))
}

/// Removes temporary files, ignoring ones that are already gone.
pub fn cleanup(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Removed temporary file {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {:?}: {}", path, e),
        }
    }
}
