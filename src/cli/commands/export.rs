//! Export command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::transcription::{format_transcript, parse_timestamped, OutputFormat};
use anyhow::{anyhow, Result};

/// Run the export command.
pub fn run_export(
    video_id: &str,
    output: Option<String>,
    format: &str,
    settings: Settings,
) -> Result<()> {
    let output_format: OutputFormat = format.parse().map_err(|e: String| anyhow!(e))?;

    let path = settings.transcript_path(video_id)?;
    if !path.exists() {
        Output::error(&format!("No stored transcript found for video ID: {}", video_id));
        Output::info("Process the video first with 'vidra process <video>'.");
        return Ok(());
    }

    let transcript = parse_timestamped(video_id, &std::fs::read_to_string(&path)?)?;
    let output_str = format_transcript(&transcript, output_format);

    match output {
        Some(path) if path != "-" => {
            std::fs::write(&path, &output_str)?;
            Output::success(&format!(
                "Exported '{}' to {} ({} segments)",
                video_id,
                path,
                transcript.segments.len()
            ));
        }
        _ => {
            println!("{}", output_str);
        }
    }

    Ok(())
}
