//! Process command implementation.

use super::require;
use crate::cli::preflight::Operation;
use crate::cli::{format_duration, Output};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;
use std::path::Path;

/// Run the process command.
pub async fn run_process(
    video: &str,
    translate_to: Option<String>,
    no_summary: bool,
    settings: Settings,
) -> Result<()> {
    require(Operation::Process)?;

    let pipeline = Pipeline::new(settings)?;

    Output::info(&format!("Processing: {}", video));

    let processed = match pipeline
        .process_video(Path::new(video), translate_to.as_deref())
        .await
    {
        Ok(processed) => processed,
        Err(e) => {
            Output::error(&format!("Processing failed: {}", e));
            return Err(e.into());
        }
    };

    let transcribed = &processed.transcribed;
    Output::success(&format!("Processed '{}'", transcribed.transcript.video_id));
    Output::kv("Duration", &format_duration(transcribed.transcript.duration_seconds));
    Output::kv("Segments", &transcribed.transcript.segments.len().to_string());
    Output::kv("Chunks", &processed.chunks_indexed.to_string());
    Output::kv("Transcript", &transcribed.transcript_path.display().to_string());
    if let Some(report) = &transcribed.translation {
        Output::kv(
            "Translation",
            &format!(
                "{} translated, {} blank, {} kept original",
                report.translated, report.skipped, report.failed
            ),
        );
    }

    if !no_summary {
        let spinner = Output::spinner("Summarizing...");
        let summary = processed.session.summarize().await;
        spinner.finish_and_clear();

        match summary {
            Ok(summary) => {
                Output::header("Summary");
                Output::answer(&summary);
            }
            Err(e) => Output::warning(&format!("Summary failed: {}", e)),
        }
    }

    Output::info(&format!(
        "Ask questions with: vidra chat {}",
        transcribed.transcript.video_id
    ));

    Ok(())
}
