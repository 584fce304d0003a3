//! Summarize command implementation.

use super::{open_session, require};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(video_id: &str, settings: Settings) -> Result<()> {
    require(Operation::Ask)?;

    let pipeline = Pipeline::new(settings)?;
    let session = open_session(&pipeline, video_id).await?;

    let spinner = Output::spinner("Summarizing...");
    let summary = session.summarize().await;
    spinner.finish_and_clear();

    match summary {
        Ok(summary) => {
            Output::answer(&summary);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Summary failed: {}", e));
            Err(e.into())
        }
    }
}
