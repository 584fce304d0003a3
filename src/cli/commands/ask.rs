//! Ask command implementation.

use super::{open_session, require};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(video_id: &str, question: &str, settings: Settings) -> Result<()> {
    require(Operation::Ask)?;

    let pipeline = Pipeline::new(settings)?;
    let session = open_session(&pipeline, video_id).await?;

    let spinner = Output::spinner("Thinking...");
    let outcome = session.ask(question).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(outcome) => {
            Output::answer(&outcome.answer);

            if !outcome.sources.is_empty() {
                Output::header("Sources");
                for (rank, chunk) in outcome.sources.iter().enumerate() {
                    Output::source(rank + 1, chunk);
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            Err(e.into())
        }
    }
}
