//! Search command implementation.

use super::{open_session, require};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(video_id: &str, query: &str, limit: usize, settings: Settings) -> Result<()> {
    require(Operation::Ask)?;

    let pipeline = Pipeline::new(settings)?;
    let session = open_session(&pipeline, video_id).await?;

    let spinner = Output::spinner("Searching...");
    let results = session.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(chunks) if chunks.is_empty() => {
            Output::warning("No results found matching your query.");
        }
        Ok(chunks) => {
            Output::success(&format!("Found {} results", chunks.len()));
            for (rank, chunk) in chunks.iter().enumerate() {
                Output::source(rank + 1, chunk);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
