//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod export;
mod process;
mod search;
mod serve;
mod summarize;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use export::run_export;
pub use process::run_process;
pub use search::run_search;
pub use serve::run_serve;
pub use summarize::run_summarize;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::pipeline::Pipeline;
use crate::session::ConversationSession;

/// Fail early with a pointer to `vidra doctor` if requirements are missing.
fn require(operation: Operation) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidra doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    Ok(())
}

/// Index a stored transcript into a ready session.
async fn open_session(pipeline: &Pipeline, video_id: &str) -> anyhow::Result<ConversationSession> {
    let spinner = Output::spinner("Indexing transcript...");
    let session = pipeline.open_session(video_id).await;
    spinner.finish_and_clear();
    Ok(session?)
}
