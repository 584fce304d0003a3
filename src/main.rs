//! Vidra CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidra::cli::{commands, Cli, Commands};
use vidra::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vidra={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Process { video, translate_to, no_summary } => {
            commands::run_process(video, translate_to.clone(), *no_summary, settings).await?;
        }

        Commands::Summarize { video_id } => {
            commands::run_summarize(video_id, settings).await?;
        }

        Commands::Ask { video_id, question } => {
            commands::run_ask(video_id, question, settings).await?;
        }

        Commands::Chat { video_id } => {
            commands::run_chat(video_id, settings).await?;
        }

        Commands::Search { video_id, query, limit } => {
            commands::run_search(video_id, query, *limit, settings).await?;
        }

        Commands::Export { video_id, output, format } => {
            commands::run_export(video_id, output.clone(), format, settings)?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
