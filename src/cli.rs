//! CLI glue for wiki-mirror: command parsing, client construction from the
//! environment and the single `sync` trigger operation. All business logic
//! lives in [`crate::synchronise`] and the modules it orchestrates.

use crate::fetch::ConfluenceFetcher;
use crate::load_config::load_config;
use crate::render::PdfRenderer;
use crate::storage::DriveClient;
use crate::synchronise::synchronise;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for wiki-mirror: mirror wiki page trees into cloud file storage.
#[derive(Parser)]
#[clap(
    name = "wiki-mirror",
    version,
    about = "Mirror wiki page trees into cloud file storage as PDF documents"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full synchronisation of all configured roots now
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            config.trace_loaded();

            let fetcher = ConfluenceFetcher::new_from_env()
                .map_err(|e| anyhow::anyhow!("Failed to construct source client: {e}"))?;
            // auth failure aborts the run before any page is visited
            let storage = DriveClient::connect_from_env()
                .await
                .map_err(|e| anyhow::anyhow!("Destination authentication failed: {e}"))?;
            let renderer = PdfRenderer::new();
            let root_folder_id = storage.root_folder_id().to_string();

            tracing::info!(command = "sync", "Starting synchronisation run");
            let report = synchronise(&config, &fetcher, &storage, &renderer, &root_folder_id).await;
            println!("Synchronise complete.");
            println!(
                "created: {} updated: {} skipped: {} failed: {} subtree gaps: {}",
                report.created(),
                report.updated(),
                report.skipped(),
                report.failed(),
                report.gap_count()
            );
            println!("Report:\n{report:#?}");
            Ok(())
        }
    }
}
