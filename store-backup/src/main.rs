//! Store Backup - Main entry point
//!
//! Captures or restores the storefront's file stores as a single blob.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use store_backup::{utils, BackupOrchestrator, BackupReport, BackupService, Config, FileStore};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture all stores into a backup file
    Download {
        /// Output file (default: store-backup-YYYY-MM-DD.bin)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Replace all stores with the contents of a backup file
    Upload {
        /// Backup file produced by `download`
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)
            .with_context(|| format!("loading {}", config_path.display()))?
    } else {
        Config::default()
    };

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::info!("Starting store-backup v{}", env!("CARGO_PKG_VERSION"));

    let content_store = Arc::new(FileStore::open(&config.stores.content_store)?);
    let template_store = Arc::new(FileStore::open(&config.stores.template_store)?);
    let service = BackupService::new(BackupOrchestrator::from_config(
        &config,
        content_store,
        template_store,
    ));

    match args.command {
        Command::Download { output } => {
            let output = output.unwrap_or_else(default_output_name);
            let download = service.download().await?;
            if !download.template_tree_listed {
                tracing::warn!(
                    "Template tree {} could not be listed; backup holds no templates",
                    config.stores.template_tree.display()
                );
            }
            tokio::fs::write(&output, &download.blob)
                .await
                .with_context(|| format!("writing {}", output.display()))?;
            log_report("Backup", &download.report);
            tracing::info!("Wrote {} bytes to {}", download.blob.len(), output.display());
        }
        Command::Upload { input } => {
            let blob = tokio::fs::read(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            let report = service.upload(blob).await?;
            log_report("Restore", &report);
        }
    }

    Ok(())
}

fn default_output_name() -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    PathBuf::from(format!("store-backup-{}.bin", today))
}

fn log_report(operation: &str, report: &BackupReport) {
    for (name, collection) in [
        ("content store", &report.content_store),
        ("template store", &report.template_store),
        ("images", &report.images),
        ("template tree", &report.template_tree),
    ] {
        tracing::info!(
            "{} {}: {} ok, {} skipped",
            operation,
            name,
            collection.processed,
            collection.skipped
        );
    }

    if !report.is_complete() {
        tracing::warn!(
            "{} finished with {} skipped items; see warnings above",
            operation,
            report.total_skipped()
        );
    }
}
