//! CLI commands implementation.
//!
//! Each subcommand stands in for one of the orchestrator's triggers and
//! drives the matching service against the filesystem-backed
//! collaborators under the configured data directory.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use crate::cache::TieredOwnershipCache;
use crate::clients::{
    FsObjectStore, FsOwnershipTable, FsReviewDispatcher, LogNotificationChannel,
    OutboxOrchestrator, RegexEntityRecognizer, SidecarAnalyzer, SidecarClassifier,
};
use crate::config::BillscanConfig;
use crate::models::{LogEvent, StorageEventBatch};
use crate::services::analyze::{OutputSpec, SourceRef};
use crate::services::{
    AnalyzeRequest, AnalyzeService, DigitizeRequest, GateError, GateRequest, PipelineOptions,
    ProgressNotifier, QualityGate, ReceiptPipeline, ReviewResolver,
};

#[derive(Parser)]
#[command(name = "billscan")]
#[command(about = "Receipt and invoice digitization pipeline")]
#[command(version)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Check an uploaded image against the quality classifier's verdict
    Gate {
        /// Bucket holding the image
        #[arg(long)]
        bucket: String,
        /// Key of the image
        #[arg(long)]
        key: String,
    },

    /// Run document analysis for a stored image and deliver the result
    Analyze {
        /// Bucket holding the image
        #[arg(long)]
        bucket: String,
        /// Key of the image
        #[arg(long)]
        key: String,
        /// Print the result instead of storing it next to the source
        #[arg(long)]
        inline: bool,
        /// Destination prefix for a stored result
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Run one extraction pass over a stored analysis result
    Digitize {
        /// Bucket holding the analysis result
        #[arg(long)]
        bucket: String,
        /// Key of the analysis result
        #[arg(long)]
        key: String,
        /// Resume token to forward to a review task, if one is dispatched
        #[arg(long)]
        task_token: Option<String>,
    },

    /// Resolve completed human-review results from a storage event batch
    Review {
        /// Path to a JSON storage-event batch file
        events: PathBuf,
    },

    /// Publish progress notifications for a batch of lifecycle log events
    Notify {
        /// Path to a JSON file holding an array of log events
        events: PathBuf,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = BillscanConfig::load(cli.config.as_deref())?;

    let store = Arc::new(FsObjectStore::new(config.data_dir.join("objects")));

    match cli.command {
        Commands::Gate { bucket, key } => {
            let gate = QualityGate::new(Arc::new(SidecarClassifier::new(store.clone())));
            let request = GateRequest {
                bucket: Some(bucket),
                key: Some(key),
            };
            match gate.check(&request).await {
                Ok(outcome) => println!("{}", serde_json::to_string_pretty(&outcome)?),
                // A declined image is a business outcome, not a fault
                Err(err @ GateError::PoorQuality(_)) => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "Accepted": false,
                        "Error": err.kind(),
                        "Cause": err.to_string(),
                    }))?
                ),
                Err(err) => return Err(err.into()),
            }
        }

        Commands::Analyze {
            bucket,
            key,
            inline,
            prefix,
        } => {
            let service =
                AnalyzeService::new(Arc::new(SidecarAnalyzer::new(store.clone())), store);
            let response = service
                .run(&AnalyzeRequest {
                    input: Some(SourceRef { bucket, key }),
                    output: OutputSpec {
                        r#type: Some(if inline { "Inline" } else { "Store" }.into()),
                        prefix,
                        ..OutputSpec::default()
                    },
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Digitize {
            bucket,
            key,
            task_token,
        } => {
            let pipeline = ReceiptPipeline::new(
                store,
                Arc::new(RegexEntityRecognizer::new()),
                Arc::new(FsReviewDispatcher::new(config.data_dir.join("reviews"))),
                PipelineOptions {
                    confidence_threshold: config.confidence_threshold,
                    language: config.language.clone(),
                },
            );
            let response = pipeline
                .digitize(&DigitizeRequest {
                    bucket: Some(bucket),
                    key: Some(key),
                    task_token,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Review { events } => {
            let batch: StorageEventBatch = serde_json::from_str(&fs::read_to_string(&events)?)?;
            let orchestrator = Arc::new(OutboxOrchestrator::new(
                config.data_dir.join("workflow-outbox.jsonl"),
            ));
            let resolver = ReviewResolver::new(store, orchestrator);
            let stats = resolver.process_batch(&batch).await;
            println!(
                "resumed: {}, failed: {}, skipped: {}",
                stats.resumed, stats.failed, stats.skipped
            );
        }

        Commands::Notify { events } => {
            let events: Vec<LogEvent> = serde_json::from_str(&fs::read_to_string(&events)?)?;
            let table = Arc::new(FsOwnershipTable::new(config.data_dir.join("ownership")));
            let cache = Arc::new(TieredOwnershipCache::with_fast_bounds(
                table,
                config.cache.fast_capacity,
                std::time::Duration::from_secs(config.cache.fast_ttl_secs),
            ));
            let notifier = ProgressNotifier::with_prefix(
                cache,
                Arc::new(LogNotificationChannel),
                config.channel_prefix.clone(),
            );
            let stats = notifier.process_batch(&events).await;
            println!("published: {}, dropped: {}", stats.published, stats.dropped);
        }
    }

    Ok(())
}
