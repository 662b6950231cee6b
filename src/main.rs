//! Billscan - receipt and invoice digitization pipeline.
//!
//! A tool for digitizing receipt images: quality gating, OCR field
//! extraction with confidence scoring, human-review routing, and
//! progress notification correlation.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use billscan::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "billscan=debug"
    } else {
        "billscan=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
