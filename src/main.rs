//! citewatch - Google Scholar citation tracker
//!
//! ## Usage
//!
//! ```bash
//! SERPAPI_KEY=... citewatch check
//! ```
//!
//! One invocation performs one check: fetch, diff, persist, export, notify.
//! Scheduling is the caller's job (cron, GitHub Actions).

use anyhow::{Context, Result};
use chrono::Utc;
use citewatch::config::{Config, Overrides};
use citewatch::dashboard::DashboardExporter;
use citewatch::diff::compute_diff;
use citewatch::notify::Notifier;
use citewatch::report;
use citewatch::serpapi::ScholarClient;
use citewatch::snapshot::SnapshotStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Google Scholar citation tracker
#[derive(Parser)]
#[command(name = "citewatch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one citation check
    Check {
        /// Google Scholar author id (defaults to the tracked profile)
        #[arg(long)]
        author_id: Option<String>,

        /// Snapshot file path
        #[arg(long)]
        data_file: Option<PathBuf>,

        /// Dashboard export file path
        #[arg(long)]
        dashboard_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Check {
            author_id,
            data_file,
            dashboard_file,
        } => {
            run_check(Overrides {
                author_id,
                data_file,
                dashboard_file,
            })
            .await
        }
    }
}

async fn run_check(overrides: Overrides) -> Result<()> {
    info!("{}", "=".repeat(60));
    info!("Scholar Citation Tracker - starting check");
    info!("{}", "=".repeat(60));

    let config = Config::from_env(overrides).context("Failed to load configuration")?;

    // 1. Load previous snapshot
    let store = SnapshotStore::new(
        config.data_file.clone(),
        &config.author_id,
        &config.author_name,
    );
    let old = store.load().context("Failed to load previous snapshot")?;
    info!(total = old.total_citations, "Previous total citations");

    // 2. Fetch current data from Google Scholar
    let client = ScholarClient::new(&config)?;
    let metrics = client
        .fetch_profile()
        .await
        .context("Profile fetch failed")?;
    let articles = client
        .fetch_all_articles()
        .await
        .context("Article fetch failed")?;

    info!(
        total = metrics.total_citations,
        h_index = metrics.h_index,
        i10_index = metrics.i10_index,
        "Current metrics"
    );

    // 3. Compute diff against the previous snapshot
    let diff = compute_diff(&old, &metrics, &articles);

    // 4. Persist the new snapshot before any notification, so a delivery
    // failure never loses the freshly computed state
    let now = Utc::now();
    let new_snapshot = old.advance(&metrics, articles, now.to_rfc3339());
    store.save(&new_snapshot).context("Failed to save snapshot")?;

    // 5. Refresh dashboard data
    DashboardExporter::new(&config)
        .export(&new_snapshot, &diff)
        .context("Dashboard export failed")?;

    // 6. Notify only when the aggregate total increased
    if diff.has_changes {
        info!(
            gained = diff.total_citations.gained,
            "Detected new citations"
        );
        let checked_at = now.format("%Y-%m-%d %H:%M UTC").to_string();
        Notifier::new(&config)
            .notify(&diff, &checked_at)
            .context("Email delivery failed")?;
    } else {
        info!("No new citations detected");
    }

    // 7. Best-effort CI summary, both branches
    if let Some(path) = &config.step_summary_file {
        if let Err(e) = report::append_summary(path, &diff) {
            warn!(error = %e, "Failed to append step summary");
        }
    }

    info!("{}", "=".repeat(60));
    info!("Check complete");
    info!("{}", "=".repeat(60));
    Ok(())
}
