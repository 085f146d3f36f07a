//! # NewsRadar
//!
//! A watch-list news discovery pipeline: it crosses tracked companies with
//! tracked key terms, searches a syndication feed endpoint for each pair,
//! resolves the provider's redirect links to canonical article URLs
//! through a browser-rendering service, filters by recency, extracts and
//! summarizes article content, and emits only previously-unseen items to
//! an append-only CSV, a plain-text digest and an email notification.
//!
//! ## Usage
//!
//! ```sh
//! newsradar -c newsradar.yaml
//! ```
//!
//! ## Architecture
//!
//! One invocation is one bounded batch run:
//! 1. **Discovery**: one feed request per (company, key term) pair, paced
//! 2. **Resolution**: redirect links driven to their destination in a
//!    bounded pool of rendering contexts
//! 3. **Enrichment**: article pages parsed and summarized, best-effort
//! 4. **Sinks**: history diff, CSV append, digest file, email

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod digest;
mod error;
mod extract;
mod feed;
mod history;
mod mailer;
mod models;
mod pipeline;
mod queries;
mod resolver;
mod summarize;
mod utils;

use cli::Cli;
use config::RadarConfig;
use extract::PageExtractor;
use feed::GoogleNewsFeed;
use mailer::Mailer;
use models::RunStatus;
use resolver::{RenderClient, RetryResolve};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsradar starting up");

    let args = Cli::parse();
    debug!(?args.config, "Parsed CLI arguments");

    // --- Config + CLI overrides ---
    let mut config = RadarConfig::load(&args.config).await?;
    if let Some(history_file) = args.history_file {
        config.history_path = history_file;
    }
    if let Some(digest_file) = args.digest_file {
        config.digest_path = digest_file;
    }
    if let Some(max_age_days) = args.max_age_days {
        config.max_age_days = max_age_days;
    }
    if let Some(receiver_email) = args.receiver_email {
        config.receiver_email = Some(receiver_email);
    }
    info!(
        companies = config.companies.len(),
        key_terms = config.key_terms.len(),
        max_age_days = config.max_age_days,
        "Loaded configuration"
    );

    // --- Assemble the pipeline stages ---
    let feed = GoogleNewsFeed::new(&config.feed_url);
    let resolver = RetryResolve::new(RenderClient::new(&config.redirect), &config.redirect);
    let extractor = PageExtractor::new();

    // Run-state observer: progress flows over a watch channel instead of
    // a shared mutable flag.
    let (status_tx, mut status_rx) = watch::channel(RunStatus::Idle);
    let observer = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            match status {
                RunStatus::Running {
                    done,
                    total,
                    message,
                } => info!(done, total, %message, "Run progress"),
                RunStatus::Completed { found, new } => {
                    info!(found, new, "Run completed")
                }
                RunStatus::Failed { error } => error!(%error, "Run failed"),
                RunStatus::Idle => {}
            }
        }
    });

    let report = pipeline::run(&config, &feed, &resolver, &extractor, &status_tx).await?;

    info!(
        total_queries = report.total_queries,
        found = report.found,
        new = report.new,
        "Pipeline finished"
    );

    // --- Notification dispatch: logged, never fatal ---
    if args.no_email {
        info!("--no-email set; skipping notification");
    } else {
        match (&config.smtp, &config.receiver_email) {
            (Some(smtp), Some(receiver)) => match Mailer::from_config(smtp) {
                Ok(mailer) => {
                    if let Err(e) = mailer.send(receiver, &report.subject, &report.body).await {
                        error!(%receiver, error = %e, "Failed to send notification email");
                    }
                }
                Err(e) => error!(error = %e, "Invalid SMTP configuration; email skipped"),
            },
            _ => warn!("SMTP or recipient not configured; skipping notification"),
        }
    }

    drop(status_tx);
    let _ = observer.await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        date = %Local::now().date_naive(),
        "Execution complete"
    );

    Ok(())
}
