//! # City Event Digest
//!
//! Scrapes upcoming tech and startup events for one city from several listing
//! sites, merges and deduplicates them, and emails a digest of the best ones.
//! Meant to be run by an external scheduler (cron, launchd, a CI timer).
//!
//! ## Features
//!
//! - Scrapes Luma, Eventbrite, Meetup and GarysGuide for each keyword
//! - Parses the many date formats those sites use into local start times
//! - Drops events outside the next `DAYS_AHEAD` days and cross-posted duplicates
//! - Ranks by relevance and sends a plain text + HTML email over SMTP
//!
//! ## Usage
//!
//! ```sh
//! SMTP_USER=me@example.com SMTP_PASSWORD=app-password city_event_digest
//! city_event_digest --dry-run --location "New York" --keywords ai,startup
//! ```
//!
//! ## Architecture
//!
//! 1. **Settings**: CLI, environment and YAML merged and validated before any I/O
//! 2. **Fetching**: one request per (keyword, source, page), 4 at a time, retried on transient errors
//! 3. **Normalizing**: raw listings become [`models::Event`]s inside the search window
//! 4. **Digest**: dedup, rank, render
//! 5. **Delivery**: SMTP, or stdout with `--dry-run`

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dates;
mod dedup;
mod digest;
mod fetch;
mod models;
mod normalize;
mod notify;
mod pipeline;
mod rank;
mod sources;
mod utils;

use cli::Cli;
use config::Settings;
use fetch::{HttpFetcher, RetryFetch};
use notify::{DryRunNotifier, SmtpNotifier};
use pipeline::Pipeline;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; real deployments set the environment directly.
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("city_event_digest starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, dry_run = args.dry_run, "Parsed CLI arguments");

    // ---- Settings: fail before any network activity ----
    let settings = match Settings::resolve(args) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        location = %settings.location,
        timezone = %settings.timezone,
        keywords = %settings.keywords.join(","),
        days_ahead = settings.days_ahead,
        sources = %settings.sources.iter().map(|s| s.slug()).collect::<Vec<_>>().join(","),
        dry_run = settings.dry_run,
        "Resolved settings"
    );

    let http = HttpFetcher::new(settings.request_timeout)?;
    let fetcher = RetryFetch::new(http, settings.retries, RETRY_BASE_DELAY);
    let sources = sources::build_sources(&settings);
    let now = Utc::now().with_timezone(&settings.timezone);

    let smtp = settings.smtp.clone();
    let pipeline = Pipeline::new(settings, sources, fetcher);

    let result = match smtp {
        Some(smtp) => {
            let notifier = SmtpNotifier::new(&smtp)?;
            pipeline.run(now, &notifier).await
        }
        None => pipeline.run(now, &DryRunNotifier).await,
    };

    let digest = match result {
        Ok(digest) => digest,
        Err(e) => {
            error!(error = %e, "Failed to deliver digest");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        events = digest.event_count,
        location = %pipeline.settings().location,
        "Execution complete"
    );

    Ok(())
}
