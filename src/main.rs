//! # RSS Digest
//!
//! A daily digest builder that collects entries from RSS and Atom feeds, asks
//! an LLM to score each source, and publishes the best picks as Markdown.
//!
//! ## Features
//!
//! - Reads feed URLs from YAML files in a resource directory
//! - Parses RSS 2.0, RSS 1.0 (RDF) and Atom documents
//! - Optionally snapshots the day's entries so a re-run skips the network
//! - Scores one group of entries per source through an OpenAI-compatible LLM API
//! - Writes `<date>.md` and keeps `daily_digest.md` up to date
//!
//! ## Usage
//!
//! ```sh
//! rss_digest -r ./resources -m ./digest
//! ```
//!
//! ## Architecture
//!
//! The application runs a sequential pipeline:
//! 1. **Loading**: Read today's snapshot, or fetch and parse every feed
//! 2. **Snapshot**: Save the entries when caching is enabled
//! 3. **Scoring**: Send each source's summaries to the LLM, one call at a time
//! 4. **Ranking**: Keep the highest scored sources
//! 5. **Output**: Write the Markdown digest and its index

use awful_aj::config::load_config;
use awful_aj::template;
use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cache;
mod cli;
mod config;
mod feeds;
mod models;
mod outputs;
mod pipeline;
mod ranking;
mod scoring;
mod utils;

use api::{ModelClient, RetryAsk};
use cli::Cli;
use config::{model_config_path, RunConfig};
use utils::ensure_writable_dir;

#[tokio::main(flavor = "current_thread")]
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
    info!("rss_digest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");
    let run_config = RunConfig::from(&args);

    if let Err(e) = ensure_writable_dir(&run_config.markdown_output_dir).await {
        error!(
            path = %run_config.markdown_output_dir.display(),
            error = %e,
            "Markdown output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Load template & config ----
    let template = template::load_template(&args.template).await?;
    info!(template = %args.template, "Loaded template");
    let conf_file = model_config_path(args.config.as_deref())?;
    let config_path = conf_file
        .to_str()
        .ok_or_else(|| format!("not a valid config filename: {}", conf_file.display()))?;
    let model_config = load_config(config_path)?;
    info!(config_path, "Loaded configuration");

    let scorer = RetryAsk::new(
        ModelClient::new(model_config, template),
        run_config.score_retries,
        Duration::from_secs(1),
    );

    let today = Local::now().date_naive();
    let summary = pipeline::run(&run_config, &scorer, today).await?;

    let elapsed = start_time.elapsed();
    info!(
        date = %today,
        from_cache = summary.from_cache,
        parsed = summary.parsed,
        failed_feeds = summary.failed_feeds,
        scored = summary.scored,
        picks = summary.digest.articles.len(),
        path = %summary.digest_path.display(),
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
