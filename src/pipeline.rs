//! The daily run: snapshot lookup, feed loading, scoring, ranking and output.
//!
//! Every stage runs after the previous one finished and model calls are made
//! one at a time. Only the scoring stage tolerates failures; cache and output
//! errors end the run.

use crate::api::AskAsync;
use crate::cache;
use crate::config::RunConfig;
use crate::feeds::loader::load_feeds;
use crate::models::{Digest, FeedItem};
use crate::outputs::{indexes, markdown};
use crate::ranking::rank;
use crate::scoring::score_sources;
use chrono::NaiveDate;
use std::error::Error;
use std::path::PathBuf;
use tracing::{error, info, instrument};

/// What a run did, for the final log line.
#[derive(Debug)]
pub struct RunSummary {
    pub from_cache: bool,
    pub parsed: usize,
    pub failed_feeds: usize,
    pub scored: usize,
    pub digest: Digest,
    pub digest_path: PathBuf,
}

/// Pick the best entries: score each source, rank, keep the top `max_article_nums`.
///
/// Evaluations are attached to the anchor entries in `items`.
pub async fn select_articles<A>(items: &mut [FeedItem], config: &RunConfig, scorer: &A) -> (usize, Vec<FeedItem>)
where
    A: AskAsync<Response = String>,
{
    let scored = score_sources(items, config.max_analyze, scorer).await;
    let count = scored.len();
    (count, rank(scored, config.max_article_nums))
}

/// Run the whole pipeline for `today`.
#[instrument(level = "info", skip_all, fields(today = %today, cache_enabled = config.cache_enabled))]
pub async fn run<A>(config: &RunConfig, scorer: &A, today: NaiveDate) -> Result<RunSummary, Box<dyn Error>>
where
    A: AskAsync<Response = String>,
{
    let snapshot = cache::locate_snapshot(config.cache_enabled, &config.cache_dir, today).await?;

    let (mut items, failed_feeds) = match &snapshot {
        Some(path) => (cache::read_snapshot(path).await?, 0),
        None => {
            let report = load_feeds(&config.rss_resource, config.feed_failure_policy).await?;
            (report.items, report.failed_feeds)
        }
    };
    info!(count = items.len(), from_cache = snapshot.is_some(), "Entries ready");

    if config.cache_enabled {
        cache::write_snapshot(&items, &config.cache_dir, today).await?;
    }

    let (scored, articles) = select_articles(&mut items, config, scorer).await;
    let digest = Digest { date: today, articles };

    let digest_path = markdown::write_digest(&digest, &items, &config.markdown_output_dir).await?;
    let markdown_filename = markdown::digest_file_name(&digest);
    if let Err(e) = indexes::update_digest_index(&config.markdown_output_dir, &digest, &markdown_filename).await {
        error!(error = %e, "Failed to update digest index");
    }

    Ok(RunSummary {
        from_cache: snapshot.is_some(),
        parsed: items.len(),
        failed_feeds,
        scored,
        digest,
        digest_path,
    })
}
