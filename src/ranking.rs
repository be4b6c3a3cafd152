//! Ranking of scored entries into the daily digest.

use crate::models::FeedItem;
use tracing::{debug, instrument};

/// Order scored entries best first and keep at most `max_article_nums`.
///
/// The sort is stable, so equal scores keep their input order. Entries
/// without an evaluation are never ranked.
#[instrument(level = "info", skip_all, fields(candidates = scored.len(), max_article_nums = max_article_nums))]
pub fn rank(scored: Vec<FeedItem>, max_article_nums: usize) -> Vec<FeedItem> {
    let mut ranked: Vec<(f64, FeedItem)> = scored
        .into_iter()
        .filter_map(|item| item.score().map(|score| (score, item)))
        .collect();

    ranked.sort_by(|(a, _), (b, _)| b.total_cmp(a));
    ranked.truncate(max_article_nums);
    debug!(kept = ranked.len(), "Ranked digest entries");

    ranked.into_iter().map(|(_, item)| item).collect()
}
