//! Daily snapshot of parsed feed entries.
//!
//! When caching is enabled a run first looks for a snapshot written earlier the
//! same day and, if one exists, decodes it instead of fetching the feeds. The
//! entries a run works with are then written back to
//! `{cache_dir}/article_cache_{YYYY-MM-DD}.json`, replacing any same-day file.
//!
//! There is no locking: concurrent runs against the same directory race on
//! the snapshot.

use crate::models::FeedItem;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::error::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// File name of the snapshot for `day`.
pub fn snapshot_file_name(day: NaiveDate) -> String {
    format!("article_cache_{}.json", day.format("%Y-%m-%d"))
}

/// Find today's snapshot.
///
/// Returns the lexicographically last file in `cache_dir` whose name ends in
/// `{YYYY-MM-DD}.json`. Hidden files are ignored. Always `None` when caching
/// is disabled or the directory does not exist.
#[instrument(level = "info", skip_all, fields(cache_dir = %cache_dir.display(), today = %today))]
pub async fn locate_snapshot(
    cache_enabled: bool,
    cache_dir: &Path,
    today: NaiveDate,
) -> Result<Option<PathBuf>, Box<dyn Error>> {
    if !cache_enabled {
        debug!("Snapshot cache disabled");
        return Ok(None);
    }

    let mut entries = match fs::read_dir(cache_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Cache directory does not exist yet");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let suffix = format!("{}.json", today.format("%Y-%m-%d"));
    let mut matches = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.ends_with(&suffix) && !name.starts_with('.') && entry.file_type().await?.is_file() {
            matches.push(entry.path());
        }
    }
    matches.sort();

    let found = matches.pop();
    match &found {
        Some(path) => info!(path = %path.display(), "Found today's snapshot"),
        None => info!("No snapshot for today"),
    }
    Ok(found)
}

/// Decode a snapshot file back into feed entries.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_snapshot(path: &Path) -> Result<Vec<FeedItem>, Box<dyn Error>> {
    let raw = fs::read_to_string(path).await?;
    let items: Vec<FeedItem> = serde_json::from_str(&raw)?;
    info!(count = items.len(), "Decoded snapshot");
    Ok(items)
}

/// Write `items` as today's snapshot, creating `cache_dir` if needed.
///
/// The JSON array is indented with four spaces.
#[instrument(level = "info", skip_all, fields(cache_dir = %cache_dir.display(), count = items.len()))]
pub async fn write_snapshot(
    items: &[FeedItem],
    cache_dir: &Path,
    today: NaiveDate,
) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(cache_dir).await?;
    let path = cache_dir.join(snapshot_file_name(today));

    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    items.serialize(&mut ser)?;

    fs::write(&path, buf).await?;
    info!(path = %path.display(), "Wrote snapshot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{sample_item, Evaluation};
    use serde_json::json;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_snapshot_file_name() {
        assert_eq!(snapshot_file_name(day()), "article_cache_2026-10-16.json");
    }

    #[tokio::test]
    async fn test_locate_disabled_ignores_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("article_cache_2026-10-16.json"), "[]").unwrap();

        let found = locate_snapshot(false, dir.path(), day()).await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_locate_picks_last_match_for_today() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "article_cache_2026-10-16.json",
            "b_2026-10-16.json",
            "article_cache_2026-10-15.json",
            "zzz_2026-10-16.json.bak",
            ".hidden_2026-10-16.json",
        ] {
            std::fs::write(dir.path().join(name), "[]").unwrap();
        }

        let found = locate_snapshot(true, dir.path(), day()).await.unwrap();
        assert_eq!(found, Some(dir.path().join("b_2026-10-16.json")));
    }

    #[tokio::test]
    async fn test_locate_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let found = locate_snapshot(true, &dir.path().join("draft"), day()).await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("draft");

        let mut scored = sample_item("Alpha", "https://a.example/1", "<p>Alpha &amp; more</p>");
        scored.info.insert("feed_url".to_string(), "https://a.example/rss".to_string());
        let fields = json!({"score": 7, "comment": "solid"}).as_object().cloned().unwrap();
        scored.evaluation = Some(Evaluation::try_from(fields).unwrap());
        let items = vec![scored, sample_item("Beta", "https://b.example/1", "")];

        let path = write_snapshot(&items, &cache_dir, day()).await.unwrap();
        assert_eq!(path, cache_dir.join("article_cache_2026-10-16.json"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n    {"));

        let decoded = read_snapshot(&path).await.unwrap();
        assert_eq!(decoded, items);

        let found = locate_snapshot(true, &cache_dir, day()).await.unwrap();
        assert_eq!(found, Some(path));
    }

    #[tokio::test]
    async fn test_write_overwrites_same_day() {
        let dir = tempfile::tempdir().unwrap();
        let first = vec![sample_item("Alpha", "https://a.example/1", "one")];
        let second = vec![sample_item("Beta", "https://b.example/1", "two")];

        write_snapshot(&first, dir.path(), day()).await.unwrap();
        let path = write_snapshot(&second, dir.path(), day()).await.unwrap();

        assert_eq!(read_snapshot(&path).await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_read_corrupt_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("article_cache_2026-10-16.json");
        std::fs::write(&path, "{not an array").unwrap();
        assert!(read_snapshot(&path).await.is_err());
    }
}
