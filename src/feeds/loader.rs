//! Fetching of the configured feeds.

use crate::config::FeedFailurePolicy;
use crate::feeds::parser::parse_feed;
use crate::feeds::sources::{load_sources, FeedSource};
use crate::models::FeedItem;
use reqwest::Client;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Entries fetched in one run together with the number of feeds that failed.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub items: Vec<FeedItem>,
    pub failed_feeds: usize,
}

/// Fetch a single feed and parse its entries.
#[instrument(level = "info", skip_all, fields(url = %source.url))]
async fn fetch_feed(client: &Client, source: &FeedSource) -> Result<Vec<FeedItem>, Box<dyn Error>> {
    let body = client
        .get(&source.url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_feed(&body, source)
}

/// Merge the entries of successfully parsed feeds, in feed order.
///
/// A failed feed is logged and counted under [`FeedFailurePolicy::Skip`]; under
/// [`FeedFailurePolicy::Abort`] its error is returned immediately.
fn collect_feed<E: std::fmt::Display>(
    report: &mut LoadReport,
    source: &FeedSource,
    result: Result<Vec<FeedItem>, E>,
    policy: FeedFailurePolicy,
) -> Result<(), E> {
    match result {
        Ok(items) => {
            for item in &items {
                info!(date = %item.date, link = %item.link, "Parsed feed entry");
            }
            info!(url = %source.url, count = items.len(), "Fetched feed");
            report.items.extend(items);
            Ok(())
        }
        Err(e) => match policy {
            FeedFailurePolicy::Abort => {
                error!(url = %source.url, error = %e, "Feed failed; aborting run");
                Err(e)
            }
            FeedFailurePolicy::Skip => {
                error!(url = %source.url, error = %e, "Feed failed; skipping");
                report.failed_feeds += 1;
                Ok(())
            }
        },
    }
}

/// Load every feed listed under `resource_dir`, one request at a time.
#[instrument(level = "info", skip_all, fields(resource_dir = %resource_dir.display(), policy = ?policy))]
pub async fn load_feeds(
    resource_dir: &Path,
    policy: FeedFailurePolicy,
) -> Result<LoadReport, Box<dyn Error>> {
    let sources = load_sources(resource_dir).await?;
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let mut report = LoadReport::default();
    for source in &sources {
        let result = fetch_feed(&client, source).await;
        collect_feed(&mut report, source, result, policy)?;
    }

    info!(
        feeds = sources.len(),
        failed = report.failed_feeds,
        entries = report.items.len(),
        "Finished loading feeds"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_item;

    fn source(url: &str) -> FeedSource {
        FeedSource {
            url: url.to_string(),
            title: None,
            enabled: true,
        }
    }

    #[test]
    fn test_skip_policy_counts_failures_and_keeps_order() {
        let mut report = LoadReport::default();
        let a = source("https://a.example/rss");
        let b = source("https://b.example/rss");
        let c = source("https://c.example/rss");

        collect_feed::<String>(
            &mut report,
            &a,
            Ok(vec![
                sample_item("A", "https://a.example/1", "x"),
                sample_item("A", "https://a.example/2", "y"),
            ]),
            FeedFailurePolicy::Skip,
        )
        .unwrap();
        collect_feed(&mut report, &b, Err("timeout".to_string()), FeedFailurePolicy::Skip).unwrap();
        collect_feed::<String>(
            &mut report,
            &c,
            Ok(vec![sample_item("C", "https://c.example/1", "z")]),
            FeedFailurePolicy::Skip,
        )
        .unwrap();

        let links: Vec<&str> = report.items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://a.example/1", "https://a.example/2", "https://c.example/1"]
        );
        assert_eq!(report.failed_feeds, 1);
    }

    #[test]
    fn test_abort_policy_propagates() {
        let mut report = LoadReport::default();
        let res = collect_feed::<String>(
            &mut report,
            &source("https://a.example/rss"),
            Err("bad xml".to_string()),
            FeedFailurePolicy::Abort,
        );
        assert_eq!(res, Err("bad xml".to_string()));
        assert_eq!(report.failed_feeds, 0);
    }

    #[tokio::test]
    async fn test_empty_resource_dir_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let report = load_feeds(dir.path(), FeedFailurePolicy::Abort).await.unwrap();
        assert!(report.items.is_empty());
        assert_eq!(report.failed_feeds, 0);
    }
}
