//! Feed source configuration.
//!
//! The feed resource is a directory of YAML files. Each file lists feeds:
//!
//! ```yaml
//! feeds:
//!   - url: https://blog.rust-lang.org/feed.xml
//!   - url: https://this-week-in-rust.org/rss.xml
//!     title: This Week in Rust
//!   - url: https://example.com/rss
//!     enabled: false
//! ```
//!
//! Files are read in file-name order and feeds keep their order within a
//! file, which fixes the order of entries for the whole run.

use serde::Deserialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// One configured RSS or Atom endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedSource {
    pub url: String,
    /// Overrides the title the feed announces for itself.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SourceFile {
    #[serde(default)]
    feeds: Vec<FeedSource>,
}

/// Parse the feeds listed in one YAML document.
pub fn parse_sources(yaml: &str) -> Result<Vec<FeedSource>, serde_yaml::Error> {
    let file: Option<SourceFile> = serde_yaml::from_str(yaml)?;
    Ok(file.map(|f| f.feeds).unwrap_or_default())
}

/// Load every enabled feed source from the YAML files in `resource_dir`.
///
/// A missing directory or an invalid file aborts the run.
#[instrument(level = "info", skip_all, fields(resource_dir = %resource_dir.display()))]
pub async fn load_sources(resource_dir: &Path) -> Result<Vec<FeedSource>, Box<dyn Error>> {
    let mut entries = fs::read_dir(resource_dir).await.map_err(|e| {
        format!("cannot read feed resource {}: {e}", resource_dir.display())
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_yaml && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut sources = Vec::new();
    for path in &files {
        let raw = fs::read_to_string(path).await?;
        let parsed = parse_sources(&raw)
            .map_err(|e| format!("invalid feed list {}: {e}", path.display()))?;
        debug!(path = %path.display(), count = parsed.len(), "Read feed list");
        sources.extend(parsed.into_iter().filter(|s| s.enabled));
    }

    info!(files = files.len(), feeds = sources.len(), "Loaded feed sources");
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sources() {
        let yaml = r#"
feeds:
  - url: https://a.example/rss
  - url: https://b.example/atom
    title: Bee
  - url: https://c.example/rss
    enabled: false
"#;
        let sources = parse_sources(yaml).unwrap();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].title, None);
        assert!(sources[0].enabled);
        assert_eq!(sources[1].title.as_deref(), Some("Bee"));
        assert!(!sources[2].enabled);
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_sources("").unwrap().is_empty());
        assert!(parse_sources("feeds: []").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_url() {
        assert!(parse_sources("feeds:\n  - title: nothing\n").is_err());
    }

    #[tokio::test]
    async fn test_load_sources_orders_files_and_skips_disabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b_news.yaml"),
            "feeds:\n  - url: https://b.example/1\n  - url: https://b.example/2\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a_blogs.yml"),
            "feeds:\n  - url: https://a.example/1\n    enabled: false\n  - url: https://a.example/2\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "feeds: nonsense").unwrap();

        let sources = load_sources(dir.path()).await.unwrap();
        let urls: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://a.example/2", "https://b.example/1", "https://b.example/2"]
        );
    }

    #[tokio::test]
    async fn test_load_sources_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sources(&dir.path().join("missing")).await.unwrap_err();
        assert!(err.to_string().contains("cannot read feed resource"));
    }

    #[tokio::test]
    async fn test_load_sources_invalid_yaml_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "feeds: [ {url: ").unwrap();
        assert!(load_sources(dir.path()).await.is_err());
    }
}
