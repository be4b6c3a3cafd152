//! Utility functions for string handling and file system checks.
//!
//! - String truncation for logging
//! - Slugification for Markdown anchors
//! - Plain-text excerpts from HTML summaries
//! - File system validation for output directories

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (on a character boundary) with an
/// ellipsis and byte count indicator appended.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert a title to a URL-friendly slug.
///
/// Used for anchor links in the Markdown digest.
///
/// ```ignore
/// assert_eq!(slugify_title("Hello World"), "hello-world");
/// ```
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .replace(' ', "-")
}

/// Plain-text version of an HTML fragment, whitespace collapsed and cut to
/// at most `max_chars` characters.
pub fn plain_text_excerpt(html: &str, max_chars: usize) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    let text = WHITESPACE.replace_all(text.trim(), " ");

    if text.chars().count() <= max_chars {
        text.into_owned()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and immediately
/// deletes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let result = truncate_for_log("日本語テキスト", 4);
        assert!(result.starts_with("日"));
    }

    #[test]
    fn test_slugify_title() {
        assert_eq!(slugify_title("Hello World"), "hello-world");
        assert_eq!(slugify_title("Test-Article!"), "test-article");
        assert_eq!(slugify_title("This Week in Rust 600"), "this-week-in-rust-600");
    }

    #[test]
    fn test_plain_text_excerpt_strips_markup() {
        let html = "<p>Rust <b>1.90</b> is out.</p>\n\n<p>Upgrade   today.</p>";
        assert_eq!(plain_text_excerpt(html, 200), "Rust 1.90 is out. Upgrade today.");
    }

    #[test]
    fn test_plain_text_excerpt_truncates() {
        let excerpt = plain_text_excerpt("one two three four", 7);
        assert_eq!(excerpt, "one two…");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out");
        ensure_writable_dir(&target).await.unwrap();
        assert!(target.is_dir());
        assert!(!target.join("..__probe_write__").exists());
    }
}
