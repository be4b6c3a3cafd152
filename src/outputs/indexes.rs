//! Index of published digests.
//!
//! `daily_digest.md` lists every digest date, newest first:
//!
//! ```text
//! # Daily Digest Index
//!
//! - [2026-10-16](./2026-10-16.md) (12 picks)
//! - [2026-10-15](./2026-10-15.md) (9 picks)
//! ```
//!
//! Re-running on the same day replaces that day's line instead of adding one.

use crate::models::Digest;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const INDEX_FILE: &str = "daily_digest.md";
const INDEX_HEADER: &str = "# Daily Digest Index";

/// Insert or replace the entry for `digest` in the index text.
pub fn upsert_index_entry(content: &str, digest: &Digest, markdown_filename: &str) -> String {
    let date = digest.date.format("%Y-%m-%d").to_string();
    let entry = format!(
        "- [{}](./{}) ({} picks)",
        date,
        markdown_filename,
        digest.articles.len()
    );
    let date_prefix = format!("- [{}]", date);

    let mut lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
    if !lines.iter().any(|l| l.starts_with(INDEX_HEADER)) {
        lines.insert(0, INDEX_HEADER.to_string());
        lines.insert(1, String::new());
    }

    if let Some(pos) = lines.iter().position(|l| l.starts_with(&date_prefix)) {
        lines[pos] = entry;
    } else {
        // Entries are kept newest first; ISO dates sort lexicographically.
        let insert_at = lines
            .iter()
            .position(|l| l.starts_with("- [") && l.as_str() < date_prefix.as_str())
            .or_else(|| lines.iter().rposition(|l| l.starts_with("- [")).map(|p| p + 1))
            .unwrap_or(lines.len());
        lines.insert(insert_at, entry);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Update `{markdown_output_dir}/daily_digest.md` for `digest`.
#[instrument(level = "info", skip_all, fields(markdown_output_dir = %markdown_output_dir.display(), date = %digest.date, file = %markdown_filename))]
pub async fn update_digest_index(
    markdown_output_dir: &Path,
    digest: &Digest,
    markdown_filename: &str,
) -> Result<(), Box<dyn Error>> {
    let index_path = markdown_output_dir.join(INDEX_FILE);
    let content = if index_path.exists() {
        fs::read_to_string(&index_path).await?
    } else {
        String::new()
    };

    fs::write(&index_path, upsert_index_entry(&content, digest, markdown_filename)).await?;
    info!(path = %index_path.display(), "Updated digest index");
    Ok(())
}
