//! Markdown rendering of the daily digest.
//!
//! The digest lists the ranked picks first, each with its score and the other
//! fields the model returned, followed by an appendix with every entry parsed
//! during the run, grouped by source.

use crate::models::{Digest, FeedItem};
use crate::utils::{plain_text_excerpt, slugify_title};
use itertools::Itertools;
use serde_json::Value;
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const EXCERPT_CHARS: usize = 400;

/// File name of the digest for `digest.date`.
pub fn digest_file_name(digest: &Digest) -> String {
    format!("{}.md", digest.date.format("%Y-%m-%d"))
}

/// Scores are shown without a fractional part when they have none.
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < 1e15 {
        format!("{score:.0}")
    } else {
        format!("{score}")
    }
}

/// Scalar or list value of an evaluation field as inline text.
fn format_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(values) => {
            let joined = values.iter().filter_map(format_field).join(", ");
            Some(joined).filter(|s| !s.is_empty())
        }
        _ => None,
    }
}

fn write_pick(md: &mut String, rank: usize, item: &FeedItem) {
    writeln!(md, "## {}. [{}]({})\n", rank, item.display_title(), item.link).unwrap();

    let mut meta = vec![format!("*Source:* {}", item.source)];
    if !item.date.is_empty() {
        meta.push(format!("*Published:* {}", item.date));
    }
    if let Some(score) = item.score() {
        meta.push(format!("*Score:* {}", format_score(score)));
    }
    writeln!(md, "{}\n", meta.join(" · ")).unwrap();

    if let Some(evaluation) = &item.evaluation {
        let mut wrote_fields = false;
        for (key, value) in evaluation.fields() {
            if key == "score" {
                continue;
            }
            if let Some(text) = format_field(value) {
                writeln!(md, "- **{}**: {}", key, text).unwrap();
                wrote_fields = true;
            }
        }
        if wrote_fields {
            md.push('\n');
        }
    }

    let excerpt = plain_text_excerpt(&item.summary, EXCERPT_CHARS);
    if !excerpt.is_empty() {
        writeln!(md, "> {}\n", excerpt).unwrap();
    }
}

/// Render the digest and the full list of parsed entries as Markdown.
pub fn digest_to_markdown(digest: &Digest, all_items: &[FeedItem]) -> String {
    let mut md = String::new();
    let date = digest.date.format("%Y-%m-%d");
    let by_source = all_items.iter().into_group_map_by(|item| item.source.as_str());
    let sources: Vec<&str> = all_items.iter().map(|i| i.source.as_str()).unique().collect();

    writeln!(md, "# Daily Digest {}\n", date).unwrap();
    writeln!(
        md,
        "> {} picks from {} entries across {} sources.\n",
        digest.articles.len(),
        all_items.len(),
        sources.len()
    )
    .unwrap();

    if digest.articles.is_empty() {
        writeln!(md, "*No entry was scored today.*\n").unwrap();
    }
    for (i, item) in digest.articles.iter().enumerate() {
        write_pick(&mut md, i + 1, item);
    }

    if !sources.is_empty() {
        writeln!(md, "---\n\n## All entries\n").unwrap();
        for source in &sources {
            writeln!(md, "- [{}](#{})", source, slugify_title(source)).unwrap();
        }
        md.push('\n');

        for source in sources {
            writeln!(md, "### {}\n", source).unwrap();
            for item in by_source.get(&source).into_iter().flatten() {
                if item.date.is_empty() {
                    writeln!(md, "- [{}]({})", item.display_title(), item.link).unwrap();
                } else {
                    writeln!(md, "- [{}]({}) · {}", item.display_title(), item.link, item.date)
                        .unwrap();
                }
            }
            md.push('\n');
        }
    }

    md
}

/// Write the digest to `{markdown_output_dir}/{YYYY-MM-DD}.md`.
#[instrument(level = "info", skip_all, fields(markdown_output_dir = %markdown_output_dir.display(), picks = digest.articles.len()))]
pub async fn write_digest(
    digest: &Digest,
    all_items: &[FeedItem],
    markdown_output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(markdown_output_dir).await?;
    let path = markdown_output_dir.join(digest_file_name(digest));
    fs::write(&path, digest_to_markdown(digest, all_items)).await?;
    info!(path = %path.display(), "Wrote digest Markdown");
    Ok(path)
}
