//! Data models for feed entries, model evaluations and the daily digest.
//!
//! - [`FeedItem`]: one parsed feed entry, as fetched or decoded from the daily cache
//! - [`Evaluation`]: the JSON object the scoring model returned for a source
//! - [`Digest`]: the ranked picks for a single day
//!
//! `FeedItem` serializes every attribute, including an attached evaluation, so
//! that a cache snapshot decodes back into identical values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single entry parsed from a feed source.
///
/// # Fields
///
/// * `date` - Publication date exactly as the feed published it
/// * `link` - Entry URL
/// * `source` - Title of the feed source; the grouping key for scoring
/// * `title` - Entry headline
/// * `summary` - Raw summary text (may contain HTML)
/// * `info` - Free-form metadata about the entry and its feed
/// * `evaluation` - Attached once the entry's source group has been scored
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeedItem {
    pub date: String,
    pub link: String,
    pub source: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub info: BTreeMap<String, String>,
    #[serde(default)]
    pub evaluation: Option<Evaluation>,
}

impl FeedItem {
    /// Score of the attached evaluation, if any.
    pub fn score(&self) -> Option<f64> {
        self.evaluation.as_ref().map(Evaluation::score)
    }

    /// Headline to display, falling back to the link for untitled entries.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.link
        } else {
            self.title.trim()
        }
    }
}

/// Scoring model output for one source group.
///
/// Wraps the JSON object verbatim. Construction goes through [`TryFrom`],
/// which rejects objects without a numeric, non-zero `score`; cache files
/// are decoded through the same check.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Evaluation {
    fields: Map<String, Value>,
}

impl Evaluation {
    pub fn score(&self) -> f64 {
        self.fields
            .get("score")
            .and_then(Value::as_f64)
            .unwrap_or_default()
    }

    /// All fields returned by the model, `score` included.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Returned when a JSON object cannot serve as an [`Evaluation`].
#[derive(Debug, Clone, PartialEq)]
pub struct MissingScore;

impl fmt::Display for MissingScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("evaluation has no numeric non-zero `score`")
    }
}

impl std::error::Error for MissingScore {}

impl TryFrom<Map<String, Value>> for Evaluation {
    type Error = MissingScore;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        match fields.get("score").and_then(Value::as_f64) {
            Some(score) if score != 0.0 => Ok(Self { fields }),
            _ => Err(MissingScore),
        }
    }
}

impl From<Evaluation> for Map<String, Value> {
    fn from(evaluation: Evaluation) -> Self {
        evaluation.fields
    }
}

/// The ranked selection published for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    /// Day the digest was produced for.
    pub date: NaiveDate,
    /// Top-ranked items, best first. Every item carries an evaluation.
    pub articles: Vec<FeedItem>,
}

#[cfg(test)]
pub(crate) fn sample_item(source: &str, link: &str, summary: &str) -> FeedItem {
    FeedItem {
        date: "Fri, 16 Oct 2026 08:00:00 GMT".to_string(),
        link: link.to_string(),
        source: source.to_string(),
        title: format!("Entry at {link}"),
        summary: summary.to_string(),
        info: BTreeMap::new(),
        evaluation: None,
    }
}
