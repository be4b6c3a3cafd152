//! Grouping of feed entries by source and scoring of each group.
//!
//! Entries are considered in feed order and capped at `max_analyze` before
//! anything is sent to the model, which bounds the number of calls per run.
//! Each source title becomes one group anchored at its first entry; the
//! group's later entries only contribute their summary text. The model is
//! asked once per group and its answer, when usable, is attached to the
//! anchor.
//!
//! A model answer that is empty, not JSON, or JSON without a usable `score`
//! is not an error: the group simply drops out of the digest.

use crate::api::AskAsync;
use crate::models::{Evaluation, FeedItem};
use crate::utils::truncate_for_log;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Why a group ended up without an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Unscored {
    /// The model answered with nothing but whitespace.
    EmptyResponse,
    /// The call to the model failed.
    ServiceError(String),
    /// The answer was not valid JSON once fences were removed.
    MalformedJson(String),
    /// Valid JSON, but no numeric non-zero `score`.
    MissingScore,
}

impl fmt::Display for Unscored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unscored::EmptyResponse => f.write_str("empty response"),
            Unscored::ServiceError(e) => write!(f, "service error: {e}"),
            Unscored::MalformedJson(e) => write!(f, "malformed JSON: {e}"),
            Unscored::MissingScore => f.write_str("no usable score"),
        }
    }
}

/// Result of scoring one source group.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Scored(Evaluation),
    Unscored(Unscored),
}

/// Entries of one source, as sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceGroup {
    /// Source title shared by every entry of the group.
    pub source: String,
    /// Index of the first entry with this title; receives the evaluation.
    pub anchor: usize,
    /// Summary of the anchor followed by the summaries of later entries.
    pub summaries: Vec<String>,
}

impl SourceGroup {
    /// Text sent to the scoring model for this group.
    pub fn payload(&self) -> String {
        let mut payload = format!("Source: {}\n", self.source);
        for (i, summary) in self.summaries.iter().enumerate() {
            payload.push_str(&format!("\n[{}]\n{}\n", i + 1, summary.trim()));
        }
        payload
    }
}

/// Remove a Markdown code fence around a model answer.
///
/// A leading "```json" (or bare "```") and a trailing "```" are each stripped
/// when present, independently of one another. Surrounding whitespace is
/// ignored.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text)
}

/// Interpret a raw model answer.
pub fn parse_evaluation(response: &str) -> ScoreOutcome {
    if response.trim().is_empty() {
        return ScoreOutcome::Unscored(Unscored::EmptyResponse);
    }

    match serde_json::from_str::<Value>(strip_code_fence(response)) {
        Ok(Value::Object(fields)) => match Evaluation::try_from(fields) {
            Ok(evaluation) => ScoreOutcome::Scored(evaluation),
            Err(_) => ScoreOutcome::Unscored(Unscored::MissingScore),
        },
        Ok(_) => ScoreOutcome::Unscored(Unscored::MissingScore),
        Err(e) => ScoreOutcome::Unscored(Unscored::MalformedJson(e.to_string())),
    }
}

/// Group the first `max_analyze` entries by source title.
///
/// Entries with an empty summary are skipped. Groups come out in the order
/// their titles were first seen.
pub fn group_by_source(items: &[FeedItem], max_analyze: usize) -> Vec<SourceGroup> {
    let mut groups: Vec<SourceGroup> = Vec::new();
    let mut by_source: HashMap<&str, usize> = HashMap::new();

    for (index, item) in items.iter().enumerate().take(max_analyze) {
        if item.summary.trim().is_empty() {
            debug!(link = %item.link, "Skipping entry without summary");
            continue;
        }
        match by_source.get(item.source.as_str()) {
            Some(&group) => groups[group].summaries.push(item.summary.clone()),
            None => {
                by_source.insert(item.source.as_str(), groups.len());
                groups.push(SourceGroup {
                    source: item.source.clone(),
                    anchor: index,
                    summaries: vec![item.summary.clone()],
                });
            }
        }
    }

    groups
}

/// Score one group. Failures of the model call become [`Unscored::ServiceError`].
pub async fn score_group<A>(group: &SourceGroup, scorer: &A) -> ScoreOutcome
where
    A: AskAsync<Response = String>,
{
    match scorer.ask(&group.payload()).await {
        Ok(response) => {
            let outcome = parse_evaluation(&response);
            if let ScoreOutcome::Unscored(Unscored::MalformedJson(_) | Unscored::MissingScore) =
                &outcome
            {
                debug!(response_preview = %truncate_for_log(&response, 300), "Unusable model answer");
            }
            outcome
        }
        Err(e) => ScoreOutcome::Unscored(Unscored::ServiceError(e.to_string())),
    }
}

/// Score every source group, one model call at a time.
///
/// The evaluation is attached in place to each group's anchor in `items`;
/// the scored anchors are returned in group order.
#[instrument(level = "info", skip_all, fields(items = items.len(), max_analyze = max_analyze))]
pub async fn score_sources<A>(items: &mut [FeedItem], max_analyze: usize, scorer: &A) -> Vec<FeedItem>
where
    A: AskAsync<Response = String>,
{
    let groups = group_by_source(items, max_analyze);
    info!(groups = groups.len(), "Scoring source groups");

    let mut scored = Vec::with_capacity(groups.len());
    for group in &groups {
        match score_group(group, scorer).await {
            ScoreOutcome::Scored(evaluation) => {
                info!(source = %group.source, score = evaluation.score(), "Source scored");
                let anchor = &mut items[group.anchor];
                anchor.evaluation = Some(evaluation);
                scored.push(anchor.clone());
            }
            ScoreOutcome::Unscored(reason) => {
                warn!(source = %group.source, %reason, "Source dropped without evaluation");
            }
        }
    }

    info!(
        groups = groups.len(),
        scored = scored.len(),
        dropped = groups.len() - scored.len(),
        "Finished scoring"
    );
    scored
}
