//! Run configuration, resolved once at startup and passed to every stage.

use crate::cli::Cli;
use awful_aj::config_dir;
use std::error::Error;
use std::path::PathBuf;

/// What the feed loader does when one feed cannot be fetched or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFailurePolicy {
    /// Log the failure, count it and continue with the remaining feeds.
    Skip,
    /// Propagate the first failure and abort the run.
    Abort,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub cache_enabled: bool,
    pub cache_dir: PathBuf,
    pub rss_resource: PathBuf,
    pub markdown_output_dir: PathBuf,
    pub max_analyze: usize,
    pub max_article_nums: usize,
    pub score_retries: usize,
    pub feed_failure_policy: FeedFailurePolicy,
}

impl From<&Cli> for RunConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            cache_enabled: cli.cache_enable.as_deref() == Some("true"),
            cache_dir: PathBuf::from(&cli.cache_dir),
            rss_resource: PathBuf::from(&cli.rss_resource),
            markdown_output_dir: PathBuf::from(&cli.markdown_output_dir),
            max_analyze: cli.max_analyze,
            max_article_nums: cli.max_article_nums,
            score_retries: cli.score_retries,
            feed_failure_policy: if cli.strict_feeds {
                FeedFailurePolicy::Abort
            } else {
                FeedFailurePolicy::Skip
            },
        }
    }
}

/// Location of the model's `config.yaml`: the explicit path when given,
/// otherwise the default file in the `awful_aj` config directory.
pub fn model_config_path(explicit: Option<&str>) -> Result<PathBuf, Box<dyn Error>> {
    match explicit {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(config_dir()?.join("config.yaml")),
    }
}
