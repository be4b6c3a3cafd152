//! Command-line interface definitions for RSS Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also be provided through an environment variable, which is
//! how the cache toggle and the digest size are normally set.

use clap::Parser;

/// Command-line arguments for the RSS Digest application.
///
/// # Examples
///
/// ```sh
/// # Fetch the feeds listed under ./resources and write ./digest/<date>.md
/// rss_digest
///
/// # Reuse today's snapshot and publish the top 5
/// RSS_CACHE_ENABLE=true MAX_ARTICLE_NUMS=5 rss_digest -m ./site/digest
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the feed source YAML files
    #[arg(short, long, env = "RSS_RESOURCE", default_value = "resources")]
    pub rss_resource: String,

    /// Directory for the daily article snapshots
    #[arg(long, env = "RSS_CACHE_DIR", default_value = "draft")]
    pub cache_dir: String,

    /// Set to exactly `true` to read and write today's article snapshot
    #[arg(long, env = "RSS_CACHE_ENABLE")]
    pub cache_enable: Option<String>,

    /// Output directory for the Markdown digest
    #[arg(short, long, env = "DIGEST_OUTPUT_DIR", default_value = "digest")]
    pub markdown_output_dir: String,

    /// Optional path to the model config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Name of the chat template used to score a source
    #[arg(long, env = "SCORING_TEMPLATE", default_value = "rss_scorer")]
    pub template: String,

    /// Maximum number of parsed entries considered for scoring
    #[arg(long, env = "MAX_ANALYZE_NUMS", default_value_t = 20)]
    pub max_analyze: usize,

    /// Maximum number of entries in the digest
    #[arg(long, env = "MAX_ARTICLE_NUMS", default_value_t = 12)]
    pub max_article_nums: usize,

    /// Retries for a failed scoring call (0 disables retrying)
    #[arg(long, env = "SCORE_RETRIES", default_value_t = 0)]
    pub score_retries: usize,

    /// Abort the run when any feed fails instead of skipping it
    #[arg(long)]
    pub strict_feeds: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Default value and environment variable declared for an argument.
    /// Read from the command definition so exported variables in the test
    /// environment cannot change the outcome.
    fn declared(id: &str) -> (Option<String>, Option<String>) {
        let mut command = Cli::command();
        command.build();
        let arg = command
            .get_arguments()
            .find(|a| a.get_id().as_str() == id)
            .unwrap_or_else(|| panic!("no argument {id}"));
        let default = arg
            .get_default_values()
            .first()
            .map(|v| v.to_string_lossy().into_owned());
        let env = arg.get_env().map(|v| v.to_string_lossy().into_owned());
        (default, env)
    }

    fn expect(default: Option<&str>, env: Option<&str>) -> (Option<String>, Option<String>) {
        (default.map(str::to_string), env.map(str::to_string))
    }

    #[test]
    fn test_cli_defaults() {
        assert_eq!(declared("rss_resource"), expect(Some("resources"), Some("RSS_RESOURCE")));
        assert_eq!(declared("cache_dir"), expect(Some("draft"), Some("RSS_CACHE_DIR")));
        assert_eq!(declared("cache_enable"), expect(None, Some("RSS_CACHE_ENABLE")));
        assert_eq!(
            declared("markdown_output_dir"),
            expect(Some("digest"), Some("DIGEST_OUTPUT_DIR"))
        );
        assert_eq!(declared("template"), expect(Some("rss_scorer"), Some("SCORING_TEMPLATE")));
        assert_eq!(declared("max_analyze"), expect(Some("20"), Some("MAX_ANALYZE_NUMS")));
        assert_eq!(declared("max_article_nums"), expect(Some("12"), Some("MAX_ARTICLE_NUMS")));
        assert_eq!(declared("score_retries"), expect(Some("0"), Some("SCORE_RETRIES")));
        assert_eq!(declared("strict_feeds"), expect(Some("false"), None));
        assert_eq!(declared("config"), expect(None, None));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "rss_digest",
            "-r",
            "/etc/feeds",
            "-m",
            "/tmp/digest",
            "--cache-enable",
            "true",
            "--max-article-nums",
            "5",
            "--strict-feeds",
        ]);

        assert_eq!(cli.rss_resource, "/etc/feeds");
        assert_eq!(cli.markdown_output_dir, "/tmp/digest");
        assert_eq!(cli.cache_enable.as_deref(), Some("true"));
        assert_eq!(cli.max_article_nums, 5);
        assert!(cli.strict_feeds);
    }

    #[test]
    fn test_cli_rejects_non_numeric_limit() {
        let res = Cli::try_parse_from(["rss_digest", "--max-article-nums", "twelve"]);
        assert!(res.is_err());
    }
}
