mod logging;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::Context;
use clap::Parser;
use ns_core::config::{
    DEFAULT_AUTOMATION_ENV_VAR, DEFAULT_CREDENTIALS_ENV_VAR, DEFAULT_CREDENTIALS_FILE,
    DEFAULT_SHEET_NAME,
};
use ns_core::{Config, FeedConfig, FeedFailurePolicy};
use ns_feeds::FeedFetcher;
use tracing::{debug, error, info};

use crate::logging::init_logging;
use crate::pipeline::{GoogleConnector, Pipeline, RunState};

/// Appends new RSS/Atom entries to a Google spreadsheet, keyed on title.
#[derive(Parser, Debug)]
#[command(name = "newsheet", author, version, about, long_about = None)]
struct Cli {
    /// Feed to fetch as NAME=URL; repeat for several. Replaces the built-in feeds.
    #[arg(long = "feed", value_name = "NAME=URL")]
    feeds: Vec<FeedConfig>,

    /// Title of the destination spreadsheet
    #[arg(long, env = "NEWSHEET_SHEET_NAME", default_value = DEFAULT_SHEET_NAME)]
    sheet_name: String,

    /// Service-account key file, written first when running under automation
    #[arg(long, env = "NEWSHEET_CREDENTIALS_FILE", default_value = DEFAULT_CREDENTIALS_FILE)]
    credentials: PathBuf,

    /// Environment variable whose presence marks an automation (CI) run
    #[arg(long, env = "NEWSHEET_AUTOMATION_ENV", default_value = DEFAULT_AUTOMATION_ENV_VAR)]
    automation_env: String,

    /// Environment variable holding the base64-encoded key under automation
    #[arg(long, env = "NEWSHEET_CREDENTIALS_ENV", default_value = DEFAULT_CREDENTIALS_ENV_VAR)]
    credentials_env: String,

    /// What to do when one feed fails: skip it or abort the run
    #[arg(long, env = "NEWSHEET_ON_FEED_ERROR", default_value = "skip")]
    on_feed_error: FeedFailurePolicy,

    /// Fetch and print articles as JSON lines without touching the spreadsheet
    #[arg(long)]
    dry_run: bool,

    /// Exit with a non-zero status when the run fails
    #[arg(long)]
    strict: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> ns_core::Result<Config> {
        let mut config = Config::default()
            .with_sheet_name(self.sheet_name.clone())
            .with_credentials_path(self.credentials.clone())
            .with_automation_env_var(self.automation_env.clone())
            .with_credentials_env_var(self.credentials_env.clone())
            .with_failure_policy(self.on_feed_error);
        if !self.feeds.is_empty() {
            config = config.with_feeds(self.feeds.clone());
        }
        config.validate()
    }
}

async fn execute(cli: &Cli) -> anyhow::Result<RunState> {
    let config = cli.config().context("Invalid configuration")?;
    let fetcher = FeedFetcher::from_config(&config).context("Failed to build HTTP client")?;

    if cli.dry_run {
        let articles = fetcher.fetch_all(config.feeds()).await?;
        for article in &articles {
            println!("{}", serde_json::to_string(article)?);
        }
        info!("🔍 Dry run: {} articles fetched, spreadsheet untouched", articles.len());
        return Ok(RunState::Done);
    }

    let pipeline = Pipeline::new(&config, fetcher, Box::new(GoogleConnector));
    let outcome = pipeline.run().await;
    debug!(
        "Run finished {:?} after fetching {} articles: {:?}",
        outcome.state, outcome.fetched, outcome.report
    );
    if outcome.error.as_ref().is_some_and(|e| e.is_retryable()) {
        info!("🔁 The failure may clear on the next scheduled run");
    }
    Ok(outcome.state)
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal outside local development.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let state = match execute(&cli).await {
        Ok(state) => state,
        Err(e) => {
            error!("❌ Error: {:#}", e);
            RunState::Failed
        }
    };

    if state == RunState::Failed && cli.strict {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["newsheet"]).unwrap();
        let config = cli.config().unwrap();
        assert_eq!(config.feeds().len(), 2);
        assert_eq!(config.failure_policy(), FeedFailurePolicy::Skip);
        assert!(!cli.strict);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "newsheet",
            "--feed",
            "BBC=https://feeds.bbci.co.uk/news/rss.xml",
            "--feed",
            "Guardian=https://www.theguardian.com/world/rss",
            "--sheet-name",
            "Scratch",
            "--credentials",
            "/tmp/key.json",
            "--on-feed-error",
            "abort",
            "--strict",
        ])
        .unwrap();
        let config = cli.config().unwrap();
        let names: Vec<_> = config.feeds().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["BBC", "Guardian"]);
        assert_eq!(config.sheet_name(), "Scratch");
        assert_eq!(config.credentials_path(), std::path::Path::new("/tmp/key.json"));
        assert_eq!(config.failure_policy(), FeedFailurePolicy::Abort);
        assert!(cli.strict);
    }

    #[test]
    fn test_cli_rejects_bad_feed() {
        assert!(Cli::try_parse_from(["newsheet", "--feed", "not-a-feed"]).is_err());
        assert!(Cli::try_parse_from(["newsheet", "--on-feed-error", "retry"]).is_err());
    }
}
