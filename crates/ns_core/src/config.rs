use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;
use crate::{Error, Result};

pub const DEFAULT_SHEET_NAME: &str = "Translated_News";
pub const DEFAULT_CREDENTIALS_FILE: &str = "google_sheets_credentials.json";
pub const DEFAULT_AUTOMATION_ENV_VAR: &str = "GITHUB_ACTIONS";
pub const DEFAULT_CREDENTIALS_ENV_VAR: &str = "GOOGLE_SHEETS_CREDENTIALS";
pub const DEFAULT_USER_AGENT: &str = concat!("newsheet/", env!("CARGO_PKG_VERSION"));

const DEFAULT_FEEDS: &[(&str, &str)] = &[
    ("GB News", "https://www.gbnews.com/feeds/news.rss"),
    (
        "Manchester Evening News",
        "https://www.manchestereveningnews.co.uk/news/?service=rss",
    ),
];

/// A named feed endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub name: String,
    pub url: Url,
}

impl FeedConfig {
    pub fn new(name: &str, url: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Config(format!("Feed name is empty for URL: {}", url)));
        }
        let url = Url::parse(url.trim())
            .map_err(|e| Error::Config(format!("Invalid feed URL {}: {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!("Unsupported feed URL scheme: {}", url)));
        }
        Ok(Self {
            name: name.to_string(),
            url,
        })
    }

    pub fn defaults() -> Vec<FeedConfig> {
        DEFAULT_FEEDS
            .iter()
            .filter_map(|(name, url)| FeedConfig::new(name, url).ok())
            .collect()
    }
}

/// Parses `NAME=URL`.
impl FromStr for FeedConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, url) = s
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("Expected NAME=URL, got: {}", s)))?;
        FeedConfig::new(name, url)
    }
}

/// What to do when a single feed cannot be fetched or parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedFailurePolicy {
    /// Log the failure and carry on with the remaining feeds
    #[default]
    Skip,
    /// Stop the fetch phase with the first failure
    Abort,
}

impl FromStr for FeedFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(Error::Config(format!(
                "Unknown feed failure policy: {} (expected skip or abort)",
                other
            ))),
        }
    }
}

impl fmt::Display for FeedFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::Abort => f.write_str("abort"),
        }
    }
}

/// Run configuration. Built once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    feeds: Vec<FeedConfig>,
    sheet_name: String,
    credentials_path: PathBuf,
    automation_env_var: String,
    credentials_env_var: String,
    failure_policy: FeedFailurePolicy,
    user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: FeedConfig::defaults(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            automation_env_var: DEFAULT_AUTOMATION_ENV_VAR.to_string(),
            credentials_env_var: DEFAULT_CREDENTIALS_ENV_VAR.to_string(),
            failure_policy: FeedFailurePolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    pub fn with_feeds(mut self, feeds: Vec<FeedConfig>) -> Self {
        self.feeds = feeds;
        self
    }

    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = sheet_name.into();
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    pub fn with_automation_env_var(mut self, name: impl Into<String>) -> Self {
        self.automation_env_var = name.into();
        self
    }

    pub fn with_credentials_env_var(mut self, name: impl Into<String>) -> Self {
        self.credentials_env_var = name.into();
        self
    }

    pub fn with_failure_policy(mut self, policy: FeedFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Rejects configurations that could never complete a run.
    pub fn validate(self) -> Result<Self> {
        if self.feeds.is_empty() {
            return Err(Error::Config("No feeds configured".to_string()));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(Error::Config("Spreadsheet name is empty".to_string()));
        }
        if self.credentials_path.as_os_str().is_empty() {
            return Err(Error::Config("Credentials path is empty".to_string()));
        }
        Ok(self)
    }

    pub fn feeds(&self) -> &[FeedConfig] {
        &self.feeds
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    pub fn automation_env_var(&self) -> &str {
        &self.automation_env_var
    }

    pub fn credentials_env_var(&self) -> &str {
        &self.credentials_env_var
    }

    pub fn failure_policy(&self) -> FeedFailurePolicy {
        self.failure_policy
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default().validate().unwrap();
        assert_eq!(config.feeds().len(), 2);
        assert_eq!(config.feeds()[0].name, "GB News");
        assert_eq!(config.feeds()[1].name, "Manchester Evening News");
        assert_eq!(config.sheet_name(), "Translated_News");
        assert_eq!(
            config.credentials_path(),
            Path::new("google_sheets_credentials.json")
        );
        assert_eq!(config.automation_env_var(), "GITHUB_ACTIONS");
        assert_eq!(config.credentials_env_var(), "GOOGLE_SHEETS_CREDENTIALS");
        assert_eq!(config.failure_policy(), FeedFailurePolicy::Skip);
    }

    #[test]
    fn test_parse_feed_arg() {
        let feed: FeedConfig = "BBC=https://feeds.bbci.co.uk/news/rss.xml".parse().unwrap();
        assert_eq!(feed.name, "BBC");
        assert_eq!(feed.url.as_str(), "https://feeds.bbci.co.uk/news/rss.xml");

        // Only the first '=' separates the name.
        let feed: FeedConfig = "MEN=https://example.com/news/?service=rss".parse().unwrap();
        assert_eq!(feed.url.query(), Some("service=rss"));

        assert!("no-separator".parse::<FeedConfig>().is_err());
        assert!("=https://example.com".parse::<FeedConfig>().is_err());
        assert!("Bad=not a url".parse::<FeedConfig>().is_err());
        assert!("Ftp=ftp://example.com/feed".parse::<FeedConfig>().is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("skip".parse::<FeedFailurePolicy>().unwrap(), FeedFailurePolicy::Skip);
        assert_eq!("ABORT".parse::<FeedFailurePolicy>().unwrap(), FeedFailurePolicy::Abort);
        assert!("retry".parse::<FeedFailurePolicy>().is_err());
        assert_eq!(FeedFailurePolicy::Abort.to_string(), "abort");
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(Config::default().with_feeds(vec![]).validate().is_err());
        assert!(Config::default().with_sheet_name("  ").validate().is_err());
        assert!(Config::default().with_credentials_path("").validate().is_err());
    }
}
