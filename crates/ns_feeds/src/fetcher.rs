use async_trait::async_trait;
use ns_core::{Article, Config, Error, FeedConfig, FeedFailurePolicy, Result};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::parse::parse_feed;

/// Retrieves raw feed documents.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Plain HTTP(S) GET without retries or timeouts.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                feed: url.to_string(),
                message: format!("HTTP error: {}", status),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

pub struct FeedFetcher {
    transport: Box<dyn FeedTransport>,
    policy: FeedFailurePolicy,
}

impl FeedFetcher {
    pub fn new(transport: Box<dyn FeedTransport>, policy: FeedFailurePolicy) -> Self {
        Self { transport, policy }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(config.user_agent())?;
        Ok(Self::new(Box::new(transport), config.failure_policy()))
    }

    /// Fetches and parses one feed. Transport errors are reported against
    /// the feed's display name.
    pub async fn fetch_feed(&self, feed: &FeedConfig) -> Result<Vec<Article>> {
        info!("📡 Fetching news from: {}", feed.url);
        let bytes = self.transport.get(&feed.url).await.map_err(|e| match e {
            Error::Fetch { message, .. } => Error::Fetch {
                feed: feed.name.clone(),
                message,
            },
            other => Error::Fetch {
                feed: feed.name.clone(),
                message: other.to_string(),
            },
        })?;
        debug!("Received {} bytes from {}", bytes.len(), feed.name);

        let articles = parse_feed(&feed.name, &bytes)?;
        debug!("Parsed {} entries from {}", articles.len(), feed.name);
        Ok(articles)
    }

    /// Fetches every feed in order. Records keep feed order, then entry
    /// order within each feed.
    pub async fn fetch_all(&self, feeds: &[FeedConfig]) -> Result<Vec<Article>> {
        let mut articles = Vec::new();

        for feed in feeds {
            match self.fetch_feed(feed).await {
                Ok(items) => {
                    info!("📰 {} entries from {}", items.len(), feed.name);
                    articles.extend(items);
                }
                Err(e) => match self.policy {
                    FeedFailurePolicy::Skip => {
                        warn!("⚠️ Skipping {}: {}", feed.name, e);
                    }
                    FeedFailurePolicy::Abort => return Err(e),
                },
            }
        }

        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Serves canned bodies by URL and records the order of requests.
    struct StaticTransport {
        bodies: HashMap<String, std::result::Result<Vec<u8>, String>>,
        requested: Arc<Mutex<Vec<String>>>,
    }

    impl StaticTransport {
        fn new() -> Self {
            Self {
                bodies: HashMap::new(),
                requested: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn with_body(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), Ok(body.as_bytes().to_vec()));
            self
        }

        fn with_error(mut self, url: &str) -> Self {
            self.bodies
                .insert(url.to_string(), Err("connection refused".to_string()));
            self
        }
    }

    #[async_trait]
    impl FeedTransport for StaticTransport {
        async fn get(&self, url: &Url) -> Result<Vec<u8>> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.bodies.get(url.as_str()) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(message)) => Err(Error::Fetch {
                    feed: url.to_string(),
                    message: message.clone(),
                }),
                None => Err(Error::Fetch {
                    feed: url.to_string(),
                    message: "HTTP error: 404 Not Found".to_string(),
                }),
            }
        }
    }

    fn rss(titles: &[&str]) -> String {
        let items: String = titles
            .iter()
            .map(|t| format!("<item><title>{}</title></item>", t))
            .collect();
        format!(
            r#"<rss version="2.0"><channel><title>t</title><link>l</link><description>d</description>{}</channel></rss>"#,
            items
        )
    }

    fn feeds() -> Vec<FeedConfig> {
        vec![
            FeedConfig::new("First", "https://first.example.com/rss").unwrap(),
            FeedConfig::new("Second", "https://second.example.com/rss").unwrap(),
        ]
    }

    fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_feed_then_entry_order() {
        let transport = StaticTransport::new()
            .with_body("https://first.example.com/rss", &rss(&["b", "a"]))
            .with_body("https://second.example.com/rss", &rss(&["c"]));
        let requested = transport.requested.clone();
        let fetcher = FeedFetcher::new(Box::new(transport), FeedFailurePolicy::Skip);

        let articles = fetcher.fetch_all(&feeds()).await.unwrap();
        assert_eq!(titles(&articles), vec!["b", "a", "c"]);
        assert_eq!(articles[0].source, "First");
        assert_eq!(articles[2].source, "Second");
        assert_eq!(
            *requested.lock().unwrap(),
            vec!["https://first.example.com/rss", "https://second.example.com/rss"]
        );
    }

    #[tokio::test]
    async fn test_skip_policy_continues_after_failure() {
        let transport = StaticTransport::new()
            .with_error("https://first.example.com/rss")
            .with_body("https://second.example.com/rss", &rss(&["c"]));
        let fetcher = FeedFetcher::new(Box::new(transport), FeedFailurePolicy::Skip);

        let articles = fetcher.fetch_all(&feeds()).await.unwrap();
        assert_eq!(titles(&articles), vec!["c"]);
    }

    #[tokio::test]
    async fn test_skip_policy_treats_malformed_feed_as_empty() {
        let transport = StaticTransport::new()
            .with_body("https://first.example.com/rss", "<html>maintenance</html>")
            .with_body("https://second.example.com/rss", &rss(&["c"]));
        let fetcher = FeedFetcher::new(Box::new(transport), FeedFailurePolicy::Skip);

        let articles = fetcher.fetch_all(&feeds()).await.unwrap();
        assert_eq!(titles(&articles), vec!["c"]);
    }

    #[tokio::test]
    async fn test_abort_policy_stops_at_first_failure() {
        let transport = StaticTransport::new()
            .with_error("https://first.example.com/rss")
            .with_body("https://second.example.com/rss", &rss(&["c"]));
        let requested = transport.requested.clone();
        let fetcher = FeedFetcher::new(Box::new(transport), FeedFailurePolicy::Abort);

        let err = fetcher.fetch_all(&feeds()).await.unwrap_err();
        match err {
            Error::Fetch { feed, message } => {
                assert_eq!(feed, "First");
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_abort_policy_reports_parse_errors() {
        let transport = StaticTransport::new()
            .with_body("https://first.example.com/rss", "not xml at all");
        let fetcher = FeedFetcher::new(Box::new(transport), FeedFailurePolicy::Abort);

        let err = fetcher.fetch_all(&feeds()[..1]).await.unwrap_err();
        assert!(matches!(err, Error::Parse { ref feed, .. } if feed == "First"));
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new("newsheet-test/0.1").is_ok());
    }
}
