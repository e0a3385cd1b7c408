use async_trait::async_trait;
use ns_core::{Config, Error, Result, Worksheet};
use ns_feeds::FeedFetcher;
use ns_sheets::{save_articles, WriteOutcome, WriteReport};
use tracing::{error, info, warn};

/// Stages of a single run. `Failed` is reachable from either active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Fetching,
    Writing,
    Done,
    Failed,
}

/// Opens the destination worksheet once fetching is over.
#[async_trait]
pub trait SheetConnector: Send + Sync {
    async fn connect(&self, config: &Config) -> Result<Box<dyn Worksheet>>;
}

pub struct GoogleConnector;

#[async_trait]
impl SheetConnector for GoogleConnector {
    async fn connect(&self, config: &Config) -> Result<Box<dyn Worksheet>> {
        let sheet = ns_sheets::connect(config).await?;
        Ok(Box::new(sheet))
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub state: RunState,
    pub fetched: usize,
    pub report: Option<WriteReport>,
    pub error: Option<Error>,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    fetcher: FeedFetcher,
    connector: Box<dyn SheetConnector>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, fetcher: FeedFetcher, connector: Box<dyn SheetConnector>) -> Self {
        Self {
            config,
            fetcher,
            connector,
        }
    }

    /// Runs fetch then write. Errors end the run in [`RunState::Failed`] and
    /// are returned in the outcome rather than propagated.
    pub async fn run(&self) -> RunOutcome {
        let mut outcome = RunOutcome {
            state: RunState::Fetching,
            fetched: 0,
            report: None,
            error: None,
        };

        let articles = match self.fetcher.fetch_all(self.config.feeds()).await {
            Ok(articles) => articles,
            Err(e) => return fail(outcome, e),
        };
        outcome.fetched = articles.len();
        info!("✅ Fetched News Articles:");
        for article in &articles {
            info!("🔹 {}", article.title);
        }

        outcome.state = RunState::Writing;
        let sheet = match self.connector.connect(self.config).await {
            Ok(sheet) => sheet,
            Err(e) => return fail(outcome, e),
        };

        let result = save_articles(sheet.as_ref(), &articles, |article, status| match status {
            WriteOutcome::Written => info!("✅ Written: {}", article.title),
            WriteOutcome::Skipped => warn!("⚠️ Skipped (duplicate): {}", article.title),
        })
        .await;

        match result {
            Ok(report) => {
                info!(
                    "🎉 All new news saved successfully! ({} written, {} skipped)",
                    report.written, report.skipped
                );
                outcome.report = Some(report);
                outcome.state = RunState::Done;
                outcome
            }
            Err(e) => fail(outcome, e),
        }
    }
}

fn fail(mut outcome: RunOutcome, e: Error) -> RunOutcome {
    error!("❌ Error: {} (kind: {:?}, while {:?})", e, e.kind(), outcome.state);
    outcome.state = RunState::Failed;
    outcome.error = Some(e);
    outcome
}
