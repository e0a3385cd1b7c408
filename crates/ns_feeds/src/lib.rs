pub mod fetcher;
pub mod parse;

pub use fetcher::{FeedFetcher, FeedTransport, HttpTransport};
pub use parse::parse_feed;

pub mod prelude {
    pub use super::fetcher::{FeedFetcher, FeedTransport};
    pub use ns_core::{Article, FeedConfig, FeedFailurePolicy, Result, Error};
}
