pub mod config;
pub mod error;
pub mod storage;
pub mod types;

pub use config::{Config, FeedConfig, FeedFailurePolicy};
pub use error::{Error, ErrorKind};
pub use storage::Worksheet;
pub use types::{Article, ArticleBuilder, HEADER, NOT_AVAILABLE, TITLE_COLUMN};

pub type Result<T> = std::result::Result<T, Error>;
