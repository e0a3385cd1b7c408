pub mod backends;
pub mod credentials;
pub mod writer;

pub use backends::*;
pub use credentials::{CredentialBootstrap, ServiceAccountKey};
pub use writer::{save_articles, WriteOutcome, WriteReport};

use ns_core::{Config, Result};

/// Materializes credentials, authenticates and opens the first worksheet of
/// the configured spreadsheet.
pub async fn connect(config: &Config) -> Result<GoogleWorksheet> {
    tracing::info!("📡 Connecting to Google Sheets...");
    let key = CredentialBootstrap::from_env(config).load()?;
    let client = GoogleSheetsClient::authorize(&key).await?;
    tracing::info!("✅ Connected successfully!");
    client.open(config.sheet_name()).await
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::writer::{save_articles, WriteOutcome, WriteReport};
    pub use ns_core::Worksheet;
}
