use async_trait::async_trait;
use crate::Result;

/// A single tabular destination addressed with list-like row operations.
/// Row and column indices are 1-based.
#[async_trait]
pub trait Worksheet: Send + Sync {
    /// Human-readable name of the worksheet
    fn title(&self) -> &str;

    /// All values in a column, top to bottom, with trailing empties trimmed
    async fn col_values(&self, col: usize) -> Result<Vec<String>>;

    /// All values in a row, left to right, with trailing empties trimmed
    async fn row_values(&self, row: usize) -> Result<Vec<String>>;

    /// Append a row after the last non-empty row
    async fn append_row(&self, values: &[String]) -> Result<()>;
}
