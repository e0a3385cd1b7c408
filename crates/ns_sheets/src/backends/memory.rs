use async_trait::async_trait;
use ns_core::{Error, Result, Worksheet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Worksheet held in memory. Rows are stored as written; reads trim
/// trailing empty cells the way the remote API does.
#[derive(Clone)]
pub struct MemoryWorksheet {
    title: String,
    rows: Arc<RwLock<Vec<Vec<String>>>>,
    append_limit: Option<usize>,
    appended: Arc<RwLock<usize>>,
}

impl MemoryWorksheet {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Arc::new(RwLock::new(Vec::new())),
            append_limit: None,
            appended: Arc::new(RwLock::new(0)),
        }
    }

    pub fn with_rows(self, rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
            ..self
        }
    }

    /// Fails every append after `limit` successful ones.
    pub fn with_append_limit(mut self, limit: usize) -> Self {
        self.append_limit = Some(limit);
        self
    }

    pub async fn rows(&self) -> Vec<Vec<String>> {
        self.rows.read().await.clone()
    }

    /// Number of successful `append_row` calls.
    pub async fn append_count(&self) -> usize {
        *self.appended.read().await
    }
}

fn trim_trailing(mut values: Vec<String>) -> Vec<String> {
    while values.last().is_some_and(|v| v.is_empty()) {
        values.pop();
    }
    values
}

#[async_trait]
impl Worksheet for MemoryWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    async fn col_values(&self, col: usize) -> Result<Vec<String>> {
        if col == 0 {
            return Err(Error::Access("Column index is 1-based".to_string()));
        }
        let rows = self.rows.read().await;
        let values = rows
            .iter()
            .map(|row| row.get(col - 1).cloned().unwrap_or_default())
            .collect();
        Ok(trim_trailing(values))
    }

    async fn row_values(&self, row: usize) -> Result<Vec<String>> {
        if row == 0 {
            return Err(Error::Access("Row index is 1-based".to_string()));
        }
        let rows = self.rows.read().await;
        Ok(trim_trailing(rows.get(row - 1).cloned().unwrap_or_default()))
    }

    async fn append_row(&self, values: &[String]) -> Result<()> {
        let mut appended = self.appended.write().await;
        if self.append_limit.is_some_and(|limit| *appended >= limit) {
            return Err(Error::Access(format!(
                "Append quota exceeded for {}",
                self.title
            )));
        }
        // Appends land after the last row that holds any value.
        let mut rows = self.rows.write().await;
        while rows.last().is_some_and(|r| r.iter().all(|v| v.is_empty())) {
            rows.pop();
        }
        rows.push(values.to_vec());
        *appended += 1;
        Ok(())
    }
}
