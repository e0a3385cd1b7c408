//! Appends fetched articles whose titles are not yet in the worksheet.
//!
//! The stored titles are read once, before any write. Articles from the same
//! run are not checked against each other, and two concurrent runs can both
//! append the same article.

use std::collections::HashSet;
use ns_core::{Article, Error, Result, Worksheet, HEADER, TITLE_COLUMN};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub header_written: bool,
    pub written: usize,
    pub skipped: usize,
}

/// Ensures the header row exists, then appends every article whose title is
/// absent from the pre-existing title column, in order, one append per row.
///
/// A failed append stops the run; rows appended before it stay written.
pub async fn save_articles<F>(
    sheet: &dyn Worksheet,
    articles: &[Article],
    mut on_outcome: F,
) -> Result<WriteReport>
where
    F: FnMut(&Article, WriteOutcome),
{
    info!("📝 Checking existing news to avoid duplicates...");
    let existing: HashSet<String> = sheet.col_values(TITLE_COLUMN).await?.into_iter().collect();
    debug!("{} existing titles in {}", existing.len(), sheet.title());

    info!("📝 Writing fetched news to {}...", sheet.title());
    let mut report = WriteReport::default();

    let first_row = sheet.row_values(1).await?;
    if first_row.is_empty() {
        let header: Vec<String> = HEADER.iter().map(|h| h.to_string()).collect();
        sheet.append_row(&header).await.map_err(|e| Error::Append {
            title: "<header>".to_string(),
            message: e.to_string(),
        })?;
        report.header_written = true;
        debug!("Header row written");
    }

    for article in articles {
        if existing.contains(&article.title) {
            report.skipped += 1;
            on_outcome(article, WriteOutcome::Skipped);
            continue;
        }

        sheet
            .append_row(&article.to_row())
            .await
            .map_err(|e| Error::Append {
                title: article.title.clone(),
                message: e.to_string(),
            })?;
        report.written += 1;
        on_outcome(article, WriteOutcome::Written);
    }

    Ok(report)
}
