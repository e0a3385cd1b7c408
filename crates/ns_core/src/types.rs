use serde::{Deserialize, Serialize};

/// Marker written in place of any value the feed did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Worksheet header, also the column order of [`Article::to_row`].
pub const HEADER: [&str; 9] = [
    "Source",
    "Title",
    "Link",
    "Summary",
    "Published",
    "ID",
    "Media Content",
    "Media Thumbnail",
    "Authors",
];

/// 1-based index of the "Title" column, the de-duplication key.
pub const TITLE_COLUMN: usize = 2;

/// A normalized feed entry. Every field is always populated; absent values
/// hold [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub source: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: String,
    pub id: String,
    pub media_content: String,
    pub media_thumbnail: String,
    pub authors: String,
}

impl Article {
    pub fn builder(source: impl Into<String>) -> ArticleBuilder {
        ArticleBuilder::new(source)
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.source.clone(),
            self.title.clone(),
            self.link.clone(),
            self.summary.clone(),
            self.published.clone(),
            self.id.clone(),
            self.media_content.clone(),
            self.media_thumbnail.clone(),
            self.authors.clone(),
        ]
    }
}

/// Collects optional feed values and applies the `N/A` fallbacks on
/// [`ArticleBuilder::build`].
#[derive(Debug, Default, Clone)]
pub struct ArticleBuilder {
    source: String,
    title: Option<String>,
    link: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    id: Option<String>,
    media_content: Option<String>,
    media_thumbnail: Option<String>,
    authors: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ArticleBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, value: Option<String>) -> Self {
        self.title = present(value);
        self
    }

    pub fn link(mut self, value: Option<String>) -> Self {
        self.link = present(value);
        self
    }

    pub fn summary(mut self, value: Option<String>) -> Self {
        self.summary = present(value);
        self
    }

    pub fn published(mut self, value: Option<String>) -> Self {
        self.published = present(value);
        self
    }

    pub fn id(mut self, value: Option<String>) -> Self {
        self.id = present(value);
        self
    }

    pub fn media_content(mut self, value: Option<String>) -> Self {
        self.media_content = present(value);
        self
    }

    pub fn media_thumbnail(mut self, value: Option<String>) -> Self {
        self.media_thumbnail = present(value);
        self
    }

    pub fn authors(mut self, value: Option<String>) -> Self {
        self.authors = present(value);
        self
    }

    pub fn build(self) -> Article {
        let na = || NOT_AVAILABLE.to_string();
        // The entry id falls back to the link before the marker.
        let id = self.id.or_else(|| self.link.clone());
        Article {
            source: self.source,
            title: self.title.unwrap_or_else(na),
            link: self.link.unwrap_or_else(na),
            summary: self.summary.unwrap_or_else(na),
            published: self.published.unwrap_or_else(na),
            id: id.unwrap_or_else(na),
            media_content: self.media_content.unwrap_or_else(na),
            media_thumbnail: self.media_thumbnail.unwrap_or_else(na),
            authors: self.authors.unwrap_or_else(na),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_become_marker() {
        let article = Article::builder("GB News").build();
        assert_eq!(article.source, "GB News");
        for field in &article.to_row()[1..] {
            assert_eq!(field, NOT_AVAILABLE);
        }
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let article = Article::builder("GB News")
            .title(Some(String::new()))
            .summary(Some(String::new()))
            .build();
        assert_eq!(article.title, NOT_AVAILABLE);
        assert_eq!(article.summary, NOT_AVAILABLE);
    }

    #[test]
    fn test_whitespace_values_are_kept() {
        let article = Article::builder("GB News")
            .title(Some("   ".to_string()))
            .link(Some(" ".to_string()))
            .build();
        assert_eq!(article.title, "   ");
        assert_eq!(article.link, " ");
        assert_eq!(article.id, " ");
    }

    #[test]
    fn test_id_falls_back_to_link() {
        let article = Article::builder("MEN")
            .link(Some("https://example.com/a".to_string()))
            .build();
        assert_eq!(article.id, "https://example.com/a");

        let article = Article::builder("MEN")
            .link(Some("https://example.com/a".to_string()))
            .id(Some("guid-1".to_string()))
            .build();
        assert_eq!(article.id, "guid-1");
    }

    #[test]
    fn test_row_follows_header_order() {
        let article = Article::builder("GB News")
            .title(Some("Storm warning issued".to_string()))
            .link(Some("https://example.com/storm".to_string()))
            .published(Some("Mon, 06 Jan 2025 10:00:00 GMT".to_string()))
            .build();
        let row = article.to_row();
        assert_eq!(row.len(), HEADER.len());
        assert_eq!(row[TITLE_COLUMN - 1], "Storm warning issued");
        assert_eq!(row[4], "Mon, 06 Jan 2025 10:00:00 GMT");
        assert_eq!(row[5], "https://example.com/storm");
    }
}
