//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format used for crawl timestamps stored alongside each article.
pub const CRAWL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Publish date recorded when a page carries none.
pub const UNKNOWN_DATE: &str = "Unknown";

/// A stored article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Store-assigned identifier (SQLite rowid), unique within one store
    pub id: i64,

    /// Page or file title
    pub title: String,

    /// Full article text
    pub text: String,

    /// URL or file path the text came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Publish date as found on the page, or `Unknown`
    pub published_at: String,

    /// When the article was added
    pub crawled_at: String,

    /// Model-written summary, when summarization was enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Crawl depth the page was added at
    pub depth: u32,
}

/// An article about to be inserted.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub text: String,
    pub source: Option<String>,
    pub published_at: String,
    pub crawled_at: DateTime<Utc>,
    pub summary: Option<String>,
    pub depth: u32,
}

impl NewArticle {
    /// A bare article with no provenance beyond its text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            text: text.into(),
            source: None,
            published_at: UNKNOWN_DATE.to_string(),
            crawled_at: Utc::now(),
            summary: None,
            depth: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_published_at(mut self, published_at: impl Into<String>) -> Self {
        self.published_at = published_at.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }
}

/// Raw text handed to a store build.
#[derive(Debug, Clone)]
pub struct SourceText {
    /// Text to index
    pub text: String,

    /// Where the text came from
    pub source: Option<String>,

    /// Optional title
    pub title: Option<String>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
            title: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl From<SourceText> for NewArticle {
    fn from(source: SourceText) -> Self {
        let mut article = NewArticle::new(source.text);
        article.title = source.title.unwrap_or_default();
        article.source = source.source;
        article
    }
}

/// An article with its relevance to one query. Larger scores are better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub article: Article,
    pub score: f64,
}

/// Articles returned for one query, most relevant first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub articles: Vec<ScoredArticle>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredArticle> {
        self.articles.iter()
    }

    /// Article texts in rank order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.articles.iter().map(|scored| scored.article.text.as_str())
    }

    /// Article ids in rank order.
    pub fn ids(&self) -> Vec<i64> {
        self.articles.iter().map(|scored| scored.article.id).collect()
    }
}

/// Statistics from adding sources to a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Articles written
    pub inserted: usize,

    /// Sources skipped (empty text or already stored)
    pub skipped: usize,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Outcome of a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Pages stored as new articles
    pub stored: usize,

    /// Already-stored pages revisited at a greater depth
    pub upgraded: usize,

    /// URLs skipped (outside the allowed domain, duplicates, oversized pages)
    pub skipped: usize,

    /// URLs that could not be fetched or parsed
    pub failed: usize,
}

/// Statistics for a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of articles
    pub articles: usize,

    /// Number of distinct sources
    pub sources: usize,

    /// Database size in bytes
    pub db_size_bytes: u64,
}
