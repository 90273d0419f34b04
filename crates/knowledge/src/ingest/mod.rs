//! Building the article store from web pages, PDFs and local files.
//!
//! Per-source failures are logged and skipped; a crawl never aborts because
//! one page could not be fetched.

pub mod html;

use crate::parser::{self, ContentType};
use crate::store::ArticleStore;
use crate::types::{CrawlStats, NewArticle, SourceText, UNKNOWN_DATE};
use chrono::{DateTime, Utc};
use ragcourse_core::config::CrawlConfig;
use ragcourse_core::{AppError, AppResult};
use ragcourse_llm::{LlmClient, LlmRequest};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

const SUMMARY_SYSTEM: &str = "Summarize the input text below including the contents and details. \
Pay special attention to school, major, graduation requirements and courses. \
Must include any information related to major, graduation requirements and courses in detail and the school.";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub title: String,
    pub published_at: String,
    pub crawled_at: DateTime<Utc>,
    pub content: String,
    pub links: Vec<String>,
}

/// Fetches pages and writes them to a store.
pub struct Ingestor {
    http: reqwest::Client,
    config: CrawlConfig,
    summarizer: Option<(Arc<dyn LlmClient>, String)>,
}

impl Ingestor {
    pub fn new(config: CrawlConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("ragcourse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            summarizer: None,
        })
    }

    /// Store a model-written summary with each page when summarization is enabled.
    pub fn with_summarizer(mut self, client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        self.summarizer = Some((client, model.into()));
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Fetch one URL and extract its text, metadata and links.
    pub async fn fetch_page(&self, url: &str) -> AppResult<Page> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Ingest(format!("Failed to request {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Ingest(format!(
                "Failed to fetch {}. Status code: {}",
                url,
                status.as_u16()
            )));
        }

        let is_pdf = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/pdf"))
            .unwrap_or(false)
            || url.to_lowercase().ends_with(".pdf");

        let crawled_at = Utc::now();

        if is_pdf {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| AppError::Ingest(format!("Failed to read {}: {}", url, e)))?;
            let content = parser::extract_pdf(&bytes)?;
            return Ok(Page {
                url: url.to_string(),
                title: pdf_title(url),
                published_at: UNKNOWN_DATE.to_string(),
                crawled_at,
                content,
                links: Vec::new(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Ingest(format!("Failed to read {}: {}", url, e)))?;
        let parsed = html::parse_page(&body, url)?;

        Ok(Page {
            url: url.to_string(),
            title: parsed.title,
            published_at: parsed.published_at,
            crawled_at,
            content: parsed.content,
            links: parsed.links,
        })
    }

    /// Crawl from `url`, following links up to `depth` hops.
    ///
    /// Only URLs containing the allowed domain are visited. A URL that is
    /// already stored is revisited only when reached with a greater depth
    /// than it was stored at; its links are then followed and its depth
    /// upgraded. Pages over the size limit are not stored but their links
    /// are still followed.
    pub async fn crawl(&self, store: &ArticleStore, url: &str, depth: u32) -> AppResult<CrawlStats> {
        let mut stats = CrawlStats::default();
        // Deepest depth each URL was visited with during this crawl
        let mut visited: HashMap<String, u32> = HashMap::new();
        let mut pending = vec![(url.to_string(), depth)];

        while let Some((url, depth)) = pending.pop() {
            if !url.contains(&self.config.allowed_domain) {
                tracing::info!("Outside allowed domain, skipped: {}", url);
                stats.skipped += 1;
                continue;
            }

            if visited.get(&url).is_some_and(|&seen| seen >= depth) {
                stats.skipped += 1;
                continue;
            }
            visited.insert(url.clone(), depth);

            let links = match self.visit(store, &url, depth, &mut stats).await {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", url, e);
                    stats.failed += 1;
                    continue;
                }
            };

            if depth > 0 {
                // Reverse so links are visited in page order
                pending.extend(links.into_iter().rev().map(|link| (link, depth - 1)));
            }
        }

        tracing::info!(
            "Crawl finished: {} stored, {} upgraded, {} skipped, {} failed",
            stats.stored,
            stats.upgraded,
            stats.skipped,
            stats.failed
        );

        Ok(stats)
    }

    /// Handle one URL and return the links to follow.
    async fn visit(
        &self,
        store: &ArticleStore,
        url: &str,
        depth: u32,
        stats: &mut CrawlStats,
    ) -> AppResult<Vec<String>> {
        if let Some(stored_depth) = store.depth_of(url)? {
            if depth <= stored_depth {
                tracing::info!("With depth {} duplicate detected, skip {}", depth, url);
                stats.skipped += 1;
                return Ok(Vec::new());
            }

            let page = self.fetch_page(url).await?;
            store.set_depth(url, depth)?;
            tracing::info!("Upgraded {} from depth {} to {}", url, stored_depth, depth);
            stats.upgraded += 1;
            return Ok(page.links);
        }

        let page = self.fetch_page(url).await?;

        if page.content.chars().count() > self.config.max_page_chars {
            tracing::info!("Page too long to store: {}", url);
            stats.skipped += 1;
            return Ok(page.links);
        }

        if page.content.trim().is_empty() {
            tracing::info!("No content on page, skipped: {}", url);
            stats.skipped += 1;
            return Ok(page.links);
        }

        let summary = match self.summarize(&page.content).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Failed to summarize {}: {}", url, e);
                stats.skipped += 1;
                return Ok(page.links);
            }
        };

        let mut article = NewArticle::new(page.content)
            .with_title(page.title)
            .with_source(url)
            .with_published_at(page.published_at)
            .with_depth(depth);
        article.crawled_at = page.crawled_at;
        if let Some(summary) = summary {
            article = article.with_summary(summary);
        }

        let id = store.insert(article)?;
        tracing::info!("With depth {} stored {} as article {}", depth, url, id);
        stats.stored += 1;

        Ok(page.links)
    }

    async fn summarize(&self, text: &str) -> AppResult<Option<String>> {
        if !self.config.summarize {
            return Ok(None);
        }
        let Some((ref client, ref model)) = self.summarizer else {
            return Ok(None);
        };

        let request = LlmRequest::new(text, model.clone()).with_system(SUMMARY_SYSTEM);
        let response = client.complete(&request).await?;
        Ok(Some(response.content))
    }
}

fn pdf_title(url: &str) -> String {
    url.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(url)
        .to_string()
}

/// Collect parseable files under the given paths as build sources.
///
/// Unsupported or unreadable files are logged and skipped.
pub fn collect_sources(paths: &[impl AsRef<Path>]) -> Vec<SourceText> {
    let mut sources = Vec::new();

    for root in paths {
        for entry in WalkDir::new(root.as_ref())
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !ContentType::from_path(path).is_supported() {
                continue;
            }

            match parser::parse_file(path) {
                Ok(text) => {
                    let title = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .unwrap_or_default();
                    sources.push(
                        SourceText::new(text)
                            .with_source(path.to_string_lossy().to_string())
                            .with_title(title),
                    );
                }
                Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
            }
        }
    }

    tracing::debug!("Collected {} local sources", sources.len());
    sources
}
