//! Build command handler.
//!
//! Populates the article store from local files and crawled pages.

use super::completion_client;
use clap::Args;
use ragcourse_core::{config::AppConfig, AppError, AppResult};
use ragcourse_knowledge::{collect_sources, ArticleStore, BuildStats, CrawlStats, Ingestor};
use std::path::PathBuf;
use tracing::Instrument;

/// Build or extend the article store
#[derive(Args, Debug, Default)]
pub struct BuildCommand {
    /// Start URL to crawl (repeatable)
    #[arg(long = "url")]
    pub urls: Vec<String>,

    /// File or directory to ingest (repeatable)
    #[arg(long = "path")]
    pub paths: Vec<PathBuf>,

    /// Link depth to follow from each URL (default: crawl.maxDepth)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Discard the existing store and rebuild from scratch
    #[arg(long)]
    pub reset: bool,

    /// Store a model-written summary with each crawled page
    #[arg(long)]
    pub summarize: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing build command");
        tracing::debug!("Build options: {:?}", self);

        if self.urls.is_empty() && self.paths.is_empty() && !self.reset {
            return Err(AppError::Config(
                "Nothing to build: pass --url, --path or --reset".to_string(),
            ));
        }

        let db_path = config.db_path();
        let sources = collect_sources(&self.paths);

        let (store, files) = if self.reset {
            ArticleStore::build(&db_path, sources)?
        } else {
            let store = ArticleStore::open_or_create(&db_path)?;
            let stats = store.extend(sources)?;
            (store, stats)
        };
        print_build_stats(&files);

        if !self.urls.is_empty() {
            let crawled = self.crawl(config, &store).await?;
            print_crawl_stats(&crawled);
        }

        println!("Store: {} ({} articles)", db_path.display(), store.len()?);
        Ok(())
    }

    async fn crawl(&self, config: &AppConfig, store: &ArticleStore) -> AppResult<CrawlStats> {
        let mut crawl_config = config.crawl.clone();
        if self.summarize {
            crawl_config.summarize = true;
        }
        let depth = self.depth.unwrap_or(crawl_config.max_depth);

        let mut ingestor = Ingestor::new(crawl_config)?;
        if ingestor.config().summarize {
            ingestor = ingestor.with_summarizer(completion_client(config)?, config.model.clone());
        }

        let mut total = CrawlStats::default();
        for url in &self.urls {
            let stats = ingestor
                .crawl(store, url, depth)
                .instrument(tracing::info_span!("crawl", url = %url, depth))
                .await?;
            total.stored += stats.stored;
            total.upgraded += stats.upgraded;
            total.skipped += stats.skipped;
            total.failed += stats.failed;
        }

        Ok(total)
    }
}

fn print_build_stats(stats: &BuildStats) {
    if stats.inserted > 0 || stats.skipped > 0 {
        println!(
            "Files: {} inserted, {} skipped ({:.2}s)",
            stats.inserted, stats.skipped, stats.duration_secs
        );
    }
}

fn print_crawl_stats(stats: &CrawlStats) {
    println!(
        "Crawl: {} stored, {} upgraded, {} skipped, {} failed",
        stats.stored, stats.upgraded, stats.skipped, stats.failed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> AppConfig {
        AppConfig::default().with_overrides(
            Some(dir.path().to_path_buf()),
            Some(PathBuf::from("catalog.db")),
            None,
            None,
            None,
            None,
            false,
            false,
        )
    }

    #[tokio::test]
    async fn test_build_from_files() {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("csci070.md"), "# CSCI070\nRequires CSCI060.").unwrap();
        fs::write(docs.join("notes.txt"), "Full time is 12 credits.").unwrap();
        fs::write(docs.join("skip.rs"), "fn main() {}").unwrap();

        let config = config_in(&dir);
        let cmd = BuildCommand {
            paths: vec![docs.clone()],
            ..Default::default()
        };
        cmd.execute(&config).await.unwrap();

        let store = ArticleStore::open(&config.db_path()).unwrap();
        assert_eq!(store.len().unwrap(), 2);

        // Second run skips sources that are already stored
        cmd.execute(&config).await.unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reset_replaces_store() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        fs::write(&first, "Old catalog text.").unwrap();
        fs::write(&second, "New catalog text.").unwrap();

        let config = config_in(&dir);
        BuildCommand {
            paths: vec![first],
            ..Default::default()
        }
        .execute(&config)
        .await
        .unwrap();

        BuildCommand {
            paths: vec![second],
            reset: true,
            ..Default::default()
        }
        .execute(&config)
        .await
        .unwrap();

        let store = ArticleStore::open(&config.db_path()).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.query("old", 5).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_to_build() {
        let dir = TempDir::new().unwrap();
        let err = BuildCommand::default()
            .execute(&config_in(&dir))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
