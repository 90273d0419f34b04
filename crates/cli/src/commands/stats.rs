//! Stats command handler.
//!
//! Reports the size and contents of the article store.

use clap::Args;
use ragcourse_core::{config::AppConfig, AppError, AppResult};
use ragcourse_knowledge::ArticleStore;

/// Show article store statistics
#[derive(Args, Debug, Default)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let db_path = config.db_path();
        let store = ArticleStore::open(&db_path)?;
        let stats = store.stats()?;

        if self.json {
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("Store: {}", db_path.display());
        println!("Articles: {}", stats.articles);
        println!("Sources: {}", stats.sources);
        println!("Size: {:.1} KiB", stats.db_size_bytes as f64 / 1024.0);

        Ok(())
    }
}
