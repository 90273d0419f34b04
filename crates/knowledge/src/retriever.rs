//! Top-K article retrieval for a question.

use crate::store::ArticleStore;
use crate::types::QueryResult;
use ragcourse_core::AppResult;

/// Number of articles retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = ragcourse_core::config::DEFAULT_TOP_K;

/// Ranks stored articles against a question.
pub struct Retriever<'a> {
    store: &'a ArticleStore,
    top_k: usize,
}

impl<'a> Retriever<'a> {
    pub fn new(store: &'a ArticleStore) -> Self {
        Self {
            store,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Up to `top_k` articles, most relevant first.
    ///
    /// An empty store or a question sharing no terms with any article gives
    /// an empty result.
    pub fn retrieve(&self, question: &str) -> AppResult<QueryResult> {
        let result = self.store.query(question, self.top_k)?;

        if result.is_empty() {
            tracing::info!("No articles matched the question");
        } else {
            tracing::info!(
                "Retrieved {} articles (top score: {:.3})",
                result.len(),
                result.articles[0].score
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceText;
    use tempfile::TempDir;

    #[test]
    fn test_empty_store_returns_empty_result() {
        let dir = TempDir::new().unwrap();
        let (store, _) =
            ArticleStore::build(&dir.path().join("empty.db"), Vec::<SourceText>::new()).unwrap();

        let result = Retriever::new(&store).retrieve("anything at all").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_default_top_k() {
        let dir = TempDir::new().unwrap();
        let sources = (0..8).map(|i| SourceText::new(format!("Course {} covers algorithms", i)));
        let (store, _) = ArticleStore::build(&dir.path().join("t.db"), sources).unwrap();

        let retriever = Retriever::new(&store);
        assert_eq!(retriever.top_k(), 5);
        assert_eq!(retriever.retrieve("algorithms").unwrap().len(), 5);
        assert_eq!(
            Retriever::new(&store)
                .with_top_k(2)
                .retrieve("algorithms")
                .unwrap()
                .len(),
            2
        );
    }
}
