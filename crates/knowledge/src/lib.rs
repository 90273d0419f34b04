//! Course catalog knowledge base.
//!
//! Provides the full-text article store, retrieval, ingestion from the web and
//! local files, and the answering session that ties retrieval to a completion
//! model.

pub mod ingest;
pub mod parser;
pub mod rag;
pub mod retriever;
pub mod store;
pub mod types;


// Re-export commonly used types
pub use ingest::{collect_sources, Ingestor, Page};
pub use rag::{assemble, AnsweringSession, RagResponse, RagSourceRef};
pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use store::ArticleStore;
pub use types::{
    Article, BuildStats, CrawlStats, NewArticle, QueryResult, ScoredArticle, SourceText,
    StoreStats,
};
