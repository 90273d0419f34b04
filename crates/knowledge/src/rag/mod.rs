//! RAG (Retrieval-Augmented Generation) answering.
//!
//! Retrieved articles are injected into the prompt under rank labels and the
//! completion model is asked to answer from them alone.

pub mod session;
pub mod types;

pub use session::AnsweringSession;
pub use types::{RagResponse, RagSourceRef};

use crate::types::QueryResult;
use ragcourse_core::AppResult;
use ragcourse_prompt::BuiltPrompt;

/// Assemble the default answering prompt from a query result.
pub fn assemble(question: &str, result: &QueryResult) -> AppResult<BuiltPrompt> {
    ragcourse_prompt::assemble(question, result.texts())
}
