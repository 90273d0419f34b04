//! Answer types.

use crate::types::QueryResult;
use ragcourse_prompt::article_label;
use serde::{Deserialize, Serialize};

/// Maximum snippet length for source references.
const MAX_SNIPPET_CHARS: usize = 150;

/// One article that was shown to the model, under the label it was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSourceRef {
    /// Label used in the prompt (`ARTICLE0`, ...)
    pub label: String,

    /// Store id of the article
    pub article_id: i64,

    /// URL or file path, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Page title
    pub title: String,

    /// Start of the article text
    pub snippet: String,
}

/// A model answer plus the labeled articles it was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    /// Raw model output
    pub answer: String,

    /// Articles in label order
    pub sources: Vec<RagSourceRef>,
}

impl RagResponse {
    pub fn new(answer: String, result: &QueryResult) -> Self {
        let sources = result
            .iter()
            .enumerate()
            .map(|(rank, scored)| RagSourceRef {
                label: article_label(rank),
                article_id: scored.article.id,
                source: scored.article.source.clone(),
                title: scored.article.title.clone(),
                snippet: snippet(&scored.article.text),
            })
            .collect();

        Self { answer, sources }
    }
}

fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_SNIPPET_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(MAX_SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}
