//! Prompt system for ragcourse.
//!
//! This crate turns a question and its retrieved articles into the prompt sent
//! to the completion client:
//! - Built-in prompt definitions with YAML overrides
//! - Handlebars template rendering
//! - Rank-ordered `ARTICLE<i>` labeling

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{assemble, build_prompt, render_template, ANSWER_PROMPT_ID};
pub use loader::{builtin_prompt, load_prompt, TRUE_FALSE_PROMPT_ID};
pub use types::{article_label, BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
