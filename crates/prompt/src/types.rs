//! Prompt types.

use serde::{Deserialize, Serialize};

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// System message template (Handlebars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User message template (Handlebars)
    pub template: String,
}

/// A fully built prompt ready for the completion client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Article labels in rank order (`ARTICLE0`, `ARTICLE1`, ...)
    #[serde(rename = "articleLabels")]
    pub article_labels: Vec<String>,
}

impl BuiltPrompt {
    /// Whether the prompt was built without any retrieved articles.
    pub fn has_no_context(&self) -> bool {
        self.metadata.article_labels.is_empty()
    }
}

/// Label for the article at a rank position within one query.
pub fn article_label(rank: usize) -> String {
    format!("ARTICLE{}", rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: rag.answer.custom
title: Custom Answer
apiVersion: "1.0"
system: "You are terse."
template: "{{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "rag.answer.custom");
        assert_eq!(def.system.as_deref(), Some("You are terse."));
        assert_eq!(def.template, "{{question}}");
    }

    #[test]
    fn test_system_is_optional() {
        let yaml = "id: a.b\ntitle: T\napiVersion: \"1.0\"\ntemplate: x\n";
        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(def.system.is_none());
    }

    #[test]
    fn test_article_label() {
        assert_eq!(article_label(0), "ARTICLE0");
        assert_eq!(article_label(12), "ARTICLE12");
    }
}
