//! Prompt assembly: renders retrieved articles and the question into one prompt.
//!
//! Articles are labeled by rank position within the query (`ARTICLE0` is the
//! best match), never by their store id. Article text is rendered in full;
//! keeping the prompt within the model's input limit is the retriever's job
//! (via `top_k`), not the assembler's.

use crate::loader::builtin_prompt;
use crate::types::{article_label, BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use handlebars::Handlebars;
use ragcourse_core::{AppError, AppResult};
use serde::Serialize;

/// Built-in prompt used to answer catalog questions.
pub const ANSWER_PROMPT_ID: &str = "rag.answer.default";

/// Assemble the answering prompt with the built-in definition.
///
/// # Example
/// ```
/// use ragcourse_prompt::assemble;
///
/// let built = assemble("What are prerequisites for CSCI070?", ["CSCI070 requires CSCI060."]).unwrap();
/// assert!(built.user.contains("ARTICLE0: CSCI070 requires CSCI060."));
/// ```
pub fn assemble<'a, I>(question: &str, articles: I) -> AppResult<BuiltPrompt>
where
    I: IntoIterator<Item = &'a str>,
{
    let definition = builtin_prompt(ANSWER_PROMPT_ID).ok_or_else(|| {
        AppError::Prompt(format!("Missing built-in prompt: {}", ANSWER_PROMPT_ID))
    })?;
    build_prompt(&definition, question, articles)
}

/// Build a prompt from a definition, a question and ranked article texts.
///
/// Template variables:
/// - `question`: the question text
/// - `articles`: article texts in rank order (use `{{@index}}` for the label number)
pub fn build_prompt<'a, I>(
    definition: &PromptDefinition,
    question: &str,
    articles: I,
) -> AppResult<BuiltPrompt>
where
    I: IntoIterator<Item = &'a str>,
{
    tracing::debug!("Building prompt: {}", definition.id);

    let articles: Vec<&str> = articles.into_iter().collect();
    let data = serde_json::json!({
        "question": question,
        "articles": articles,
    });

    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &data))
        .transpose()?;
    let user = render_template(&definition.template, &data)?;

    let article_labels = (0..articles.len()).map(article_label).collect::<Vec<_>>();
    if article_labels.is_empty() {
        tracing::debug!("No articles retrieved; built no-context prompt");
    } else {
        tracing::debug!("Injected {} articles into prompt", article_labels.len());
    }

    Ok(BuiltPrompt {
        system,
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            article_labels,
        },
    })
}

/// Render a Handlebars template with serializable data.
pub fn render_template<T: Serialize>(template: &str, data: &T) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSCI070: &str = "CSCI070 Data Structures and Program Development. \
        Prerequisites: CSCI042 or CSCI060, and MATH055.";
    const FULL_TIME: &str = "Students must enroll in at least 12 credits to be full time.";

    #[test]
    fn test_labels_follow_rank_order() {
        let built = assemble("What are prerequisites for CSCI070?", [CSCI070, FULL_TIME]).unwrap();

        let first = built.user.find("ARTICLE0: CSCI070").unwrap();
        let second = built.user.find("ARTICLE1: Students must").unwrap();
        assert!(first < second);
        assert!(built.user.contains("QUESTION: What are prerequisites for CSCI070?"));
        assert_eq!(built.metadata.article_labels, vec!["ARTICLE0", "ARTICLE1"]);
        assert_eq!(built.metadata.source_prompt_id, ANSWER_PROMPT_ID);
    }

    #[test]
    fn test_instructs_to_cite_and_stay_grounded() {
        let built = assemble("Is CSCI070 hard?", [CSCI070]).unwrap();
        assert!(built.user.contains("using only the labeled articles"));
        assert!(built.user.contains("Cite the label"));
        assert!(built.system.unwrap().contains("college adviser"));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let a = assemble("q", [CSCI070, FULL_TIME]).unwrap();
        let b = assemble("q", [CSCI070, FULL_TIME]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_results_state_no_information() {
        let built = assemble("Who teaches underwater basket weaving?", std::iter::empty()).unwrap();
        assert!(built.user.contains("no relevant information was found"));
        assert!(built.user.contains("QUESTION: Who teaches underwater basket weaving?"));
        assert!(!built.user.contains("ARTICLE"));
        assert!(built.has_no_context());
        assert!(built
            .system
            .unwrap()
            .contains("no relevant information was found"));
    }

    #[test]
    fn test_article_text_is_not_truncated_or_escaped() {
        let long = format!("<b>CS & Math</b> {}", "x".repeat(50_000));
        let built = assemble("q", [long.as_str()]).unwrap();
        assert!(built.user.contains(&long));
    }

    #[test]
    fn test_custom_definition() {
        let def = PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            system: None,
            template: "{{#each articles}}[{{@index}}] {{this}}\n{{/each}}Q: {{question}}"
                .to_string(),
        };

        let built = build_prompt(&def, "why?", ["a", "b"]).unwrap();
        assert_eq!(built.user, "[0] a\n[1] b\nQ: why?");
        assert!(built.system.is_none());
    }

    #[test]
    fn test_render_invalid_template() {
        let result = render_template("{{#each}}", &serde_json::json!({}));
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
