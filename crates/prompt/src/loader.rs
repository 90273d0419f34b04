//! Prompt loading: built-in definitions with optional workspace overrides.

use crate::builder::ANSWER_PROMPT_ID;
use crate::types::PromptDefinition;
use ragcourse_core::{AppError, AppResult};
use std::path::Path;

/// Built-in prompt used by the evaluator to ask for a true/false verdict.
pub const TRUE_FALSE_PROMPT_ID: &str = "eval.true_false.default";

const ANSWER_SYSTEM: &str = "You are a college adviser. \
{{#if articles}}You will be given several labeled articles from the course catalog and a question. \
Answer the question based only on the articles and cite the article labels you relied on.\
{{else}}No catalog articles are available for this question, so state that no relevant information was found \
instead of answering from memory.{{/if}}";

const ANSWER_TEMPLATE: &str = "{{#if articles}}{{#each articles}}ARTICLE{{@index}}: {{this}}\n\n{{/each}}\
QUESTION: {{question}}\n\n\
Answer the question using only the labeled articles above. \
Cite the label of every article you used, for example ARTICLE0.\
{{else}}No relevant articles were found in the course catalog for this question.\n\n\
QUESTION: {{question}}\n\n\
State that no relevant information was found. Do not guess or make up an answer.{{/if}}";

const TRUE_FALSE_TEMPLATE: &str = "I'm going to provide you a sentence.
And your job is to tell me it is true or false.

You should not provide any explanation or other extraneous words.
Valid values include: [True, False]
INPUT: I can take CSCI81 without finishing CSCI70
OUTPUT: False

INPUT: I could finish Computer Science major without taking Algorithm
OUTPUT: False

INPUT: I can take 18 credits without overload.
OUTPUT: True

INPUT: {{question}}
OUTPUT: ";

/// Look up a built-in prompt definition.
pub fn builtin_prompt(prompt_id: &str) -> Option<PromptDefinition> {
    match prompt_id {
        ANSWER_PROMPT_ID => Some(PromptDefinition {
            id: ANSWER_PROMPT_ID.to_string(),
            title: "Answer a catalog question from retrieved articles".to_string(),
            api_version: "1.0".to_string(),
            system: Some(ANSWER_SYSTEM.to_string()),
            template: ANSWER_TEMPLATE.to_string(),
        }),
        TRUE_FALSE_PROMPT_ID => Some(PromptDefinition {
            id: TRUE_FALSE_PROMPT_ID.to_string(),
            title: "Few-shot true/false verdict".to_string(),
            api_version: "1.0".to_string(),
            system: None,
            template: TRUE_FALSE_TEMPLATE.to_string(),
        }),
        _ => None,
    }
}

/// Load a prompt definition by ID.
///
/// A file named `<id>.yml` in `.ragcourse/prompts/` overrides the built-in
/// definition of the same ID.
///
/// # Example
/// ```no_run
/// use ragcourse_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "rag.answer.default")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(".ragcourse/prompts")
        .join(format!("{}.yml", prompt_id));

    if !prompt_file.exists() {
        tracing::debug!("No prompt override at {:?}; using built-in", prompt_file);
        return builtin_prompt(prompt_id)
            .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_prompt;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, content: &str) {
        let prompts_dir = dir.join(".ragcourse/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join(format!("{}.yml", id)), content).unwrap();
    }

    #[test]
    fn test_builtin_used_without_override() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), ANSWER_PROMPT_ID).unwrap();
        assert_eq!(prompt.id, ANSWER_PROMPT_ID);
        assert!(prompt.system.is_some());
    }

    #[test]
    fn test_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            ANSWER_PROMPT_ID,
            "id: rag.answer.default\ntitle: Mine\napiVersion: \"1.1\"\ntemplate: \"{{question}}!\"\n",
        );

        let prompt = load_prompt(temp_dir.path(), ANSWER_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Mine");
        assert_eq!(prompt.template, "{{question}}!");
    }

    #[test]
    fn test_unknown_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "broken", "invalid: yaml: content:");
        assert!(load_prompt(temp_dir.path(), "broken").is_err());
    }

    #[test]
    fn test_invalid_api_version() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "v",
            "id: v\ntitle: V\napiVersion: \"1\"\ntemplate: x\n",
        );
        assert!(load_prompt(temp_dir.path(), "v").is_err());
    }

    #[test]
    fn test_true_false_template_wraps_statement() {
        let def = builtin_prompt(TRUE_FALSE_PROMPT_ID).unwrap();
        let built = build_prompt(&def, "CSCI131 is offered in both Fall and Spring", std::iter::empty())
            .unwrap();
        assert!(built
            .user
            .ends_with("INPUT: CSCI131 is offered in both Fall and Spring\nOUTPUT: "));
        assert!(built.user.contains("Valid values include: [True, False]"));
    }
}
