//! Benchmark dataset loading.
//!
//! A dataset is JSON Lines: one `{"question": ..., "answer": ...}` object per
//! line. The answer is a JSON boolean or the string `"True"` / `"False"`
//! (any case). Blank lines are ignored.

use ragcourse_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One labeled statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkCase {
    pub question: String,
    pub expected: bool,
}

impl BenchmarkCase {
    pub fn new(question: impl Into<String>, expected: bool) -> Self {
        Self {
            question: question.into(),
            expected,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCase {
    question: String,
    answer: RawLabel,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Bool(bool),
    Text(String),
}

impl RawLabel {
    fn to_bool(&self) -> Option<bool> {
        match self {
            RawLabel::Bool(b) => Some(*b),
            RawLabel::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }
}

/// Load a dataset from a JSON Lines file.
pub fn load_dataset(path: &Path) -> AppResult<Vec<BenchmarkCase>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Evaluation(format!("Failed to read dataset {:?}: {}", path, e))
    })?;

    let cases = parse_dataset(&contents)?;
    tracing::info!("Loaded {} benchmark cases from {:?}", cases.len(), path);
    Ok(cases)
}

/// Parse JSON Lines dataset contents.
pub fn parse_dataset(contents: &str) -> AppResult<Vec<BenchmarkCase>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let line_no = index + 1;
            let raw: RawCase = serde_json::from_str(line).map_err(|e| {
                AppError::Evaluation(format!("Invalid benchmark case on line {}: {}", line_no, e))
            })?;

            let expected = raw.answer.to_bool().ok_or_else(|| {
                AppError::Evaluation(format!(
                    "Invalid answer on line {}: expected true or false",
                    line_no
                ))
            })?;

            Ok(BenchmarkCase {
                question: raw.question,
                expected,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_bool_and_string_labels() {
        let contents = r#"{"question": "I can take 18 credits without overload.", "answer": "True"}

{"question": "I can take 10 credits and be a full time student", "answer": false}
{"question": "CSCI131 is offered in both Fall and Spring", "answer": "true"}
"#;
        let cases = parse_dataset(contents).unwrap();
        assert_eq!(
            cases,
            vec![
                BenchmarkCase::new("I can take 18 credits without overload.", true),
                BenchmarkCase::new("I can take 10 credits and be a full time student", false),
                BenchmarkCase::new("CSCI131 is offered in both Fall and Spring", true),
            ]
        );
    }

    #[test]
    fn test_invalid_label_reports_line() {
        let contents = "{\"question\": \"q\", \"answer\": true}\n{\"question\": \"q\", \"answer\": \"maybe\"}";
        let err = parse_dataset(contents).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_dataset("{not json}"),
            Err(AppError::Evaluation(_))
        ));
    }

    #[test]
    fn test_load_dataset_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.jsonl");
        std::fs::write(&path, "{\"question\": \"q\", \"answer\": \"False\"}\n").unwrap();

        let cases = load_dataset(&path).unwrap();
        assert_eq!(cases, vec![BenchmarkCase::new("q", false)]);
        assert!(load_dataset(&dir.path().join("missing.jsonl")).is_err());
    }
}
