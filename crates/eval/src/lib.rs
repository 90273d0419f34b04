//! True/false benchmark evaluation of the answering pipeline.
//!
//! Replays labeled statements through an [`AnsweringSession`], turns each
//! free-text answer into a boolean with a [`TextToBool`] classifier and counts
//! agreements with the expected label.
//!
//! [`AnsweringSession`]: ragcourse_knowledge::AnsweringSession

pub mod classify;
pub mod dataset;
pub mod evaluator;

pub use classify::{NegationCueClassifier, TextToBool};
pub use dataset::{load_dataset, parse_dataset, BenchmarkCase};
pub use evaluator::{EvaluationRun, EvaluationState, Evaluator};
