//! Mapping free-text answers to booleans.

/// Interprets a model answer as true or false.
pub trait TextToBool {
    fn to_bool(&self, text: &str) -> bool;
}

/// Substrings that mark an answer as false.
pub const NEGATION_CUES: &[&str] = &["not", "false", "incorrect"];

/// Reads an answer as false when it contains a negation cue anywhere,
/// case-insensitively, and as true otherwise.
///
/// Matching is by substring, so "not unlikely" and "nothing" both read as
/// false.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegationCueClassifier;

impl TextToBool for NegationCueClassifier {
    fn to_bool(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        !NEGATION_CUES.iter().any(|cue| lower.contains(cue))
    }
}
