//! Clarification Questions
//!
//! A clarification is one disambiguating question with a small set of
//! candidate answers, produced in batches by a single remote call. Once a
//! batch is answered or skipped, its questions move to the session's
//! excluded list and are never asked again within the session.

use serde::{Deserialize, Serialize};

/// Minimum number of candidate answers for a well-formed clarification.
pub const MIN_CLARIFICATION_OPTIONS: usize = 2;

/// Maximum number of candidate answers for a well-formed clarification.
pub const MAX_CLARIFICATION_OPTIONS: usize = 5;

/// A single clarifying question with candidate answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    pub options: Vec<String>,
}

impl Clarification {
    pub fn new(question: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            question: question.into(),
            options,
        }
    }

    /// Whether the question carries the expected 2-5 candidate answers.
    pub fn is_well_formed(&self) -> bool {
        !self.question.trim().is_empty()
            && (MIN_CLARIFICATION_OPTIONS..=MAX_CLARIFICATION_OPTIONS).contains(&self.options.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_bounds() {
        let one = Clarification::new("What breed?", vec!["corgi".into()]);
        assert!(!one.is_well_formed());

        let two = Clarification::new("What breed?", vec!["corgi".into(), "husky".into()]);
        assert!(two.is_well_formed());

        let six = Clarification::new(
            "What breed?",
            (0..6).map(|i| format!("breed-{i}")).collect(),
        );
        assert!(!six.is_well_formed());
    }

    #[test]
    fn test_empty_question_is_malformed() {
        let c = Clarification::new("  ", vec!["a".into(), "b".into()]);
        assert!(!c.is_well_formed());
    }
}
