//! Quiz question model and answer-key derivation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single multiple-choice question.
///
/// Persisted exactly as produced by the extraction step: four options and a
/// `correct_answer` that is expected (but not guaranteed) to be one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Question text
    pub question: String,

    /// Exactly four answer options, in presentation order
    pub options: Vec<String>,

    /// The correct option, verbatim
    pub correct_answer: String,
}

impl QuizQuestion {
    /// Create a new question.
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            options,
            correct_answer: correct_answer.into(),
        }
    }

    /// Whether `correct_answer` appears among the options.
    ///
    /// A mismatch is a data-quality defect from the upstream model. It is
    /// flagged, never rejected.
    pub fn answer_in_options(&self) -> bool {
        self.options.iter().any(|o| o == &self.correct_answer)
    }
}

/// Derive the human-readable answer key from a question sequence.
///
/// One line per question, formatted `Q{i}: {correct_answer}` for i in 1..=N.
pub fn derive_answer_key(questions: &[QuizQuestion]) -> String {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("Q{}: {}", i + 1, q.correct_answer))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(answer: &str) -> QuizQuestion {
        QuizQuestion::new(
            "What is discussed?",
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer,
        )
    }

    #[test]
    fn test_answer_in_options() {
        assert!(sample("B").answer_in_options());
        assert!(!sample("E").answer_in_options());
    }

    #[test]
    fn test_answer_key_format() {
        let questions = vec![sample("B"), sample("D")];
        let key = derive_answer_key(&questions);
        assert_eq!(key, "Q1: B\nQ2: D");
        assert_eq!(key.lines().count(), questions.len());
    }

    #[test]
    fn test_answer_key_empty() {
        assert_eq!(derive_answer_key(&[]), "");
    }

    #[test]
    fn test_question_serde_field_names() {
        let json = serde_json::to_value(sample("A")).unwrap();
        assert!(json.get("correctAnswer").is_some());
        assert_eq!(json["options"].as_array().unwrap().len(), 4);
    }
}
