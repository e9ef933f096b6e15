//! Structured quiz extraction from free-form model output.
//!
//! Generative models return quiz JSON wrapped in markdown fences, prose, or
//! both, and the prompt format has varied between an object envelope
//! (`{"questions": [...]}`) and a bare array. This module locates the
//! outermost JSON value with a balanced-bracket scan (string- and
//! escape-aware, so nested braces never truncate the span), validates it,
//! and falls back to a canonical single question when nothing usable is
//! found. The pipeline therefore always has at least one quiz question and
//! never sees a parse error.

use serde::Deserialize;
use tracing::{debug, warn};

use vquiz_models::QuizQuestion;

/// Required option count per question.
const OPTIONS_PER_QUESTION: usize = 4;

/// Two-tier extraction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedQuiz {
    /// Questions parsed and validated from the model output.
    Parsed(Vec<QuizQuestion>),
    /// Canonical fallback; the model output was unusable.
    Fallback(Vec<QuizQuestion>),
}

impl ExtractedQuiz {
    /// The final question sequence, regardless of tier.
    pub fn questions(&self) -> &[QuizQuestion] {
        match self {
            ExtractedQuiz::Parsed(q) | ExtractedQuiz::Fallback(q) => q,
        }
    }

    /// Consume into the final question sequence.
    pub fn into_questions(self) -> Vec<QuizQuestion> {
        match self {
            ExtractedQuiz::Parsed(q) | ExtractedQuiz::Fallback(q) => q,
        }
    }

    /// Whether extraction fell back to the canonical question.
    pub fn is_fallback(&self) -> bool {
        matches!(self, ExtractedQuiz::Fallback(_))
    }
}

/// The canonical single-question fallback.
pub fn fallback_quiz() -> Vec<QuizQuestion> {
    vec![QuizQuestion::new(
        "What was the main topic of the video?",
        vec![
            "Topic A".to_string(),
            "Topic B".to_string(),
            "Topic C".to_string(),
            "Topic D".to_string(),
        ],
        "Topic A",
    )]
}

/// Extract a validated quiz from raw model output.
pub fn extract_quiz(raw: &str) -> ExtractedQuiz {
    match try_extract(raw) {
        Some(questions) => ExtractedQuiz::Parsed(questions),
        None => {
            warn!("No usable quiz JSON in model output, using fallback question");
            ExtractedQuiz::Fallback(fallback_quiz())
        }
    }
}

/// Envelope shape: `{"questions": [...]}`.
#[derive(Debug, Deserialize)]
struct QuizEnvelope {
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: String,
}

fn try_extract(raw: &str) -> Option<Vec<QuizQuestion>> {
    let cleaned = strip_code_fences(raw);

    // Try each candidate JSON span in order of appearance; the first one that
    // parses into the expected shape wins.
    let bytes = cleaned.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'{' && b != b'[' {
            continue;
        }
        let Some(end) = balanced_span_end(&cleaned[i..]) else {
            continue;
        };
        let span = &cleaned[i..i + end];
        if let Some(questions) = parse_span(span) {
            return Some(questions);
        }
    }

    None
}

/// Remove markdown code-fence marker lines, keeping their content.
fn strip_code_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Length of the balanced JSON value starting at the first byte of `s`.
///
/// Tracks string literals and escapes so braces inside question text never
/// close the span early. Returns `None` when the value never closes.
fn balanced_span_end(s: &str) -> Option<usize> {
    let open = s.as_bytes()[0];
    let close = match open {
        b'{' => b'}',
        b'[' => b']',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse one candidate span into validated questions.
fn parse_span(span: &str) -> Option<Vec<QuizQuestion>> {
    // Both upstream prompt formats must be supported.
    let raw_questions = if let Ok(envelope) = serde_json::from_str::<QuizEnvelope>(span) {
        envelope.questions
    } else if let Ok(array) = serde_json::from_str::<Vec<RawQuestion>>(span) {
        array
    } else {
        return None;
    };

    if raw_questions.is_empty() {
        return None;
    }

    let mut questions = Vec::with_capacity(raw_questions.len());
    for raw in raw_questions {
        // A malformed entry discards the whole batch.
        if raw.question.trim().is_empty()
            || raw.options.len() != OPTIONS_PER_QUESTION
            || raw.correct_answer.trim().is_empty()
        {
            debug!("Discarding quiz batch: entry failed validation");
            return None;
        }

        let question = QuizQuestion::new(raw.question, raw.options, raw.correct_answer);
        if !question.answer_in_options() {
            // Data-quality defect from the upstream model; flagged, not rejected.
            warn!(
                question = %question.question,
                "correctAnswer is not among the options"
            );
        }
        questions.push(question);
    }

    Some(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FENCED: &str = "```json\n{\"questions\":[{\"question\":\"Q?\",\"options\":[\"A\",\"B\",\"C\",\"D\"],\"correctAnswer\":\"B\"}]}\n```";

    #[test]
    fn test_fenced_envelope_round_trip() {
        let result = extract_quiz(FENCED);
        assert!(!result.is_fallback());
        let questions = result.questions();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Q?");
        assert_eq!(questions[0].correct_answer, "B");
        assert_eq!(questions[0].options, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_bare_array_shape() {
        let raw = r#"[{"question":"Q1?","options":["A","B","C","D"],"correctAnswer":"A"},
                      {"question":"Q2?","options":["E","F","G","H"],"correctAnswer":"H"}]"#;
        let result = extract_quiz(raw);
        assert!(!result.is_fallback());
        assert_eq!(result.questions().len(), 2);
    }

    #[test]
    fn test_surrounding_prose_is_tolerated() {
        let raw = format!(
            "Sure! Here is the quiz you asked for:\n{}\nLet me know if you need more.",
            r#"{"questions":[{"question":"Q?","options":["A","B","C","D"],"correctAnswer":"C"}]}"#
        );
        let result = extract_quiz(&raw);
        assert!(!result.is_fallback());
        assert_eq!(result.questions()[0].correct_answer, "C");
    }

    #[test]
    fn test_nested_braces_in_strings_not_truncated() {
        let raw = r#"{"questions":[{"question":"What does {x: 1} mean?","options":["A {y}","B","C","D"],"correctAnswer":"B"}]}"#;
        let result = extract_quiz(raw);
        assert!(!result.is_fallback());
        assert_eq!(result.questions()[0].question, "What does {x: 1} mean?");
    }

    #[test]
    fn test_stray_brace_before_real_json() {
        let raw = r#"Use {braces} carefully. [{"question":"Q?","options":["A","B","C","D"],"correctAnswer":"D"}]"#;
        let result = extract_quiz(raw);
        assert!(!result.is_fallback());
        assert_eq!(result.questions()[0].correct_answer, "D");
    }

    #[test]
    fn test_non_json_falls_back() {
        let result = extract_quiz("I cannot answer that.");
        assert!(result.is_fallback());
        let questions = result.questions();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "What was the main topic of the video?");
        assert_eq!(questions[0].correct_answer, "Topic A");
        assert_eq!(
            questions[0].options,
            vec!["Topic A", "Topic B", "Topic C", "Topic D"]
        );
    }

    #[test]
    fn test_wrong_option_count_discards_batch() {
        let raw = r#"{"questions":[
            {"question":"Ok","options":["A","B","C","D"],"correctAnswer":"A"},
            {"question":"Bad","options":["A","B"],"correctAnswer":"A"}
        ]}"#;
        assert!(extract_quiz(raw).is_fallback());
    }

    #[test]
    fn test_missing_field_discards_batch() {
        let raw = r#"{"questions":[{"question":"Q?","options":["A","B","C","D"]}]}"#;
        assert!(extract_quiz(raw).is_fallback());
    }

    #[test]
    fn test_empty_question_list_falls_back() {
        assert!(extract_quiz(r#"{"questions":[]}"#).is_fallback());
    }

    #[test]
    fn test_answer_not_in_options_is_kept() {
        // Flagged as a data-quality defect, but not rejected.
        let raw = r#"{"questions":[{"question":"Q?","options":["A","B","C","D"],"correctAnswer":"E"}]}"#;
        let result = extract_quiz(raw);
        assert!(!result.is_fallback());
        assert!(!result.questions()[0].answer_in_options());
    }

    #[test]
    fn test_unclosed_json_falls_back() {
        assert!(extract_quiz(r#"{"questions":[{"question":"Q?"#).is_fallback());
    }

    #[test]
    fn test_escaped_quotes_in_strings() {
        let raw = r#"{"questions":[{"question":"He said \"{hi}\"?","options":["A","B","C","D"],"correctAnswer":"A"}]}"#;
        let result = extract_quiz(raw);
        assert!(!result.is_fallback());
        assert_eq!(result.questions()[0].question, "He said \"{hi}\"?");
    }
}
