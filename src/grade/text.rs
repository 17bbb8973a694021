#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use super::results::EvaluationResult;
use crate::question::Question;

/// Case-folds and collapses every whitespace run to a single space, trimming
/// both ends.
pub fn normalize(text: &str) -> String {
    text.to_lowercase().split_whitespace().join(" ")
}

/// Grades a short or long free-text answer against the accepted answers.
///
/// Without any accepted answer the result is always a zero: a question that
/// is not configured for grading never passes.
pub fn grade(question: &Question, answer: &str) -> EvaluationResult {
    let accepted = question
        .expected
        .as_ref()
        .map(|expected| expected.accepted())
        .unwrap_or_default();

    if accepted.is_empty() {
        return EvaluationResult::zero("No expected answer configured; cannot grade.");
    }

    let given = normalize(answer);
    if accepted.iter().any(|candidate| normalize(candidate) == given) {
        EvaluationResult::full("Correct.")
    } else {
        EvaluationResult::zero("Your answer does not match the expected answer(s).")
    }
}
