#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::results::EvaluationResult;
use crate::question::Question;

/// Grades a multiple-choice answer: the trimmed answer must equal the correct
/// option id exactly. No partial credit.
pub fn grade(question: &Question, answer: &str) -> EvaluationResult {
    let Some(correct) = question
        .correct_option_id()
        .filter(|id| !id.trim().is_empty())
    else {
        return EvaluationResult::zero("No correct option configured; cannot grade.");
    };

    if answer.trim() == correct {
        EvaluationResult::full("Correct.")
    } else {
        EvaluationResult::zero(format!("The correct answer is {correct}."))
    }
}
