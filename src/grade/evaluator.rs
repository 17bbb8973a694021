#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{sync::Arc, time::Duration};

use super::{choice, results::EvaluationResult, script::ScriptGrader, text};
use crate::{
    config::Config,
    constants::DEFAULT_CASE_TIMEOUT_MS,
    process::{SandboxRunner, ScriptRunner},
    question::{Question, QuestionType},
};

/// Routes each question to the grader for its type.
///
/// Holds no mutable state; one evaluator can grade any number of questions
/// concurrently.
#[derive(Clone)]
pub struct Evaluator {
    /// Executes scripts for script-graded questions.
    runner:       Arc<dyn ScriptRunner>,
    /// Deadline of every process spawned while grading a test case.
    case_timeout: Duration,
}

impl Evaluator {
    /// Creates an evaluator that runs scripts through `runner`.
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self {
            runner,
            case_timeout: Duration::from_millis(DEFAULT_CASE_TIMEOUT_MS),
        }
    }

    /// Creates an evaluator backed by a [`SandboxRunner`] configured from
    /// `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(SandboxRunner::from_config(config)))
            .with_case_timeout(config.case_timeout())
    }

    /// Sets the per-run deadline used by the script grader. A question with
    /// `n` cases can take up to about `2 * n` times this long.
    pub fn with_case_timeout(mut self, case_timeout: Duration) -> Self {
        self.case_timeout = case_timeout;
        self
    }

    /// Grades `answer` to `question`. Never fails: configuration problems and
    /// unsupported types produce a zero-score result with an explanation.
    pub async fn evaluate(&self, question: &Question, answer: &str) -> EvaluationResult {
        match &question.kind {
            QuestionType::MultipleChoice => choice::grade(question, answer),
            QuestionType::ShortAnswer | QuestionType::LongAnswer => text::grade(question, answer),
            QuestionType::Bash => {
                ScriptGrader::new(self.runner.as_ref(), self.case_timeout)
                    .grade(question, answer)
                    .await
            }
            unsupported @ (QuestionType::R
            | QuestionType::ExcelFormula
            | QuestionType::Html
            | QuestionType::Css
            | QuestionType::Other(_)) => EvaluationResult::unsupported(unsupported),
        }
    }
}
