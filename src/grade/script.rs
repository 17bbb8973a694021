#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Grading of shell-script answers against a reference solution.

use std::time::Duration;

use super::results::{CaseOutcome, EvaluationResult, TestSummary};
use crate::{
    constants::EXPECTED_PREVIEW_CHARS,
    process::ScriptRunner,
    question::{Question, TestCase},
};

/// First [`EXPECTED_PREVIEW_CHARS`] characters of `expected`.
fn preview(expected: &str) -> String {
    expected.chars().take(EXPECTED_PREVIEW_CHARS).collect()
}

/// Runs the reference solution and the student's script through the same
/// cases and compares their trimmed stdout.
pub struct ScriptGrader<'a> {
    /// Executes every script.
    runner:       &'a dyn ScriptRunner,
    /// Deadline of each individual run.
    case_timeout: Duration,
}

impl<'a> ScriptGrader<'a> {
    /// Creates a grader that runs everything through `runner`.
    pub fn new(runner: &'a dyn ScriptRunner, case_timeout: Duration) -> Self {
        Self {
            runner,
            case_timeout,
        }
    }

    /// Runs `script` for `case` and returns its trimmed stdout plus whether it
    /// timed out.
    async fn output_for(&self, case: &TestCase, script: &str) -> (String, bool) {
        let run = self
            .runner
            .run(&case.prepare(script), case.stdin_or_empty(), self.case_timeout)
            .await;
        (run.stdout.trim().to_string(), run.timed_out)
    }

    /// Grades `answer`. Cases run sequentially in declaration order; every
    /// reference output is computed before the first student run.
    ///
    /// The score is the fraction of cases whose output matches. Only stdout
    /// is compared; stderr and exit codes do not count.
    pub async fn grade(&self, question: &Question, answer: &str) -> EvaluationResult {
        let Some(reference) = question
            .solution_script
            .as_deref()
            .filter(|script| !script.trim().is_empty())
        else {
            return EvaluationResult::zero("Question has no reference solution.");
        };

        let cases = question.test_cases();

        let mut expected = Vec::with_capacity(cases.len());
        for (idx, case) in cases.iter().enumerate() {
            let (output, timed_out) = self.output_for(case, reference).await;
            if timed_out {
                tracing::warn!(
                    question = %question.id,
                    case = idx + 1,
                    "reference solution timed out; expected output is partial"
                );
            }
            expected.push(output);
        }

        let mut outcomes = Vec::with_capacity(cases.len());
        let mut failures = Vec::new();
        for (idx, (case, expected)) in cases.iter().zip(&expected).enumerate() {
            let (actual, timed_out) = self.output_for(case, answer).await;
            let passed = actual == *expected;
            if !passed {
                failures.push(format!(
                    "Test {}: expected output did not match. Expected (first \
                     {EXPECTED_PREVIEW_CHARS} chars): {}...",
                    idx + 1,
                    preview(expected)
                ));
            }
            outcomes.push(CaseOutcome {
                index: idx + 1,
                description: case.description.clone(),
                passed,
                timed_out,
            });
        }

        let summary = TestSummary::new(outcomes);
        let score = summary.passed as f64 / summary.total as f64;
        let feedback = if failures.is_empty() {
            "All tests passed.".to_string()
        } else {
            failures.join(" ")
        };

        tracing::debug!(
            question = %question.id,
            passed = summary.passed,
            total = summary.total,
            "script answer graded"
        );

        EvaluationResult::new(score, feedback).with_details(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn preview_counts_characters_not_bytes() {
        let long = "é".repeat(300);
        assert_eq!(preview(&long).chars().count(), 200);
        assert_eq!(preview("short"), "short");
    }
}
