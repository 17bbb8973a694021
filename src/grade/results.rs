#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::question::QuestionType;

/// Maximum score of every question; scores are normalized to `0..=1`.
pub const MAX_SCORE: f64 = 1.0;

/// Outcome of one script test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseOutcome {
    /// 1-based position in declaration order.
    pub index:       usize,
    /// Label of the case, if it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the student's output matched the reference output.
    pub passed:      bool,
    /// Whether the student's run hit its deadline.
    pub timed_out:   bool,
}

/// Per-case breakdown of a script question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    /// Number of cases that passed.
    pub passed: usize,
    /// Number of cases run.
    pub total:  usize,
    /// Every case, in declaration order.
    pub cases:  Vec<CaseOutcome>,
}

impl TestSummary {
    /// Tallies the given outcomes.
    pub fn new(cases: Vec<CaseOutcome>) -> Self {
        Self {
            passed: cases.iter().filter(|case| case.passed).count(),
            total: cases.len(),
            cases,
        }
    }
}

/// The grade of one answer to one question.
///
/// Built once per evaluation and never changed afterwards; `passed` always
/// equals `score >= max_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// Points achieved, `0..=max_score`.
    pub(crate) score:     f64,
    /// Points achievable.
    pub(crate) max_score: f64,
    /// Whether the answer earned full marks.
    pub(crate) passed:    bool,
    /// Human readable explanation.
    pub(crate) feedback:  String,
    /// Structured breakdown, for script questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) details:   Option<TestSummary>,
}

impl EvaluationResult {
    /// Creates a result with the given score out of [`MAX_SCORE`]. The score is
    /// clamped to `0..=MAX_SCORE`; NaN becomes zero.
    pub fn new(score: f64, feedback: impl Into<String>) -> Self {
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, MAX_SCORE)
        };
        Self {
            score,
            max_score: MAX_SCORE,
            passed: score >= MAX_SCORE,
            feedback: feedback.into(),
            details: None,
        }
    }

    /// Full marks.
    pub fn full(feedback: impl Into<String>) -> Self {
        Self::new(MAX_SCORE, feedback)
    }

    /// No marks.
    pub fn zero(feedback: impl Into<String>) -> Self {
        Self::new(0.0, feedback)
    }

    /// The fixed result for question types that cannot be graded.
    pub fn unsupported(kind: &QuestionType) -> Self {
        match kind {
            QuestionType::R => Self::zero("R grading is not implemented."),
            other => Self::zero(format!("Unsupported question type: {other}")),
        }
    }

    /// Attaches a per-case breakdown.
    pub fn with_details(mut self, details: TestSummary) -> Self {
        self.details = Some(details);
        self
    }

    /// Points achieved.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Points achievable.
    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    /// Whether the answer earned full marks.
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Human readable explanation.
    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    /// Per-case breakdown, for script questions.
    pub fn details(&self) -> Option<&TestSummary> {
        self.details.as_ref()
    }
}

impl Display for EvaluationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}/{:.2}", self.score, self.max_score)
    }
}
