#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Multiple-choice grading.
pub mod choice;
/// Routing of questions to graders.
pub mod evaluator;
/// Table rendering for the command line.
pub mod report;
/// Shared grade result types.
pub mod results;
/// Script grading against a reference solution.
pub mod script;
/// Session-level aggregation.
pub mod session;
/// Free-text grading.
pub mod text;

pub use evaluator::Evaluator;
pub use report::{render_questions, render_session};
pub use results::{CaseOutcome, EvaluationResult, MAX_SCORE, TestSummary};
pub use script::ScriptGrader;
pub use session::{
    QuestionScore, SessionScore, Submission, score_session, score_session_concurrently,
};
pub use text::normalize;
