//! # quizgrade
//!
//! Runs untrusted student shell scripts under a deadline, grades answers to
//! multiple-choice, free-text and script questions, and sums them into a
//! session score.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Environment-driven configuration
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// For all things related to grading
pub mod grade;
/// Sandboxed execution of shell scripts
pub mod process;
/// Question records, parsing and lookup
pub mod question;

pub use grade::{
    EvaluationResult, Evaluator, SessionScore, Submission, score_session,
    score_session_concurrently,
};
pub use process::{RunResult, SandboxRunner, ScriptRunner};
pub use question::{DirStore, MemoryStore, Question, QuestionLookup, QuestionType};
