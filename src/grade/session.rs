#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Aggregation of per-question results into a session score.

use futures::{StreamExt, future, stream};
use serde::{Deserialize, Deserializer, Serialize};

use super::{evaluator::Evaluator, results::EvaluationResult};
use crate::question::QuestionLookup;

/// One answer as submitted by a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Question being answered.
    pub question_id: String,
    /// Raw answer text; a missing or `null` answer is an empty one.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub answer:      String,
    /// Client-side telemetry, carried along and never inspected.
    #[serde(default, alias = "keystrokeMetrics", skip_serializing_if = "Option::is_none")]
    pub telemetry:   Option<serde_json::Value>,
}

/// Reads an optional string, mapping `null` to `""`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Submission {
    /// Creates a submission without telemetry.
    pub fn new(question_id: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer:      answer.into(),
            telemetry:   None,
        }
    }
}

/// The result of one evaluated question within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionScore {
    /// Question that was answered.
    pub question_id:      String,
    /// Version of the question that was graded.
    pub question_version: String,
    /// The grade.
    #[serde(flatten)]
    pub result:           EvaluationResult,
}

/// Totals of a graded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionScore {
    /// Sum of achieved points.
    pub total_score: f64,
    /// Sum of achievable points.
    pub max_score:   f64,
    /// `total_score / max_score`, or `0` when nothing was gradable.
    pub final_score: f64,
    /// Per-question results, in submission order.
    pub results:     Vec<QuestionScore>,
}

impl SessionScore {
    /// Sums `results` into a session score.
    pub fn new(results: Vec<QuestionScore>) -> Self {
        let total_score: f64 = results.iter().map(|scored| scored.result.score()).sum();
        let max_score: f64 = results.iter().map(|scored| scored.result.max_score()).sum();
        let final_score = if max_score > 0.0 {
            total_score / max_score
        } else {
            0.0
        };

        Self {
            total_score,
            max_score,
            final_score,
            results,
        }
    }

    /// Final score as a percentage.
    pub fn percent(&self) -> f64 {
        self.final_score * 100.0
    }
}

/// Looks up and grades one submission. Answers to unknown questions yield
/// `None`.
async fn score_one(
    evaluator: &Evaluator,
    lookup: &dyn QuestionLookup,
    submission: &Submission,
) -> Option<QuestionScore> {
    let Some(question) = lookup.get(&submission.question_id).await else {
        tracing::debug!(
            question_id = %submission.question_id,
            "skipping answer to unknown question"
        );
        return None;
    };

    let result = evaluator.evaluate(&question, &submission.answer).await;
    Some(QuestionScore {
        question_id: submission.question_id.clone(),
        question_version: question.version,
        result,
    })
}

/// Grades every submission one after another and sums the results.
///
/// Answers referencing questions `lookup` cannot resolve are skipped and count
/// towards neither total.
pub async fn score_session(
    evaluator: &Evaluator,
    lookup: &dyn QuestionLookup,
    submissions: &[Submission],
) -> SessionScore {
    score_session_concurrently(evaluator, lookup, submissions, 1).await
}

/// Like [`score_session`], grading up to `limit` questions at a time. Results
/// keep submission order, so the outcome is identical to the sequential one.
pub async fn score_session_concurrently(
    evaluator: &Evaluator,
    lookup: &dyn QuestionLookup,
    submissions: &[Submission],
    limit: usize,
) -> SessionScore {
    let results = stream::iter(submissions)
        .map(|submission| score_one(evaluator, lookup, submission))
        .buffered(limit.max(1))
        .filter_map(future::ready)
        .collect::<Vec<_>>()
        .await;

    let session = SessionScore::new(results);
    tracing::info!(
        answers = submissions.len(),
        graded = session.results.len(),
        total_score = session.total_score,
        max_score = session.max_score,
        final_score = session.final_score,
        "session scored"
    );
    session
}
