#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

use super::session::SessionScore;
use crate::question::QuestionMeta;

/// One line of the session overview.
#[derive(Tabled)]
struct ResultRow {
    /// Question id.
    #[tabled(rename = "Question")]
    question: String,
    /// Achieved out of achievable.
    #[tabled(rename = "Score")]
    score:    String,
    /// Yes or no.
    #[tabled(rename = "Passed")]
    passed:   &'static str,
    /// Grader explanation.
    #[tabled(rename = "Feedback")]
    feedback: String,
}

/// One line of the question listing.
#[derive(Tabled)]
struct QuestionRow {
    /// Question id.
    #[tabled(rename = "ID")]
    id:      String,
    /// Question type.
    #[tabled(rename = "Type")]
    kind:    String,
    /// Content version.
    #[tabled(rename = "Version")]
    version: String,
    /// Title, if any.
    #[tabled(rename = "Title")]
    title:   String,
}

/// Renders a graded session as a table with a totals footer.
pub fn render_session(session: &SessionScore) -> String {
    let rows: Vec<ResultRow> = session
        .results
        .iter()
        .map(|scored| ResultRow {
            question: scored.question_id.clone(),
            score:    scored.result.to_string(),
            passed:   if scored.result.passed() { "yes" } else { "no" },
            feedback: scored.result.feedback().to_string(),
        })
        .collect();

    Table::new(&rows)
        .with(Panel::header("Grading Overview"))
        .with(Panel::footer(format!(
            "Total: {:.2}/{:.2} ({:.1}%)",
            session.total_score,
            session.max_score,
            session.percent()
        )))
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(48).keep_words(true)))
        .with(
            Modify::new(Rows::first())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(Modify::new(Rows::last()).with(Alignment::center()))
        .with(Style::modern())
        .to_string()
}

/// Renders question metadata as a table.
pub fn render_questions(metas: &[QuestionMeta]) -> String {
    let rows: Vec<QuestionRow> = metas
        .iter()
        .map(|meta| QuestionRow {
            id:      meta.id.clone(),
            kind:    meta.kind.clone(),
            version: meta.version.clone(),
            title:   meta.title.clone().unwrap_or_default(),
        })
        .collect();

    Table::new(&rows).with(Style::modern()).to_string()
}
