#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{borrow::Cow, fmt::Display};

use bon::Builder;
use serde::{Deserialize, Serialize};

/// The kind of a question, which decides how it is graded.
///
/// Unknown type strings are kept as [`QuestionType::Other`] so a question with
/// a type this crate does not know still loads and grades as unsupported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    /// Pick one option out of several.
    MultipleChoice,
    /// One-line free text answer.
    ShortAnswer,
    /// Multi-line free text answer.
    LongAnswer,
    /// Shell script compared against a reference solution (`bash` or `sh`).
    Bash,
    /// R script. Declared, not gradable.
    R,
    /// Spreadsheet formula. Declared, not gradable.
    ExcelFormula,
    /// HTML snippet. Declared, not gradable.
    Html,
    /// CSS snippet. Declared, not gradable.
    Css,
    /// Any type string this crate does not recognise.
    Other(String),
}

impl QuestionType {
    /// Returns the canonical type string, as written in `meta.yaml`.
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::LongAnswer => "long_answer",
            QuestionType::Bash => "bash",
            QuestionType::R => "r",
            QuestionType::ExcelFormula => "excel_formula",
            QuestionType::Html => "html",
            QuestionType::Css => "css",
            QuestionType::Other(name) => name,
        }
    }
}

impl From<&str> for QuestionType {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "multiple_choice" => QuestionType::MultipleChoice,
            "short_answer" => QuestionType::ShortAnswer,
            "long_answer" => QuestionType::LongAnswer,
            "bash" | "sh" => QuestionType::Bash,
            "r" => QuestionType::R,
            "excel_formula" => QuestionType::ExcelFormula,
            "html" => QuestionType::Html,
            "css" => QuestionType::Css,
            _ => QuestionType::Other(value.to_string()),
        }
    }
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        QuestionType::from(value.as_str())
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        match value {
            QuestionType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which prompt file the prompt text came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptFormat {
    /// Markdown (`prompt.md`).
    Md,
    /// Plain text (`prompt.txt`).
    #[default]
    Txt,
}

/// One option of a multiple-choice question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Identifier the student answers with.
    pub id:      String,
    /// Text shown to the student.
    #[serde(default)]
    pub text:    String,
    /// Whether this is the correct option.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub correct: bool,
}

impl ChoiceOption {
    /// Creates an option that is not marked correct.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id:      id.into(),
            text:    text.into(),
            correct: false,
        }
    }

    /// Marks the option as the correct one.
    pub fn correct(mut self) -> Self {
        self.correct = true;
        self
    }
}

/// Accepted answers of a free-text question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedAnswer {
    /// A single accepted answer. Takes precedence over `answers`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer:  Option<String>,
    /// A list of accepted answers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<String>,
}

impl ExpectedAnswer {
    /// Accepts exactly one answer.
    pub fn single(answer: impl Into<String>) -> Self {
        Self {
            answer:  Some(answer.into()),
            answers: Vec::new(),
        }
    }

    /// Accepts any of `answers`.
    pub fn any_of<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answer:  None,
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the accepted answers, raw.
    pub fn accepted(&self) -> Vec<&str> {
        match &self.answer {
            Some(answer) => vec![answer.as_str()],
            None => self.answers.iter().map(String::as_str).collect(),
        }
    }
}

/// One input scenario a script is graded against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct TestCase {
    /// Human readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub description: Option<String>,
    /// Text fed to the script's stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub stdin:       Option<String>,
    /// Script run in the same shell right before the graded script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub setup:       Option<String>,
}

impl TestCase {
    /// A case with the given stdin and nothing else.
    pub fn with_stdin(stdin: impl Into<String>) -> Self {
        Self {
            stdin: Some(stdin.into()),
            ..Self::default()
        }
    }

    /// The stdin to feed, empty when none is set.
    pub fn stdin_or_empty(&self) -> &str {
        self.stdin.as_deref().unwrap_or("")
    }

    /// Prepends this case's setup script, if any, to `script`.
    pub fn prepare(&self, script: &str) -> String {
        match &self.setup {
            Some(setup) => format!("{setup}\n{script}"),
            None => script.to_string(),
        }
    }
}

/// Identity and descriptive fields shared by every question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionMeta {
    /// Question identifier; also the folder name on disk.
    pub id:          String,
    /// Question type.
    #[serde(rename = "type")]
    pub kind:        String,
    /// Content version.
    pub version:     String,
    /// Optional title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title:       Option<String>,
    /// Optional subject area.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain:      Option<String>,
    /// Optional creation timestamp, as authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at:  Option<String>,
    /// Optional modification timestamp, as authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

/// A parsed, immutable question record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Question identifier.
    #[builder(into)]
    pub id:              String,
    /// Content version.
    #[builder(into)]
    pub version:         String,
    /// Question type.
    #[serde(rename = "type")]
    #[builder(into)]
    pub kind:            QuestionType,
    /// Optional title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub title:           Option<String>,
    /// Optional subject area.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub domain:          Option<String>,
    /// Optional creation timestamp, as authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub created_at:      Option<String>,
    /// Optional modification timestamp, as authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub modified_at:     Option<String>,
    /// Prompt text shown to the student.
    #[serde(default)]
    #[builder(default, into)]
    pub prompt:          String,
    /// Format of `prompt`.
    #[serde(default)]
    #[builder(default)]
    pub prompt_format:   PromptFormat,
    /// Options of a multiple-choice question.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub options:         Vec<ChoiceOption>,
    /// Explicit correct option of a multiple-choice question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub correct_id:      Option<String>,
    /// Accepted answers of a free-text question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected:        Option<ExpectedAnswer>,
    /// Reference solution of a script question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub solution_script: Option<String>,
    /// Declared test cases of a script question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests:           Option<Vec<TestCase>>,
}

impl Question {
    /// Resolves the correct option: `correct_id` if set, else the first option
    /// flagged correct.
    pub fn correct_option_id(&self) -> Option<&str> {
        self.correct_id.as_deref().or_else(|| {
            self.options
                .iter()
                .find(|option| option.correct)
                .map(|option| option.id.as_str())
        })
    }

    /// The cases a script answer is graded against: the declared ones, or a
    /// single default case with empty stdin and no setup when none are
    /// declared.
    pub fn test_cases(&self) -> Cow<'_, [TestCase]> {
        match self.tests.as_deref() {
            Some(cases) if !cases.is_empty() => Cow::Borrowed(cases),
            _ => Cow::Owned(vec![TestCase {
                description: Some("Default".to_string()),
                ..TestCase::default()
            }]),
        }
    }

    /// Identity and descriptive fields of this question.
    pub fn meta(&self) -> QuestionMeta {
        QuestionMeta {
            id:          self.id.clone(),
            kind:        self.kind.to_string(),
            version:     self.version.clone(),
            title:       self.title.clone(),
            domain:      self.domain.clone(),
            created_at:  self.created_at.clone(),
            modified_at: self.modified_at.clone(),
        }
    }
}
