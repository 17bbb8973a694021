#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Parsing of the question folder format.
//!
//! A question folder holds `meta.yaml`, a prompt (`prompt.md` or
//! `prompt.txt`) and, depending on the type, `options.yaml`, `expected.yaml`,
//! `solution.sh`/`solution.R` and `tests.yaml`. Optional files that fail to
//! parse are ignored rather than rejecting the whole question.

use serde::Deserialize;
use serde_yaml::Value;

use super::{
    error::QuestionError,
    types::{
        ChoiceOption, ExpectedAnswer, PromptFormat, Question, QuestionMeta, QuestionType, TestCase,
    },
};

/// Every file name the parser looks at.
pub const KNOWN_FILES: &[&str] = &[
    "meta.yaml",
    "prompt.md",
    "prompt.txt",
    "options.yaml",
    "expected.yaml",
    "solution.sh",
    "solution.R",
    "tests.yaml",
];

/// A file of a question folder, already read into memory.
#[derive(Debug, Clone)]
pub struct QuestionFile {
    /// File name within the folder.
    pub name:    String,
    /// UTF-8 contents.
    pub content: String,
}

impl QuestionFile {
    /// Creates a file entry.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name:    name.into(),
            content: content.into(),
        }
    }
}

/// `options.yaml` is either a bare list of options or a map carrying the list
/// and an explicit correct id.
#[derive(Deserialize)]
#[serde(untagged)]
enum OptionsFile {
    /// `- {id: a, text: A, correct: true}`
    List(Vec<ChoiceOption>),
    /// `{correct_id: a, options: [...]}`
    Map {
        /// Explicit correct option id.
        #[serde(default)]
        correct_id: Option<String>,
        /// The options.
        #[serde(default)]
        options:    Option<Vec<ChoiceOption>>,
    },
}

/// Returns the contents of `name`, if present.
fn find<'a>(files: &'a [QuestionFile], name: &str) -> Option<&'a str> {
    files
        .iter()
        .find(|file| file.name == name)
        .map(|file| file.content.as_str())
}

/// Renders a YAML scalar as a string; `version: 1` is as valid as
/// `version: "1"`.
fn scalar(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Parses `meta.yaml` contents.
pub fn parse_meta(content: &str) -> Result<QuestionMeta, QuestionError> {
    let raw: Value = serde_yaml::from_str(content).map_err(QuestionError::InvalidMeta)?;

    let id = scalar(raw.get("id")).ok_or(QuestionError::MissingField("id"))?;
    let kind = scalar(raw.get("type")).ok_or(QuestionError::MissingField("type"))?;
    let version = scalar(raw.get("version")).ok_or(QuestionError::MissingField("version"))?;

    Ok(QuestionMeta {
        id,
        kind,
        version,
        title: scalar(raw.get("title")),
        domain: scalar(raw.get("domain")),
        created_at: scalar(raw.get("created_at")),
        modified_at: scalar(raw.get("modified_at")),
    })
}

/// Parses the files of one question folder into a [`Question`].
pub fn parse_question(files: &[QuestionFile]) -> Result<Question, QuestionError> {
    let meta = parse_meta(find(files, "meta.yaml").ok_or(QuestionError::MissingMeta)?)?;

    let (prompt, prompt_format) = match (find(files, "prompt.md"), find(files, "prompt.txt")) {
        (Some(md), _) => (md.to_string(), PromptFormat::Md),
        (None, Some(txt)) => (txt.to_string(), PromptFormat::Txt),
        (None, None) => return Err(QuestionError::MissingPrompt),
    };

    let kind = QuestionType::from(meta.kind.as_str());
    let mut question = Question {
        id: meta.id,
        version: meta.version,
        kind,
        title: meta.title,
        domain: meta.domain,
        created_at: meta.created_at,
        modified_at: meta.modified_at,
        prompt,
        prompt_format,
        options: Vec::new(),
        correct_id: None,
        expected: None,
        solution_script: None,
        tests: None,
    };

    match question.kind {
        QuestionType::MultipleChoice => {
            if let Some(content) = find(files, "options.yaml") {
                apply_options(&mut question, content);
            }
        }
        QuestionType::ShortAnswer | QuestionType::LongAnswer => {
            question.expected = find(files, "expected.yaml")
                .and_then(|content| serde_yaml::from_str::<ExpectedAnswer>(content).ok());
        }
        QuestionType::Bash | QuestionType::R => {
            question.solution_script = find(files, "solution.sh")
                .or_else(|| find(files, "solution.R"))
                .map(str::to_string);
            question.tests = find(files, "tests.yaml")
                .map(|content| parse_test_cases(&question.id, content));
        }
        _ => {}
    }

    Ok(question)
}

/// Parses `tests.yaml`. Malformed entries are dropped one by one; a file that
/// is not a list yields no cases.
fn parse_test_cases(id: &str, content: &str) -> Vec<TestCase> {
    let entries = match serde_yaml::from_str::<Vec<Value>>(content) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("question `{id}`: tests.yaml is not a list, ignoring it: {err}");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_yaml::from_value::<TestCase>(entry) {
            Ok(case) => Some(case),
            Err(err) => {
                tracing::warn!(
                    "question `{id}`: skipping malformed test case {}: {err}",
                    idx + 1
                );
                None
            }
        })
        .collect()
}

/// Fills options and the correct id from `options.yaml`. An option flagged
/// `correct: true` wins over `correct_id`.
fn apply_options(question: &mut Question, content: &str) {
    match serde_yaml::from_str::<OptionsFile>(content) {
        Ok(OptionsFile::List(options)) => question.options = options,
        Ok(OptionsFile::Map {
            correct_id,
            options: Some(options),
        }) => {
            question.options = options;
            question.correct_id = correct_id;
        }
        Ok(OptionsFile::Map { options: None, .. }) | Err(_) => return,
    }

    if let Some(flagged) = question.options.iter().find(|option| option.correct) {
        question.correct_id = Some(flagged.id.clone());
    }
}
