#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Question records, the question folder format, and question lookup.

/// Errors raised while loading questions.
pub mod error;
/// Parsing of the question folder format.
pub mod parse;
/// Question lookup trait and stores.
pub mod store;
/// Question data types.
pub mod types;

pub use error::QuestionError;
pub use parse::{QuestionFile, parse_meta, parse_question};
pub use store::{DirStore, MemoryStore, QuestionLookup};
pub use types::{
    ChoiceOption, ExpectedAnswer, PromptFormat, Question, QuestionMeta, QuestionType, TestCase,
};
