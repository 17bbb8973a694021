#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a question folder.
#[derive(Error, Debug)]
pub enum QuestionError {
    /// The folder has no `meta.yaml`.
    #[error("meta.yaml missing")]
    MissingMeta,

    /// `meta.yaml` could not be parsed.
    #[error("meta.yaml is not valid YAML: {0}")]
    InvalidMeta(#[source] serde_yaml::Error),

    /// A required `meta.yaml` field is absent or empty.
    #[error("meta.yaml missing required field `{0}`")]
    MissingField(&'static str),

    /// Neither `prompt.md` nor `prompt.txt` is present.
    #[error("prompt.md or prompt.txt required")]
    MissingPrompt,

    /// The question id is not a plain folder name.
    #[error("invalid question id `{0}`")]
    InvalidId(String),

    /// Reading from disk failed.
    #[error("could not read {}", path.display())]
    Io {
        /// Path that failed.
        path:   PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
