#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;

use super::{
    error::QuestionError,
    parse::{KNOWN_FILES, QuestionFile, parse_meta, parse_question},
    types::{Question, QuestionMeta},
};

/// Resolves question ids to parsed questions.
///
/// A question that cannot be found, or cannot be parsed, is simply absent.
#[async_trait]
pub trait QuestionLookup: Send + Sync {
    /// Returns the question with the given id, if there is one.
    async fn get(&self, id: &str) -> Option<Question>;
}

/// An in-memory question store keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Questions by id.
    questions: HashMap<String, Question>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a question.
    pub fn insert(&mut self, question: Question) {
        self.questions.insert(question.id.clone(), question);
    }
}

impl FromIterator<Question> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = Question>>(iter: T) -> Self {
        let mut store = Self::new();
        iter.into_iter().for_each(|question| store.insert(question));
        store
    }
}

#[async_trait]
impl QuestionLookup for MemoryStore {
    async fn get(&self, id: &str) -> Option<Question> {
        self.questions.get(id).cloned()
    }
}

/// A store that reads question folders from `<root>/<id>/`.
#[derive(Debug, Clone)]
pub struct DirStore {
    /// Directory containing one folder per question.
    root: PathBuf,
}

impl DirStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the folder of question `id`, refusing anything that is not a
    /// single plain path component.
    fn folder(&self, id: &str) -> Result<PathBuf, QuestionError> {
        let mut components = Path::new(id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(id)),
            _ => Err(QuestionError::InvalidId(id.to_string())),
        }
    }

    /// Loads and parses question `id`.
    pub async fn load(&self, id: &str) -> Result<Question, QuestionError> {
        let dir = self.folder(id)?;

        let mut files = Vec::new();
        for name in KNOWN_FILES {
            let path = dir.join(name);
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => files.push(QuestionFile::new(*name, content)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(QuestionError::Io { path, source }),
            }
        }

        if files.is_empty() && !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(QuestionError::Io {
                path:   dir,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        parse_question(&files)
    }

    /// Lists the metadata of every folder with a readable `meta.yaml`, sorted
    /// by id. A missing root is an empty store.
    pub async fn list(&self) -> Result<Vec<QuestionMeta>, QuestionError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(QuestionError::Io {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut metas = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| QuestionError::Io {
                path: self.root.clone(),
                source,
            })?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|kind| kind.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }

            let meta_path = entry.path().join("meta.yaml");
            let Ok(content) = tokio::fs::read_to_string(&meta_path).await else {
                continue;
            };
            match parse_meta(&content) {
                Ok(meta) => metas.push(meta),
                Err(err) => tracing::debug!("skipping {}: {err}", meta_path.display()),
            }
        }

        metas.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(metas)
    }
}

#[async_trait]
impl QuestionLookup for DirStore {
    async fn get(&self, id: &str) -> Option<Question> {
        match self.load(id).await {
            Ok(question) => Some(question),
            Err(QuestionError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                None
            }
            Err(err) => {
                tracing::warn!("question `{id}` could not be loaded: {err}");
                None
            }
        }
    }
}
