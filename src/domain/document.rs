use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unit of storage in a vector store.
///
/// `id` identifies the source document; `title` is only a display label.
/// `metadata` carries the per-corpus keys (`resume_id`, `jd_id`, `filename`,
/// ...) used when fragments are grouped back into documents.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TextDocument {
    pub id: String,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl TextDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Look up a named field. `id`, `title` and `text` resolve to the struct
    /// fields, anything else to `metadata`.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "id" => Some(self.id.as_str()),
            "title" => Some(self.title.as_str()),
            "text" => Some(self.text.as_str()),
            _ => self.metadata.get(name).map(String::as_str),
        }
    }
}

/// The two document classes kept in separate stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorpusKind {
    Resume,
    JobDescription,
}

impl CorpusKind {
    /// Metadata key holding the explicit source id for this corpus.
    pub fn id_key(self) -> &'static str {
        match self {
            CorpusKind::Resume => "resume_id",
            CorpusKind::JobDescription => "jd_id",
        }
    }

    /// Metadata fields tried, in order, when resolving a group key.
    pub fn group_key_priority(self) -> [&'static str; 5] {
        [self.id_key(), "filename", "file_name", "source", "title"]
    }
}

/// A document as delivered by a raw-document source.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub title: String,
    pub text: String,
}
