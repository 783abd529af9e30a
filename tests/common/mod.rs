//! Helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use resume_matcher::domain::document::TextDocument;
use resume_matcher::errors::MatcherResult;
use resume_matcher::models::config::AppendPolicy;
use resume_matcher::processing::embedding::Embedder;
use resume_matcher::repository::VectorStore;
use tempfile::TempDir;

/// Temporary directory holding one or more vector stores.
pub struct TestStore {
    dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        TestStore {
            dir: tempfile::tempdir().expect("Failed to create temporary directory."),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self, name: &str) -> VectorStore {
        VectorStore::new(self.path(name))
    }

    pub fn store_with_policy(&self, name: &str, policy: AppendPolicy) -> VectorStore {
        self.store(name).with_append_policy(policy)
    }
}

/// Deterministic bag-of-words embedder: every distinct lower-cased token
/// gets its own dimension (modulo `dimensions`), vectors are unit length.
pub struct VocabularyEmbedder {
    dimensions: usize,
    vocabulary: HashMap<String, usize>,
    pub calls: usize,
}

impl VocabularyEmbedder {
    pub fn new() -> Self {
        Self::with_dimensions(64)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            vocabulary: HashMap::new(),
            calls: 0,
        }
    }

    pub fn vector_for(&mut self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let next = self.vocabulary.len();
            let slot = *self
                .vocabulary
                .entry(token.to_lowercase())
                .or_insert(next);
            vector[slot % self.dimensions] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Embedder for VocabularyEmbedder {
    fn provider(&self) -> &str {
        "vocabulary"
    }

    fn embed_many(&mut self, texts: &[String]) -> MatcherResult<Vec<Vec<f32>>> {
        self.calls += 1;
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }
}

pub fn resume(id: &str, text: &str) -> TextDocument {
    TextDocument::new(id, id, text)
        .with_metadata("resume_id", id)
        .with_metadata("title", id)
}

pub fn job(id: &str, text: &str) -> TextDocument {
    TextDocument::new(id, id, text)
        .with_metadata("jd_id", id)
        .with_metadata("title", id)
}
