use crate::domain::document::TextDocument;
use crate::errors::MatcherResult;
use crate::processing::embedding::Embedder;

pub mod vector_store;

pub use vector_store::{AppendReport, VectorIndex, VectorStore};

pub trait IndexReader {
    /// Whether both persisted artifacts are present.
    fn exists(&self) -> bool;

    fn load(&self) -> MatcherResult<VectorIndex>;
}

pub trait IndexWriter {
    /// Build a fresh index over `documents`, replacing anything stored before.
    fn create<E>(&self, embedder: &mut E, documents: Vec<TextDocument>) -> MatcherResult<VectorIndex>
    where
        E: Embedder + ?Sized;

    /// Add `documents` to the stored index, creating it when absent.
    fn append<E>(&self, embedder: &mut E, documents: Vec<TextDocument>) -> MatcherResult<AppendReport>
    where
        E: Embedder + ?Sized;
}
