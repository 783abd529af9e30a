//! Collaborators that feed the pipeline: raw document sources and the
//! structured record extractor.

use crate::domain::document::RawDocument;
use crate::domain::record::StructuredRecord;
use crate::errors::{MatcherError, MatcherResult};

pub mod directory;

pub use directory::DirectorySource;

/// Supplies the raw `(id, title, text)` documents of one corpus.
pub trait DocumentSource {
    /// Returns the readable documents and the number of entries that could
    /// not be read.
    fn documents(&self) -> MatcherResult<(Vec<RawDocument>, usize)>;
}

/// Turns raw document text into a [`StructuredRecord`].
pub trait RecordExtractor {
    fn extract(&self, document: &RawDocument) -> MatcherResult<StructuredRecord>;
}

/// Reads records that were already extracted to JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRecordExtractor;

impl RecordExtractor for JsonRecordExtractor {
    fn extract(&self, document: &RawDocument) -> MatcherResult<StructuredRecord> {
        serde_json::from_str(&document.text).map_err(|e| MatcherError::Extraction {
            id: document.id.clone(),
            message: e.to_string(),
        })
    }
}
