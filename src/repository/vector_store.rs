//! Persisted vector store: a usearch index plus a JSON manifest.
//!
//! Each location is a directory holding two artifacts that are always
//! written and read together:
//! - `index.usearch` - vectors keyed by insertion position
//! - `docs.json` - dimensions, metric and the documents in key order

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::domain::document::TextDocument;
use crate::errors::{MatcherError, MatcherResult};
use crate::models::config::{AppendPolicy, DistanceMetric};
use crate::processing::embedding::{Embedder, common_dimensions, embed_texts};
use crate::repository::{IndexReader, IndexWriter};

pub const INDEX_FILE: &str = "index.usearch";
pub const METADATA_FILE: &str = "docs.json";

pub(crate) fn index_error(error: impl std::fmt::Display) -> MatcherError {
    MatcherError::Index(error.to_string())
}

pub(crate) fn new_index(
    dimensions: usize,
    metric: DistanceMetric,
    capacity: usize,
) -> MatcherResult<Index> {
    let index = Index::new(&IndexOptions {
        dimensions,
        metric: match metric {
            DistanceMetric::L2sq => MetricKind::L2sq,
            DistanceMetric::Ip => MetricKind::IP,
            DistanceMetric::Cos => MetricKind::Cos,
        },
        quantization: ScalarKind::F32,
        ..Default::default()
    })
    .map_err(index_error)?;

    if capacity > 0 {
        index.reserve(capacity).map_err(index_error)?;
    }

    Ok(index)
}

fn path_str(path: &Path) -> MatcherResult<&str> {
    path.to_str()
        .ok_or_else(|| MatcherError::Index(format!("non UTF-8 path {}", path.display())))
}

#[derive(Debug, Deserialize, Serialize)]
struct StoreManifest {
    dimensions: usize,
    metric: DistanceMetric,
    updated_at: DateTime<Utc>,
    documents: Vec<TextDocument>,
}

/// A loaded store: the nth vector in `index` belongs to `documents()[n]`.
pub struct VectorIndex {
    location: PathBuf,
    index: Index,
    manifest: StoreManifest,
}

impl VectorIndex {
    pub fn documents(&self) -> &[TextDocument] {
        &self.manifest.documents
    }

    pub fn len(&self) -> usize {
        self.manifest.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.documents.is_empty()
    }

    /// Number of vectors held by the index itself.
    pub fn vector_count(&self) -> usize {
        self.index.size()
    }

    pub fn dimensions(&self) -> usize {
        self.manifest.dimensions
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.manifest.updated_at
    }

    /// The `k` nearest stored documents with their raw index distances.
    /// Exhaustive scan: `k >= len()` returns every stored document.
    pub fn search(&self, query: &[f32], k: usize) -> MatcherResult<Vec<(&TextDocument, f32)>> {
        if query.len() != self.dimensions() {
            return Err(MatcherError::DimensionMismatch {
                expected: self.dimensions(),
                actual: query.len(),
            });
        }

        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let matches = self.index.exact_search(query, k).map_err(index_error)?;

        Ok(matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .filter_map(|(&key, &distance)| {
                self.manifest
                    .documents
                    .get(key as usize)
                    .map(|document| (document, distance))
            })
            .collect())
    }

    fn save(&mut self) -> MatcherResult<()> {
        fs::create_dir_all(&self.location)?;

        let index_path = self.location.join(INDEX_FILE);
        self.index
            .save(path_str(&index_path)?)
            .map_err(index_error)?;

        self.manifest.updated_at = Utc::now();
        let metadata_path = self.location.join(METADATA_FILE);
        let tmp_path = metadata_path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(&self.manifest)?)?;
        fs::rename(&tmp_path, &metadata_path)?;

        Ok(())
    }
}

/// Counts reported by [`IndexWriter::append`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppendReport {
    pub added: usize,
    pub replaced: usize,
    pub skipped: usize,
    /// Documents in the store after the append.
    pub total: usize,
}

#[derive(Debug, Default, PartialEq)]
struct AppendPlan {
    additions: Vec<TextDocument>,
    /// Stored position -> new document.
    replacements: BTreeMap<usize, TextDocument>,
    skipped: usize,
}

impl AppendPlan {
    fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.replacements.is_empty()
    }
}

enum Slot {
    Stored(usize),
    Pending(usize),
}

/// Decide where each incoming document goes under `policy`.
///
/// Ids are compared against the stored documents and against documents
/// earlier in the same batch.
fn plan_append(
    existing: &[TextDocument],
    incoming: Vec<TextDocument>,
    policy: AppendPolicy,
) -> AppendPlan {
    let mut plan = AppendPlan::default();
    if policy == AppendPolicy::Duplicate {
        plan.additions = incoming;
        return plan;
    }

    let mut slots: HashMap<String, Slot> = HashMap::new();
    for (position, document) in existing.iter().enumerate() {
        slots.entry(document.id.clone()).or_insert(Slot::Stored(position));
    }

    for document in incoming {
        match (slots.get(&document.id), policy) {
            (None, _) => {
                slots.insert(document.id.clone(), Slot::Pending(plan.additions.len()));
                plan.additions.push(document);
            }
            (Some(_), AppendPolicy::Skip) => {
                log::warn!("Skipping document {}: id already stored", document.id);
                plan.skipped += 1;
            }
            (Some(Slot::Stored(position)), _) => {
                plan.replacements.insert(*position, document);
            }
            (Some(Slot::Pending(index)), _) => {
                plan.additions[*index] = document;
            }
        }
    }

    plan
}

fn ensure_texts(documents: &[TextDocument]) -> MatcherResult<()> {
    match documents.iter().find(|document| document.text.trim().is_empty()) {
        Some(document) => Err(MatcherError::EmptyDocument {
            id: document.id.clone(),
        }),
        None => Ok(()),
    }
}

/// Filesystem-backed store at one named location.
#[derive(Clone, Debug)]
pub struct VectorStore {
    location: PathBuf,
    metric: DistanceMetric,
    policy: AppendPolicy,
}

impl VectorStore {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            metric: DistanceMetric::default(),
            policy: AppendPolicy::default(),
        }
    }

    /// Metric used when a new index is created. Existing stores keep theirs.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_append_policy(mut self, policy: AppendPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    fn index_path(&self) -> PathBuf {
        self.location.join(INDEX_FILE)
    }

    fn metadata_path(&self) -> PathBuf {
        self.location.join(METADATA_FILE)
    }

    fn corrupt(&self, reason: impl Into<String>) -> MatcherError {
        MatcherError::StoreCorrupt {
            path: self.location.clone(),
            reason: reason.into(),
        }
    }
}

impl IndexReader for VectorStore {
    fn exists(&self) -> bool {
        self.index_path().is_file() && self.metadata_path().is_file()
    }

    fn load(&self) -> MatcherResult<VectorIndex> {
        for path in [self.index_path(), self.metadata_path()] {
            if !path.is_file() {
                return Err(MatcherError::StoreNotFound { path });
            }
        }

        let raw = fs::read(self.metadata_path())?;
        let manifest: StoreManifest = serde_json::from_slice(&raw)
            .map_err(|e| self.corrupt(format!("unreadable {METADATA_FILE}: {e}")))?;

        let index = new_index(manifest.dimensions, manifest.metric, 0)?;
        index
            .load(path_str(&self.index_path())?)
            .map_err(|e| self.corrupt(format!("unreadable {INDEX_FILE}: {e}")))?;

        if index.dimensions() != manifest.dimensions {
            return Err(self.corrupt(format!(
                "index has {} dimensions, metadata records {}",
                index.dimensions(),
                manifest.dimensions
            )));
        }
        if index.size() != manifest.documents.len() {
            return Err(self.corrupt(format!(
                "index holds {} vectors but metadata lists {} documents",
                index.size(),
                manifest.documents.len()
            )));
        }

        log::debug!(
            "Loaded {} documents from {}",
            manifest.documents.len(),
            self.location.display()
        );

        Ok(VectorIndex {
            location: self.location.clone(),
            index,
            manifest,
        })
    }
}

impl IndexWriter for VectorStore {
    fn create<E>(&self, embedder: &mut E, documents: Vec<TextDocument>) -> MatcherResult<VectorIndex>
    where
        E: Embedder + ?Sized,
    {
        if documents.is_empty() {
            return Err(MatcherError::EmptyCorpus);
        }
        ensure_texts(&documents)?;

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors = embed_texts(embedder, &texts)?;
        let dimensions = common_dimensions(&vectors)?;

        let index = new_index(dimensions, self.metric, vectors.len())?;
        for (key, vector) in vectors.iter().enumerate() {
            index.add(key as u64, vector.as_slice()).map_err(index_error)?;
        }

        let mut store = VectorIndex {
            location: self.location.clone(),
            index,
            manifest: StoreManifest {
                dimensions,
                metric: self.metric,
                updated_at: Utc::now(),
                documents,
            },
        };
        store.save()?;

        log::info!(
            "Stored {} documents at {}",
            store.len(),
            self.location.display()
        );
        Ok(store)
    }

    fn append<E>(&self, embedder: &mut E, documents: Vec<TextDocument>) -> MatcherResult<AppendReport>
    where
        E: Embedder + ?Sized,
    {
        if documents.is_empty() {
            return Err(MatcherError::EmptyCorpus);
        }
        ensure_texts(&documents)?;

        if !self.exists() {
            let plan = plan_append(&[], documents, self.policy);
            let store = self.create(embedder, plan.additions)?;
            return Ok(AppendReport {
                added: store.len(),
                replaced: 0,
                skipped: plan.skipped,
                total: store.len(),
            });
        }

        let mut store = self.load()?;
        let plan = plan_append(store.documents(), documents, self.policy);
        if plan.is_empty() {
            log::info!(
                "Nothing to append at {}: {} documents skipped",
                self.location.display(),
                plan.skipped
            );
            return Ok(AppendReport {
                skipped: plan.skipped,
                total: store.len(),
                ..Default::default()
            });
        }

        let texts: Vec<String> = plan
            .replacements
            .values()
            .chain(plan.additions.iter())
            .map(|d| d.text.clone())
            .collect();
        let vectors = embed_texts(embedder, &texts)?;
        let dimensions = common_dimensions(&vectors)?;
        if dimensions != store.dimensions() {
            return Err(MatcherError::DimensionMismatch {
                expected: store.dimensions(),
                actual: dimensions,
            });
        }

        let mut vectors = vectors.into_iter();
        store
            .index
            .reserve(store.index.size() + texts.len())
            .map_err(index_error)?;

        let replaced = plan.replacements.len();
        for (position, document) in plan.replacements {
            let vector = vectors.next().ok_or(MatcherError::EmptyCorpus)?;
            store.index.remove(position as u64).map_err(index_error)?;
            store
                .index
                .add(position as u64, vector.as_slice())
                .map_err(index_error)?;
            store.manifest.documents[position] = document;
        }

        let added = plan.additions.len();
        for (document, vector) in plan.additions.into_iter().zip(vectors) {
            let key = store.manifest.documents.len() as u64;
            store.index.add(key, vector.as_slice()).map_err(index_error)?;
            store.manifest.documents.push(document);
        }

        store.save()?;

        log::info!(
            "Appended {added} documents ({replaced} replaced, {} skipped) at {}; {} stored",
            plan.skipped,
            self.location.display(),
            store.len()
        );

        Ok(AppendReport {
            added,
            replaced,
            skipped: plan.skipped,
            total: store.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AppendPolicy, plan_append};
    use crate::domain::document::TextDocument;

    fn doc(id: &str, text: &str) -> TextDocument {
        TextDocument::new(id, id, text)
    }

    #[test]
    fn duplicate_policy_keeps_everything() {
        let existing = vec![doc("a", "one")];

        let plan = plan_append(&existing, vec![doc("a", "two")], AppendPolicy::Duplicate);

        assert_eq!(plan.additions, vec![doc("a", "two")]);
        assert!(plan.replacements.is_empty());
        assert_eq!(plan.skipped, 0);
    }

    #[test]
    fn skip_policy_drops_stored_and_repeated_ids() {
        let existing = vec![doc("a", "one")];

        let plan = plan_append(
            &existing,
            vec![doc("a", "two"), doc("b", "three"), doc("b", "four")],
            AppendPolicy::Skip,
        );

        assert_eq!(plan.additions, vec![doc("b", "three")]);
        assert_eq!(plan.skipped, 2);
    }

    #[test]
    fn replace_policy_targets_stored_position() {
        let existing = vec![doc("a", "one"), doc("b", "two")];

        let plan = plan_append(
            &existing,
            vec![doc("b", "new two"), doc("c", "three"), doc("c", "new three")],
            AppendPolicy::Replace,
        );

        assert_eq!(plan.replacements.len(), 1);
        assert_eq!(plan.replacements.get(&1), Some(&doc("b", "new two")));
        assert_eq!(plan.additions, vec![doc("c", "new three")]);
        assert_eq!(plan.skipped, 0);
    }
}
