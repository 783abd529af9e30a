use crate::domain::document::{CorpusKind, RawDocument, TextDocument};
use crate::domain::record::StructuredRecord;
use crate::errors::{MatcherError, MatcherResult};
use crate::processing::embedding::Embedder;
use crate::repository::{AppendReport, IndexReader, IndexWriter, VectorStore};
use crate::sources::RecordExtractor;

fn field_line(label: &str, values: Option<&Vec<String>>) -> Option<String> {
    match values {
        Some(values) if !values.is_empty() => Some(format!("{label}: {}", values.join(", "))),
        Some(_) | None => None,
    }
}

/// Render a record as one deterministic text block.
///
/// Field order and separators are fixed so the same record always yields
/// byte-identical text.
pub fn record_text(record: &StructuredRecord) -> String {
    let mut lines: Vec<String> = [
        ("Skills", record.skills.as_ref()),
        ("Education", record.education.as_ref()),
        ("Projects", record.projects.as_ref()),
        ("Project Skills", record.project_skills.as_ref()),
        ("Achievements", record.achievements.as_ref()),
    ]
    .into_iter()
    .filter_map(|(label, values)| field_line(label, values))
    .collect();

    for experience in &record.experience {
        let mut line = format!(
            "Experience at {} for {}",
            experience.company, experience.duration
        );
        if let Some(skills) = experience.skills.as_ref().filter(|s| !s.is_empty()) {
            line.push_str(&format!(" | Skills: {}", skills.join(", ")));
        }
        if let Some(impact) = experience.impact.as_ref().filter(|s| !s.is_empty()) {
            line.push_str(&format!(" | Impact: {}", impact.join(", ")));
        }
        lines.push(line);
    }

    lines.join("\n")
}

/// Turn a résumé record into a storable document.
pub fn resume_document(record: &StructuredRecord, id: &str, title: &str) -> TextDocument {
    TextDocument::new(id, title, record_text(record))
        .with_metadata(CorpusKind::Resume.id_key(), id)
        .with_metadata("title", title)
}

/// Job descriptions are stored as their raw text.
pub fn job_description_document(raw: &RawDocument) -> TextDocument {
    TextDocument::new(raw.id.as_str(), raw.title.as_str(), raw.text.as_str())
        .with_metadata(CorpusKind::JobDescription.id_key(), raw.id.as_str())
        .with_metadata("title", raw.title.as_str())
        .with_metadata("filename", raw.id.as_str())
}

/// Result of a best-effort batch: the documents that made it plus the
/// ids that were dropped and why.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub documents: Vec<TextDocument>,
    pub skipped: Vec<(String, MatcherError)>,
}

impl BatchOutcome {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    fn skip(&mut self, id: &str, error: MatcherError) {
        log::warn!("Skipping {id}: {error}");
        self.skipped.push((id.to_string(), error));
    }
}

/// Extract and serialize every raw résumé, skipping the ones that fail.
pub fn build_resume_documents<X>(extractor: &X, raws: &[RawDocument]) -> BatchOutcome
where
    X: RecordExtractor + ?Sized,
{
    let mut outcome = BatchOutcome::default();

    for raw in raws {
        let record = match extractor.extract(raw) {
            Ok(record) => record,
            Err(error) => {
                outcome.skip(&raw.id, error);
                continue;
            }
        };

        let document = resume_document(&record, &raw.id, &raw.title);
        if document.text.is_empty() {
            outcome.skip(&raw.id, MatcherError::EmptyDocument { id: raw.id.clone() });
            continue;
        }
        outcome.documents.push(document);
    }

    outcome
}

/// Wrap raw job descriptions, skipping the ones without text.
pub fn build_job_description_documents(raws: &[RawDocument]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for raw in raws {
        if raw.text.trim().is_empty() {
            outcome.skip(&raw.id, MatcherError::EmptyDocument { id: raw.id.clone() });
            continue;
        }
        outcome.documents.push(job_description_document(raw));
    }

    outcome
}

/// Append a best-effort batch to `store`.
///
/// `unreadable` counts raw inputs the source could not read. The returned
/// report folds those and the batch's skipped items into `skipped`. A batch
/// where nothing survived is reported without touching the store.
pub fn store_batch<E>(
    embedder: &mut E,
    store: &VectorStore,
    outcome: BatchOutcome,
    unreadable: usize,
) -> MatcherResult<AppendReport>
where
    E: Embedder + ?Sized,
{
    let skipped = outcome.skipped_count() + unreadable;

    if outcome.documents.is_empty() {
        let total = if store.exists() {
            let index = store.load()?;
            log::debug!(
                "Store at {} last updated {}",
                store.location().display(),
                index.updated_at()
            );
            index.len()
        } else {
            0
        };
        log::warn!(
            "No documents to store into {}: {skipped} skipped, {total} already stored",
            store.location().display()
        );
        return Ok(AppendReport {
            skipped,
            total,
            ..Default::default()
        });
    }

    let mut report = store.append(embedder, outcome.documents)?;
    report.skipped += skipped;
    log::info!(
        "Stored {} documents into {} ({} replaced, {} skipped, {} total)",
        report.added,
        store.location().display(),
        report.replaced,
        report.skipped,
        report.total
    );
    Ok(report)
}
