mod common;

use common::{TestStore, VocabularyEmbedder, resume};
use resume_matcher::domain::document::RawDocument;
use resume_matcher::processing::corpus::{build_resume_documents, store_batch};
use resume_matcher::repository::{IndexReader, IndexWriter};
use resume_matcher::sources::JsonRecordExtractor;

fn raw(id: &str, text: &str) -> RawDocument {
    RawDocument {
        id: id.to_string(),
        title: id.to_string(),
        text: text.to_string(),
    }
}

#[test]
fn batch_with_no_extractable_records_reports_skips() {
    let dir = TestStore::new();
    let mut embedder = VocabularyEmbedder::new();
    let store = dir.store("res");
    store
        .create(&mut embedder, vec![resume("alice.json", "Skills: Java")])
        .unwrap();
    let calls_before = embedder.calls;

    let outcome = build_resume_documents(
        &JsonRecordExtractor,
        &[raw("broken.json", "not json"), raw("empty.json", "{}")],
    );
    let report =
        store_batch(&mut embedder, &store, outcome, 1).expect("skips should not fail the run");

    assert_eq!(report.added, 0);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.total, 1);
    assert_eq!(embedder.calls, calls_before);
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn batch_with_no_documents_and_no_store_reports_zero_total() {
    let dir = TestStore::new();
    let mut embedder = VocabularyEmbedder::new();
    let store = dir.store("res");

    let outcome = build_resume_documents(&JsonRecordExtractor, &[raw("broken.json", "nope")]);
    let report = store_batch(&mut embedder, &store, outcome, 0).unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.total, 0);
    assert!(!store.exists());
}

#[test]
fn partial_batch_counts_extraction_skips_with_stored_documents() {
    let dir = TestStore::new();
    let mut embedder = VocabularyEmbedder::new();
    let store = dir.store("res");

    let outcome = build_resume_documents(
        &JsonRecordExtractor,
        &[
            raw("ok.json", r#"{"skills": ["Rust"]}"#),
            raw("broken.json", "not json"),
        ],
    );
    let report = store_batch(&mut embedder, &store, outcome, 2).unwrap();

    assert_eq!(report.added, 1);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.total, 1);
}
