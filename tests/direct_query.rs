mod common;

use common::{TestStore, VocabularyEmbedder, job, resume};
use resume_matcher::errors::MatcherError;
use resume_matcher::models::config::DistanceMetric;
use resume_matcher::processing::query::{match_resumes, rank_candidates};
use resume_matcher::repository::{IndexReader, IndexWriter};

fn candidates() -> Vec<String> {
    vec![
        "Frontend React".to_string(),
        "Java backend".to_string(),
        "Python data pipelines".to_string(),
    ]
}

#[test]
fn rank_candidates_returns_every_candidate_best_first() {
    let mut embedder = VocabularyEmbedder::new();

    let ranked = rank_candidates(
        &mut embedder,
        "5 years Java backend development",
        &candidates(),
        DistanceMetric::L2sq,
    )
    .expect("ranking should succeed");

    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].0, "Java backend");
    assert!(ranked.windows(2).all(|pair| pair[0].1 >= pair[1].1));
}

#[test]
fn identical_text_scores_one_with_squared_euclidean() {
    let mut embedder = VocabularyEmbedder::new();

    let ranked = rank_candidates(
        &mut embedder,
        "Java backend",
        &candidates(),
        DistanceMetric::L2sq,
    )
    .unwrap();

    assert_eq!(ranked[0].0, "Java backend");
    assert!((ranked[0].1 - 1.0).abs() < 1e-4);
}

#[test]
fn rank_candidates_requires_candidates() {
    let mut embedder = VocabularyEmbedder::new();

    let result = rank_candidates(&mut embedder, "Java", &[], DistanceMetric::L2sq);

    assert!(matches!(result, Err(MatcherError::EmptyCorpus)));
}

#[test]
fn match_resumes_searches_persisted_job_index() {
    let dir = TestStore::new();
    let mut embedder = VocabularyEmbedder::new();
    dir.store("jd")
        .create(
            &mut embedder,
            vec![
                job("backend.txt", "Java backend"),
                job("frontend.txt", "Frontend React"),
            ],
        )
        .unwrap();
    dir.store("res")
        .create(
            &mut embedder,
            vec![
                resume("alice.json", "5 years Java backend development"),
                resume("bob.json", "React and CSS expert"),
            ],
        )
        .unwrap();

    let resumes = dir.store("res").load().unwrap();
    let jobs = dir.store("jd").load().unwrap();
    let results = match_resumes(&mut embedder, &resumes, &jobs).expect("matching should succeed");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].resume_title, "alice.json");
    assert_eq!(results[0].matches[0].0, "backend.txt");
    assert_eq!(results[1].resume_title, "bob.json");
    assert_eq!(results[1].matches[0].0, "frontend.txt");
    assert!(results.iter().all(|r| r.matches.len() == 2));
}

#[test]
fn rank_candidates_returns_all_of_a_large_candidate_set() {
    let mut embedder = VocabularyEmbedder::with_dimensions(256);
    let candidates: Vec<String> = (0..3000)
        .map(|i| format!("tok{} tok{}", i, (i * 7) % 3000))
        .collect();

    let ranked = rank_candidates(&mut embedder, "tok5 tok7", &candidates, DistanceMetric::L2sq)
        .expect("ranking should succeed");

    assert_eq!(ranked.len(), candidates.len());
    assert!(ranked.windows(2).all(|pair| pair[0].1 >= pair[1].1));
}

#[test]
fn match_resumes_scores_every_job_in_a_large_store() {
    let dir = TestStore::new();
    let mut embedder = VocabularyEmbedder::with_dimensions(256);
    let jobs: Vec<_> = (0..2000)
        .map(|i| job(&format!("job-{i}.txt"), &format!("role{} skill{}", i, i % 97)))
        .collect();
    dir.store("jd").create(&mut embedder, jobs).unwrap();
    dir.store("res")
        .create(&mut embedder, vec![resume("alice.json", "role5 skill5")])
        .unwrap();

    let resumes = dir.store("res").load().unwrap();
    let jobs = dir.store("jd").load().unwrap();
    let results = match_resumes(&mut embedder, &resumes, &jobs).expect("matching should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].matches.len(), 2000);
    assert_eq!(results[0].matches[0].0, "job-5.txt");
}
