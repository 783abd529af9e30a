//! One-to-many ranking without touching the persisted stores.
//!
//! Scores here are `1 - distance` as reported by the index. With the
//! default squared Euclidean metric this is only an approximation of
//! similarity for vectors of roughly unit length; it is not cosine
//! similarity and can be negative.

use crate::domain::document::CorpusKind;
use crate::errors::{MatcherError, MatcherResult};
use crate::models::config::DistanceMetric;
use crate::processing::embedding::{Embedder, common_dimensions, embed_texts};
use crate::processing::grouping::group_corpus;
use crate::repository::VectorIndex;
use crate::repository::vector_store::{index_error, new_index};

/// Search the top-k closest vectors to the query embedding.
///
/// Returns `(key, distance)` pairs, closest first. The scan is exhaustive,
/// so `k >= items.len()` yields every item.
pub fn search_top_k<T>(
    query_embedding: &[f32],
    items: &[(u64, T)],
    k: usize,
    metric: DistanceMetric,
) -> MatcherResult<Vec<(u64, f32)>>
where
    T: AsRef<[f32]>,
{
    if items.is_empty() || k == 0 {
        return Ok(Vec::new());
    }

    let index = new_index(query_embedding.len(), metric, items.len())?;

    for (id, embedding) in items {
        let embedding = embedding.as_ref();
        if embedding.len() != query_embedding.len() {
            return Err(MatcherError::DimensionMismatch {
                expected: query_embedding.len(),
                actual: embedding.len(),
            });
        }
        index.add(*id, embedding).map_err(index_error)?;
    }

    let neighbors = index
        .exact_search(query_embedding, k)
        .map_err(index_error)?;

    Ok(neighbors
        .keys
        .iter()
        .zip(neighbors.distances.iter())
        .map(|(&key, &distance)| (key, distance))
        .collect())
}

/// Rank every candidate text against `query`.
pub fn rank_candidates<E>(
    embedder: &mut E,
    query: &str,
    candidates: &[String],
    metric: DistanceMetric,
) -> MatcherResult<Vec<(String, f32)>>
where
    E: Embedder + ?Sized,
{
    if candidates.is_empty() {
        return Err(MatcherError::EmptyCorpus);
    }

    let candidate_vectors = embed_texts(embedder, candidates)?;
    let query_vector = embedder.embed_one(query)?;

    let items: Vec<(u64, Vec<f32>)> = candidate_vectors
        .into_iter()
        .enumerate()
        .map(|(position, vector)| (position as u64, vector))
        .collect();

    let neighbors = search_top_k(&query_vector, &items, candidates.len(), metric)?;

    Ok(neighbors
        .into_iter()
        .filter_map(|(key, distance)| {
            candidates
                .get(key as usize)
                .map(|text| (text.clone(), 1.0 - distance))
        })
        .collect())
}

/// Ranked job descriptions for one résumé.
#[derive(Clone, Debug, PartialEq)]
pub struct ResumeMatches {
    pub resume_title: String,
    /// `(job title, 1 - distance)` in ascending distance order.
    pub matches: Vec<(String, f32)>,
}

/// Rank every stored job description for every stored résumé by searching
/// the persisted job index.
pub fn match_resumes<E>(
    embedder: &mut E,
    resumes: &VectorIndex,
    jobs: &VectorIndex,
) -> MatcherResult<Vec<ResumeMatches>>
where
    E: Embedder + ?Sized,
{
    let grouped = group_corpus(resumes.documents(), CorpusKind::Resume);
    if grouped.is_empty() || jobs.is_empty() {
        return Err(MatcherError::EmptyCorpus);
    }

    let vectors = embed_texts(embedder, &grouped.texts)?;
    let dimensions = common_dimensions(&vectors)?;
    if dimensions != jobs.dimensions() {
        return Err(MatcherError::DimensionMismatch {
            expected: jobs.dimensions(),
            actual: dimensions,
        });
    }

    grouped
        .titles
        .into_iter()
        .zip(vectors)
        .map(|(resume_title, vector)| -> MatcherResult<ResumeMatches> {
            let matches = jobs
                .search(&vector, jobs.len())?
                .into_iter()
                .map(|(document, distance)| (document.title.clone(), 1.0 - distance))
                .collect();
            Ok(ResumeMatches {
                resume_title,
                matches,
            })
        })
        .collect()
}
