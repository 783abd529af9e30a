use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::domain::document::{CorpusKind, TextDocument};
use crate::domain::matrix::SimilarityMatrix;
use crate::errors::{MatcherError, MatcherResult};
use crate::processing::embedding::{Embedder, common_dimensions, embed_texts, normalize_embedding};
use crate::processing::grouping::group_corpus;
use crate::repository::IndexReader;

/// Canonical form of a title for cross-corpus comparison: extension
/// stripped, lower-cased, whitespace, `_` and `-` removed.
pub fn normalize_title(title: &str) -> String {
    let stem = match title.rfind('.') {
        Some(dot) if dot > 0 => &title[..dot],
        _ => title,
    };
    stem.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect()
}

fn dot(left: &[f32], right: &[f32]) -> f32 {
    left.iter().zip(right).map(|(l, r)| l * r).sum()
}

/// Cosine similarity of every résumé vector against every job vector.
///
/// Zero vectors stay unnormalized and therefore score 0 against anything.
pub fn cosine_matrix(resume_vectors: &[Vec<f32>], jd_vectors: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let resumes: Vec<Vec<f32>> = resume_vectors.iter().map(|v| normalize_embedding(v)).collect();
    let jobs: Vec<Vec<f32>> = jd_vectors.iter().map(|v| normalize_embedding(v)).collect();

    resumes
        .iter()
        .map(|resume| jobs.iter().map(|job| dot(resume, job)).collect())
        .collect()
}

/// Group both corpora, drop résumé entries that are really job
/// descriptions, re-embed the grouped texts and score every pair.
pub fn build_similarity_matrix<E>(
    embedder: &mut E,
    resume_documents: &[TextDocument],
    jd_documents: &[TextDocument],
) -> MatcherResult<SimilarityMatrix>
where
    E: Embedder + ?Sized,
{
    let mut resumes = group_corpus(resume_documents, CorpusKind::Resume);
    let jobs = group_corpus(jd_documents, CorpusKind::JobDescription);

    let jd_titles: HashSet<String> = jobs.titles.iter().map(|t| normalize_title(t)).collect();
    let dropped = resumes.retain_titles(|title| !jd_titles.contains(&normalize_title(title)));
    if dropped > 0 {
        log::warn!("Dropped {dropped} job descriptions found in the résumé store");
    }

    if resumes.is_empty() || jobs.is_empty() {
        log::error!(
            "No résumés ({}) or job descriptions ({}) left after filtering",
            resumes.len(),
            jobs.len()
        );
        return Err(MatcherError::EmptyCorpus);
    }

    let resume_vectors = embed_texts(embedder, &resumes.texts)?;
    let jd_vectors = embed_texts(embedder, &jobs.texts)?;

    let expected = common_dimensions(&resume_vectors)?;
    let actual = common_dimensions(&jd_vectors)?;
    if expected != actual {
        return Err(MatcherError::DimensionMismatch { expected, actual });
    }

    Ok(SimilarityMatrix {
        scores: cosine_matrix(&resume_vectors, &jd_vectors),
        resume_titles: resumes.titles,
        jd_titles: jobs.titles,
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write the table next to `output` and move it into place, so a failure
/// never leaves a truncated file behind.
pub fn write_matrix(matrix: &SimilarityMatrix, output: &Path, delimiter: u8) -> MatcherResult<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(output);
    let written = File::create(&tmp)
        .map_err(MatcherError::from)
        .and_then(|file| matrix.write_table(BufWriter::new(file), delimiter));
    if let Err(error) = written {
        fs::remove_file(&tmp).ok();
        return Err(error);
    }
    fs::rename(&tmp, output)?;

    Ok(())
}

/// Load both stores, compute the matrix and write it to `output`.
pub fn generate_similarity_matrix<E, R>(
    embedder: &mut E,
    resume_store: &R,
    jd_store: &R,
    output: &Path,
    delimiter: u8,
) -> MatcherResult<SimilarityMatrix>
where
    E: Embedder + ?Sized,
    R: IndexReader,
{
    let resumes = resume_store.load()?;
    let jobs = jd_store.load()?;
    log::info!(
        "Loaded {} résumé and {} job description fragments",
        resumes.len(),
        jobs.len()
    );

    let matrix = build_similarity_matrix(embedder, resumes.documents(), jobs.documents())?;
    write_matrix(&matrix, output, delimiter)?;

    log::info!(
        "Similarity matrix {}x{} saved to {}",
        matrix.rows(),
        matrix.columns(),
        output.display()
    );
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::{cosine_matrix, normalize_title, write_matrix};
    use crate::domain::matrix::SimilarityMatrix;

    #[test]
    fn normalize_title_collapses_separators_and_extension() {
        assert_eq!(normalize_title("Backend_Engineer.pdf"), "backendengineer");
        assert_eq!(normalize_title("backend engineer"), "backendengineer");
        assert_eq!(normalize_title("Front-End  Dev"), "frontenddev");
        assert_eq!(normalize_title(".hidden"), ".hidden");
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, -1.2, 4.0];

        let matrix = cosine_matrix(&[v.clone()], &[v]);

        assert!((matrix[0][0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn zero_vector_scores_zero_not_nan() {
        let matrix = cosine_matrix(&[vec![0.0, 0.0, 0.0]], &[vec![1.0, 2.0, 3.0], vec![0.0; 3]]);

        assert_eq!(matrix[0], vec![0.0, 0.0]);
        assert!(matrix[0].iter().all(|score| !score.is_nan()));
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let matrix = cosine_matrix(&[vec![1.0, 1.0]], &[vec![-2.0, -2.0]]);

        assert!((matrix[0][0] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn write_matrix_creates_parent_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let output = dir.path().join("out").join("matrix.csv");
        let matrix = SimilarityMatrix {
            resume_titles: vec!["r".to_string()],
            jd_titles: vec!["j".to_string()],
            scores: vec![vec![0.25]],
        };

        write_matrix(&matrix, &output, b',').expect("matrix should be written");

        let written = std::fs::read_to_string(&output).expect("output exists");
        assert_eq!(written, "Resume/JD,j\nr,0.2500\n");
        assert!(!dir.path().join("out").join("matrix.csv.tmp").exists());
    }
}
