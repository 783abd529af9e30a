use std::thread;
use std::time::Duration;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::errors::{MatcherError, MatcherResult};
use crate::models::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::processing::openai::OpenAiEmbedder;

/// Handle to an embedding backend.
///
/// Backends must return one vector per input text, all of the same length.
pub trait Embedder {
    /// Short backend name used in logs and errors.
    fn provider(&self) -> &str;

    fn embed_many(&mut self, texts: &[String]) -> MatcherResult<Vec<Vec<f32>>>;

    fn embed_one(&mut self, text: &str) -> MatcherResult<Vec<f32>> {
        let provider = self.provider().to_string();
        self.embed_many(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or(MatcherError::EmbeddingService {
                provider,
                message: "backend returned no embedding".to_string(),
            })
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn provider(&self) -> &str {
        (**self).provider()
    }

    fn embed_many(&mut self, texts: &[String]) -> MatcherResult<Vec<Vec<f32>>> {
        (**self).embed_many(texts)
    }
}

/// Embed a non-empty batch and check that the backend kept its contract.
pub fn embed_texts<E>(embedder: &mut E, texts: &[String]) -> MatcherResult<Vec<Vec<f32>>>
where
    E: Embedder + ?Sized,
{
    if texts.is_empty() {
        return Err(MatcherError::EmptyCorpus);
    }

    let vectors = embedder.embed_many(texts)?;
    if vectors.len() != texts.len() {
        return Err(MatcherError::EmbeddingService {
            provider: embedder.provider().to_string(),
            message: format!(
                "expected {} embeddings, received {}",
                texts.len(),
                vectors.len()
            ),
        });
    }
    common_dimensions(&vectors)?;

    log::debug!(
        "Embedded {} texts with {}",
        vectors.len(),
        embedder.provider()
    );
    Ok(vectors)
}

/// Return the shared dimensionality of `vectors`.
///
/// Fails with [`MatcherError::DimensionMismatch`] when lengths differ and
/// with [`MatcherError::EmptyCorpus`] when there is nothing to inspect.
pub fn common_dimensions(vectors: &[Vec<f32>]) -> MatcherResult<usize> {
    let expected = vectors.first().ok_or(MatcherError::EmptyCorpus)?.len();
    match vectors.iter().find(|vector| vector.len() != expected) {
        Some(vector) => Err(MatcherError::DimensionMismatch {
            expected,
            actual: vector.len(),
        }),
        None => Ok(expected),
    }
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}

/// Local ONNX embedding model.
pub struct FastEmbedder {
    model: TextEmbedding,
    batch_size: Option<usize>,
}

impl FastEmbedder {
    pub fn new(config: &EmbeddingConfig) -> MatcherResult<Self> {
        let model = fastembed_model(config.model.as_deref())?;
        let mut options = InitOptions::new(model);
        if let Some(cache_dir) = &config.cache_dir {
            options = options.with_cache_dir(cache_dir.clone());
        }

        let model = TextEmbedding::try_new(options).map_err(|error| {
            MatcherError::EmbeddingService {
                provider: "fastembed".to_string(),
                message: format!("Failed to initialize embedder: {error:?}"),
            }
        })?;

        Ok(Self {
            model,
            batch_size: config.batch_size,
        })
    }
}

impl Embedder for FastEmbedder {
    fn provider(&self) -> &str {
        "fastembed"
    }

    fn embed_many(&mut self, texts: &[String]) -> MatcherResult<Vec<Vec<f32>>> {
        self.model
            .embed(texts.to_vec(), self.batch_size)
            .map_err(|error| MatcherError::EmbeddingService {
                provider: "fastembed".to_string(),
                message: format!("Failed to generate embedding: {error:?}"),
            })
    }
}

fn fastembed_model(name: Option<&str>) -> MatcherResult<EmbeddingModel> {
    let model = match name.map(str::to_ascii_lowercase).as_deref() {
        None | Some("multilingual-e5-large") => EmbeddingModel::MultilingualE5Large,
        Some("multilingual-e5-small") => EmbeddingModel::MultilingualE5Small,
        Some("all-minilm-l6-v2") => EmbeddingModel::AllMiniLML6V2,
        Some("bge-small-en-v1.5") => EmbeddingModel::BGESmallENV15,
        Some("bge-base-en-v1.5") => EmbeddingModel::BGEBaseENV15,
        Some(other) => {
            return Err(MatcherError::EmbeddingService {
                provider: "fastembed".to_string(),
                message: format!("unsupported model {other}"),
            });
        }
    };
    Ok(model)
}

/// Retries retryable backend failures with exponential backoff.
pub struct RetryingEmbedder<E> {
    inner: E,
    max_retries: u32,
    backoff: Duration,
}

impl<E: Embedder> RetryingEmbedder<E> {
    pub fn new(inner: E, max_retries: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_retries,
            backoff,
        }
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Embedder> Embedder for RetryingEmbedder<E> {
    fn provider(&self) -> &str {
        self.inner.provider()
    }

    fn embed_many(&mut self, texts: &[String]) -> MatcherResult<Vec<Vec<f32>>> {
        let mut attempt = 0;
        loop {
            match self.inner.embed_many(texts) {
                Err(error) if error.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff.saturating_mul(1 << attempt.min(16));
                    attempt += 1;
                    log::warn!(
                        "Embedding attempt {attempt}/{} failed, retrying in {delay:?}: {error}",
                        self.max_retries
                    );
                    thread::sleep(delay);
                }
                result => return result,
            }
        }
    }
}

/// Build the configured backend wrapped in retry handling.
pub fn embedder_from_config(config: &EmbeddingConfig) -> MatcherResult<Box<dyn Embedder>> {
    let backoff = Duration::from_millis(config.retry_backoff_ms);
    let embedder: Box<dyn Embedder> = match config.provider {
        EmbeddingProviderKind::Fastembed => Box::new(RetryingEmbedder::new(
            FastEmbedder::new(config)?,
            config.max_retries,
            backoff,
        )),
        EmbeddingProviderKind::Openai => Box::new(RetryingEmbedder::new(
            OpenAiEmbedder::new(config)?,
            config.max_retries,
            backoff,
        )),
    };
    log::info!("Using {} embeddings", embedder.provider());
    Ok(embedder)
}
