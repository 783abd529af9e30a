//! Configuration model loaded from external sources.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{MatcherError, MatcherResult};

/// Default location of the optional YAML configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "config/default.yaml";

/// Prefix of environment variables overriding file settings,
/// e.g. `MATCHER__STORE__APPEND_POLICY=skip`.
pub const ENV_PREFIX: &str = "MATCHER";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    pub output: OutputConfig,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    Fastembed,
    Openai,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    /// Fastembed model name or remote model id, depending on `provider`.
    pub model: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub api_base: String,
    pub api_key: Option<String>,
    pub batch_size: Option<usize>,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: None,
            cache_dir: None,
            api_base: "https://api.openai.com/v1/".to_string(),
            api_key: None,
            batch_size: None,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// What `append` does with a document whose id is already stored.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppendPolicy {
    #[default]
    Duplicate,
    Skip,
    Replace,
}

/// Distance metric of persisted and transient indices.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance.
    #[default]
    L2sq,
    /// Inner product distance, `1 - dot`.
    Ip,
    /// Cosine distance, `1 - cos`.
    Cos,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub resume_path: PathBuf,
    pub jd_path: PathBuf,
    pub append_policy: AppendPolicy,
    pub metric: DistanceMetric,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            resume_path: PathBuf::from("vectorstore/res"),
            jd_path: PathBuf::from("vectorstore/jd"),
            append_policy: AppendPolicy::default(),
            metric: DistanceMetric::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub matrix_path: PathBuf,
    pub delimiter: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            matrix_path: PathBuf::from("jd_resume_similarity_matrix.csv"),
            delimiter: ",".to_string(),
        }
    }
}

impl OutputConfig {
    /// Delimiter as a single byte. Anything but one ASCII character is a
    /// configuration error.
    pub fn delimiter_byte(&self) -> MatcherResult<u8> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(MatcherError::Config(::config::ConfigError::Message(format!(
                "output.delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )))),
        }
    }
}

impl AppConfig {
    /// Load defaults, then the YAML file (if it exists), then `MATCHER__*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> MatcherResult<Self> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(file).required(path.is_some()))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.output.delimiter_byte()?;
        Ok(config)
    }
}
