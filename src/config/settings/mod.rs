#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::chunking::ChunkingConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Settings for the OpenAI-compatible embedding and generation API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    /// The key itself is never written to the config file.
    pub api_key_env: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub batch_size: u32,
    /// Upper bound on the estimated token count of an assembled prompt
    pub max_prompt_tokens: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            generation_model: "gpt-4o-mini".to_string(),
            timeout_seconds: 30,
            retry_attempts: 3,
            batch_size: 16,
            max_prompt_tokens: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the source documents; relative paths resolve
    /// against the config base directory
    pub documents_dir: PathBuf,
    /// Location of the serialized vector index
    pub index_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("documents"),
            index_path: PathBuf::from("vector_index.json"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid timeout: {0} (must be between 1 and 300 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid retry attempts: {0} (must be between 1 and 10)")]
    InvalidRetryAttempts(u32),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid API key variable name (cannot be empty)")]
    InvalidApiKeyEnv,
    #[error("Invalid top_k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid max prompt tokens: {0} (must be at least 256)")]
    InvalidMaxPromptTokens(usize),
    #[error("Invalid chunk size: {0} (must be between 1 and 100000 characters)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                service: ServiceConfig::default(),
                chunking: ChunkingConfig::default(),
                retrieval: RetrievalConfig::default(),
                storage: StorageConfig::default(),
                base_dir: config_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Load configuration from the default config directory
    #[inline]
    pub fn load_default() -> Result<Self> {
        let config_dir = Self::config_dir()?;
        Self::load(config_dir)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.base_dir.display()
            )
        })?;

        let config_path = self.base_dir.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.service.base_url)
            .map_err(|_| ConfigError::InvalidUrl(self.service.base_url.clone()))?;

        if self.service.api_key_env.trim().is_empty() {
            return Err(ConfigError::InvalidApiKeyEnv);
        }
        if self.service.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(
                self.service.embedding_model.clone(),
            ));
        }
        if self.service.generation_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(
                self.service.generation_model.clone(),
            ));
        }
        if !(1..=300).contains(&self.service.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.service.timeout_seconds));
        }
        if !(1..=10).contains(&self.service.retry_attempts) {
            return Err(ConfigError::InvalidRetryAttempts(
                self.service.retry_attempts,
            ));
        }
        if !(1..=1000).contains(&self.service.batch_size) {
            return Err(ConfigError::InvalidBatchSize(self.service.batch_size));
        }
        if self.service.max_prompt_tokens < 256 {
            return Err(ConfigError::InvalidMaxPromptTokens(
                self.service.max_prompt_tokens,
            ));
        }
        if !(1..=100).contains(&self.retrieval.top_k) {
            return Err(ConfigError::InvalidTopK(self.retrieval.top_k));
        }
        if !(1..=100_000).contains(&self.chunking.chunk_size) {
            return Err(ConfigError::InvalidChunkSize(self.chunking.chunk_size));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                self.chunking.chunk_overlap,
                self.chunking.chunk_size,
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::DirectoryError)?;
        Ok(base.join("docs-qa"))
    }

    /// Documents directory, resolved against the base dir when relative
    #[inline]
    pub fn documents_path(&self) -> PathBuf {
        self.resolve(&self.storage.documents_dir)
    }

    /// Index file location, resolved against the base dir when relative
    #[inline]
    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.storage.index_path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            storage: StorageConfig::default(),
            base_dir: PathBuf::new(),
        }
    }
}
