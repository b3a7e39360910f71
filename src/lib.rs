use thiserror::Error;

pub type Result<T> = std::result::Result<T, QaError>;

#[derive(Error, Debug)]
pub enum QaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vector index is not initialized; ingest documents first")]
    NotInitialized,

    #[error("Service error: {0}")]
    Service(String),

    #[error("Service call timed out: {0}")]
    Timeout(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("No documents provided for ingestion")]
    EmptyInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chunking;
pub mod commands;
pub mod config;
pub mod documents;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod retrieval;
pub mod services;
