#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::documents::Document;
use crate::{QaError, Result};

/// A chunk of document text ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    /// The chunk text
    pub content: String,
    /// Path of the document this chunk was cut from
    pub doc_path: String,
    /// The index of this chunk within the document
    pub chunk_index: usize,
    /// Byte offset of the chunk start within the document
    pub offset: usize,
    /// Estimated token count
    pub token_count: usize,
}

/// Configuration for document chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Split a document into overlapping fixed-size character windows.
///
/// Windows advance by `chunk_size - chunk_overlap` characters, so every
/// character of the input lands in at least one chunk and consecutive chunks
/// share exactly `chunk_overlap` characters (the final chunk may be shorter).
/// Deterministic for a given input and configuration.
#[inline]
pub fn chunk_document(document: &Document, config: &ChunkingConfig) -> Result<Vec<DocumentChunk>> {
    validate_chunking(config)?;

    let content = document.content.as_str();
    if content.is_empty() {
        return Ok(Vec::new());
    }

    // Char-start byte offsets, plus the end sentinel, so windows measured in
    // characters always slice on UTF-8 boundaries.
    let mut boundaries: Vec<usize> = content.char_indices().map(|(i, _)| i).collect();
    boundaries.push(content.len());
    let char_count = boundaries.len() - 1;

    let step = config.chunk_size - config.chunk_overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + config.chunk_size).min(char_count);
        let byte_start = boundaries[start];
        let byte_end = boundaries[end];
        let text = &content[byte_start..byte_end];

        chunks.push(DocumentChunk {
            content: text.to_string(),
            doc_path: document.path.clone(),
            chunk_index: chunks.len(),
            offset: byte_start,
            token_count: estimate_token_count(text),
        });

        if end == char_count {
            break;
        }
        start += step;
    }

    debug!(
        "Chunked document '{}' ({} chars) into {} chunks",
        document.path,
        char_count,
        chunks.len()
    );

    Ok(chunks)
}

/// Chunk a batch of documents, preserving document order
#[inline]
pub fn chunk_documents(
    documents: &[Document],
    config: &ChunkingConfig,
) -> Result<Vec<DocumentChunk>> {
    let mut chunks = Vec::new();
    for document in documents {
        chunks.extend(chunk_document(document, config)?);
    }
    Ok(chunks)
}

fn validate_chunking(config: &ChunkingConfig) -> Result<()> {
    if config.chunk_size == 0 {
        return Err(QaError::Config(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    if config.chunk_overlap >= config.chunk_size {
        return Err(QaError::Config(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            config.chunk_overlap, config.chunk_size
        )));
    }
    Ok(())
}

/// Estimate token count using a simple heuristic
/// This is a rough approximation - actual tokenization would be more accurate
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words for English text
    // Add extra tokens for punctuation and special characters
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}
