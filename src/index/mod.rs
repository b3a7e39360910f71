
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chunking::DocumentChunk;
use crate::{QaError, Result};

/// Chunk metadata stored alongside its embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Path of the source document
    pub doc_path: String,
    /// The actual text content of the chunk
    pub content: String,
    /// Index of this chunk within its document (for ordering)
    pub chunk_index: usize,
    /// Byte offset of the chunk start within the document
    pub offset: usize,
    /// Estimated token count of the chunk
    pub token_count: usize,
}

impl From<DocumentChunk> for ChunkRecord {
    #[inline]
    fn from(chunk: DocumentChunk) -> Self {
        Self {
            doc_path: chunk.doc_path,
            content: chunk.content,
            chunk_index: chunk.chunk_index,
            offset: chunk.offset,
            token_count: chunk.token_count,
        }
    }
}

/// Pairing of an embedding vector and the chunk it represents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub chunk: ChunkRecord,
}

/// Result of a nearest-neighbor search
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub chunk: ChunkRecord,
    pub similarity: f32,
}

/// Flat in-memory vector index with cosine-similarity search and JSON
/// persistence.
///
/// An index value only exists after a successful [`VectorIndex::build`], so
/// "search before build" is unrepresentable here; the pipeline models the
/// uninitialized state as `Option<VectorIndex>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    dimension: usize,
    built_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build an index wholesale from (vector, chunk) pairs.
    ///
    /// Fails with [`QaError::EmptyInput`] on an empty entry list and with
    /// [`QaError::Service`] when the embedding service returned vectors of
    /// inconsistent dimension.
    #[inline]
    pub fn build(entries: Vec<IndexEntry>) -> Result<Self> {
        let Some(first) = entries.first() else {
            return Err(QaError::EmptyInput);
        };

        let dimension = first.vector.len();
        if dimension == 0 {
            return Err(QaError::Service(
                "embedding service returned zero-dimension vectors".to_string(),
            ));
        }

        for entry in &entries {
            if entry.vector.len() != dimension {
                return Err(QaError::Service(format!(
                    "embedding dimension mismatch: expected {}, got {} for chunk {} of '{}'",
                    dimension,
                    entry.vector.len(),
                    entry.chunk.chunk_index,
                    entry.chunk.doc_path
                )));
            }
        }

        info!(
            "Built vector index with {} entries ({} dimensions)",
            entries.len(),
            dimension
        );

        Ok(Self {
            dimension,
            built_at: Utc::now(),
            entries,
        })
    }

    /// Return the `k` entries most similar to the query vector, best first.
    ///
    /// Returns fewer than `k` results when the index holds fewer entries.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<IndexMatch>> {
        if query.len() != self.dimension {
            return Err(QaError::Config(format!(
                "query vector dimension mismatch: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }

        let mut matches: Vec<IndexMatch> = self
            .entries
            .iter()
            .map(|entry| IndexMatch {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(&entry.vector, query),
            })
            .collect();

        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(k);

        debug!("Search returned {} matches (k={})", matches.len(), k);
        Ok(matches)
    }

    /// Serialize the index to `path`, writing a temporary sibling file first
    /// and renaming it into place so a crash never leaves a partial index.
    #[inline]
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                QaError::Storage(format!(
                    "failed to create index directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let blob = serde_json::to_string(self)
            .map_err(|e| QaError::Storage(format!("failed to serialize index: {e}")))?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, blob).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            QaError::Storage(format!(
                "failed to write index file {}: {e}",
                temp_path.display()
            ))
        })?;
        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            QaError::Storage(format!(
                "failed to publish index file {}: {e}",
                path.display()
            ))
        })?;

        info!(
            "Saved vector index ({} entries) to {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Restore an index from `path`. A missing file is a distinct
    /// [`QaError::Storage`] so callers can fall back to a rebuild.
    #[inline]
    pub fn load(path: &Path) -> Result<Self> {
        let blob = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                QaError::Storage(format!("index file not found: {}", path.display()))
            } else {
                QaError::Storage(format!(
                    "failed to read index file {}: {e}",
                    path.display()
                ))
            }
        })?;

        let index: Self = serde_json::from_str(&blob)
            .map_err(|e| QaError::Storage(format!("failed to parse index file: {e}")))?;

        info!(
            "Loaded vector index ({} entries, {} dimensions) from {}",
            index.entries.len(),
            index.dimension,
            path.display()
        );
        Ok(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Number of distinct source documents represented in the index
    #[inline]
    pub fn document_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.chunk.doc_path.as_str())
            .unique()
            .count()
    }
}

/// Cosine similarity between two vectors of equal length.
/// Returns 0.0 when either vector has zero magnitude.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
