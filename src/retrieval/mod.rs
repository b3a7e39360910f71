
use itertools::Itertools;
use tracing::debug;

use crate::Result;
use crate::index::{ChunkRecord, VectorIndex};
use crate::services::EmbeddingProvider;

/// A chunk matched during retrieval, with its similarity to the question
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: ChunkRecord,
    pub similarity: f32,
}

/// Outcome of retrieval for a question
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    /// Matched chunks, best first, content preserved for context assembly
    pub chunks: Vec<RetrievedChunk>,
    /// Source document paths, de-duplicated by first occurrence in rank order
    pub sources: Vec<String>,
}

/// Embed a question and find its `top_k` nearest chunks in the index.
///
/// Embedding failures propagate unchanged; there is no retry at this layer.
#[inline]
pub fn retrieve(
    embedder: &dyn EmbeddingProvider,
    index: &VectorIndex,
    question: &str,
    top_k: usize,
) -> Result<RetrievalResult> {
    let query_vector = embedder.embed(question)?;
    let matches = index.search(&query_vector, top_k)?;

    let chunks: Vec<RetrievedChunk> = matches
        .into_iter()
        .map(|m| RetrievedChunk {
            chunk: m.chunk,
            similarity: m.similarity,
        })
        .collect();

    let sources: Vec<String> = chunks
        .iter()
        .map(|c| c.chunk.doc_path.clone())
        .unique()
        .collect();

    debug!(
        "Retrieved {} chunks from {} sources for question ({} chars)",
        chunks.len(),
        sources.len(),
        question.len()
    );

    Ok(RetrievalResult { chunks, sources })
}
