#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Config;
use crate::documents::{Document, load_documents};
use crate::generation::{generate_answer, highlight_answer};
use crate::index::{IndexEntry, VectorIndex};
use crate::retrieval::retrieve;
use crate::services::{EmbeddingProvider, GenerationProvider, OpenAiClient};
use crate::{QaError, Result};

/// Answer to a question, with source attribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
    /// Source document paths, ordered by retrieval rank, de-duplicated
    pub sources: Vec<String>,
    /// Answer with matched context sentences wrapped in `**bold**`,
    /// present only when highlighting changed anything
    pub highlighted_answer: Option<String>,
}

/// Outcome of an ingest/rebuild operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

/// Snapshot of the pipeline's index state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub initialized: bool,
    pub documents: usize,
    pub chunks: usize,
    pub dimension: Option<usize>,
}

/// Orchestrates the retrieval-augmented QA pipeline.
///
/// Owns the vector index behind a read-write lock: `ask` calls run
/// concurrently against a cloned `Arc` snapshot, while rebuilds construct a
/// replacement index off to the side and publish it atomically under the
/// write lock. A failed rebuild never unpublishes the previous index.
pub struct QaPipeline {
    config: Config,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    index: RwLock<Option<Arc<VectorIndex>>>,
}

impl QaPipeline {
    /// Create a pipeline with injected embedding/generation capabilities
    #[inline]
    pub fn new(
        config: Config,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            config,
            embedder,
            generator,
            index: RwLock::new(None),
        }
    }

    /// Create a pipeline backed by the configured OpenAI-compatible service,
    /// resolving the API key from the environment
    #[inline]
    pub fn from_env(config: Config) -> Result<Self> {
        let client = Arc::new(OpenAiClient::from_env(&config.service)?);
        Ok(Self::new(
            config,
            Arc::clone(&client) as Arc<dyn EmbeddingProvider>,
            client,
        ))
    }

    /// Load the persisted index when present, otherwise rebuild from the
    /// documents directory
    #[inline]
    pub async fn initialize(&self) -> Result<()> {
        let index_path = self.config.index_path();

        if index_path.exists() {
            info!("Loading existing vector index from {}", index_path.display());
            let index = VectorIndex::load(&index_path)?;
            self.publish(index).await;
            Ok(())
        } else {
            info!("No persisted index found; building from documents");
            self.rebuild().await.map(|_| ())
        }
    }

    /// Answer a question from the indexed documents
    #[inline]
    pub async fn ask(&self, question: &str) -> Result<AnswerRecord> {
        // Clone the snapshot out of the lock so concurrent asks and a
        // rebuild never contend during external service calls
        let snapshot = { self.index.read().await.clone() };
        let index = snapshot.ok_or(QaError::NotInitialized)?;

        info!("Question: {}", question);

        let retrieval = retrieve(
            self.embedder.as_ref(),
            &index,
            question,
            self.config.retrieval.top_k,
        )?;

        let generated = generate_answer(
            self.generator.as_ref(),
            question,
            &retrieval,
            self.config.service.max_prompt_tokens,
        )?;

        let highlighted_answer = highlight_answer(&generated.answer, &generated.contexts);

        info!(
            "Answered question with {} sources",
            generated.sources.len()
        );

        Ok(AnswerRecord {
            question: question.to_string(),
            answer: generated.answer,
            sources: generated.sources,
            highlighted_answer,
        })
    }

    /// Rebuild the index wholesale from an explicit document batch.
    ///
    /// The replacement index is built, persisted, and only then published;
    /// on any failure the previously published index remains queryable and
    /// its on-disk blob untouched.
    #[inline]
    pub async fn ingest(&self, documents: Vec<Document>) -> Result<IngestReport> {
        if documents.is_empty() {
            return Err(QaError::EmptyInput);
        }

        info!("Ingesting {} documents", documents.len());

        let chunks = crate::chunking::chunk_documents(&documents, &self.config.chunking)?;
        if chunks.is_empty() {
            return Err(QaError::EmptyInput);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        if vectors.len() != chunks.len() {
            return Err(QaError::Service(format!(
                "embedding count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let entries: Vec<IndexEntry> = vectors
            .into_iter()
            .zip(chunks)
            .map(|(vector, chunk)| IndexEntry {
                vector,
                chunk: chunk.into(),
            })
            .collect();

        let report = IngestReport {
            documents: documents.len(),
            chunks: entries.len(),
        };

        let index = VectorIndex::build(entries)?;
        index.save(&self.config.index_path())?;
        self.publish(index).await;

        info!(
            "Ingest complete: {} documents, {} chunks",
            report.documents, report.chunks
        );
        Ok(report)
    }

    /// Rebuild the index from the configured documents directory
    #[inline]
    pub async fn rebuild(&self) -> Result<IngestReport> {
        let documents = load_documents(&self.config.documents_path())?;
        if documents.is_empty() {
            return Err(QaError::EmptyInput);
        }
        self.ingest(documents).await
    }

    /// Report whether the index is initialized and its current counts
    #[inline]
    pub async fn status(&self) -> IndexStatus {
        let guard = self.index.read().await;
        guard.as_ref().map_or(
            IndexStatus {
                initialized: false,
                documents: 0,
                chunks: 0,
                dimension: None,
            },
            |index| IndexStatus {
                initialized: true,
                documents: index.document_count(),
                chunks: index.len(),
                dimension: Some(index.dimension()),
            },
        )
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn publish(&self, index: VectorIndex) {
        debug!(
            "Publishing index with {} entries ({} documents)",
            index.len(),
            index.document_count()
        );
        let mut guard = self.index.write().await;
        *guard = Some(Arc::new(index));
    }
}
