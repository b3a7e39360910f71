use super::*;
use tempfile::TempDir;

/// Deterministic bag-of-words embedder: hashes each word into a bucket so
/// texts sharing vocabulary get similar vectors
struct BagOfWordsEmbedder {
    dimension: usize,
}

impl EmbeddingProvider for BagOfWordsEmbedder {
    fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; self.dimension];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hash = 0_usize;
            for byte in word.bytes() {
                hash = hash.wrapping_mul(31).wrapping_add(byte as usize);
            }
            vector[hash % self.dimension] += 1.0;
        }
        Ok(vector)
    }
}

struct CannedGenerator;

impl GenerationProvider for CannedGenerator {
    fn generate(&self, _prompt: &str) -> crate::Result<String> {
        Ok("canned answer".to_string())
    }
}

struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> crate::Result<Vec<f32>> {
        Err(QaError::Service("embedding backend unavailable".to_string()))
    }
}

fn test_pipeline(base_dir: &std::path::Path) -> QaPipeline {
    let mut config = Config::default();
    config.base_dir = base_dir.to_path_buf();
    config.chunking.chunk_size = 100;
    config.chunking.chunk_overlap = 10;

    QaPipeline::new(
        config,
        Arc::new(BagOfWordsEmbedder { dimension: 64 }),
        Arc::new(CannedGenerator),
    )
}

fn doc(path: &str, content: &str) -> Document {
    Document {
        path: path.to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn status_reports_uninitialized_before_ingest() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = test_pipeline(dir.path());

    let status = pipeline.status().await;
    assert!(!status.initialized);
    assert_eq!(status.documents, 0);
    assert_eq!(status.chunks, 0);
    assert_eq!(status.dimension, None);
}

#[tokio::test]
async fn ask_before_ingest_is_not_initialized() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = test_pipeline(dir.path());

    let err = pipeline.ask("anything?").await.expect_err("ask should fail");
    assert!(matches!(err, QaError::NotInitialized));
}

#[tokio::test]
async fn ingest_empty_batch_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = test_pipeline(dir.path());

    let err = pipeline.ingest(Vec::new()).await.expect_err("ingest should fail");
    assert!(matches!(err, QaError::EmptyInput));
}

#[tokio::test]
async fn ingest_documents_with_only_empty_content_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = test_pipeline(dir.path());

    let err = pipeline
        .ingest(vec![doc("empty.txt", "")])
        .await
        .expect_err("ingest should fail");
    assert!(matches!(err, QaError::EmptyInput));
}

#[tokio::test]
async fn ingest_publishes_and_persists_index() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = test_pipeline(dir.path());

    let report = pipeline
        .ingest(vec![
            doc("a.md", "alpha content here"),
            doc("b.md", "beta content there"),
        ])
        .await
        .expect("ingest should succeed");

    assert_eq!(report.documents, 2);
    assert!(report.chunks >= 2);

    let status = pipeline.status().await;
    assert!(status.initialized);
    assert_eq!(status.documents, 2);
    assert_eq!(status.chunks, report.chunks);
    assert_eq!(status.dimension, Some(64));

    assert!(pipeline.config().index_path().exists());
}

#[tokio::test]
async fn embedding_failure_during_ingest_leaves_pipeline_uninitialized() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = Config::default();
    config.base_dir = dir.path().to_path_buf();

    let pipeline = QaPipeline::new(config, Arc::new(FailingEmbedder), Arc::new(CannedGenerator));

    let err = pipeline
        .ingest(vec![doc("a.md", "some content")])
        .await
        .expect_err("ingest should fail");
    assert!(matches!(err, QaError::Service(_)));

    let status = pipeline.status().await;
    assert!(!status.initialized);
    assert!(!pipeline.config().index_path().exists());
}

#[tokio::test]
async fn rebuild_fails_when_documents_directory_missing() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = test_pipeline(dir.path());

    let err = pipeline.rebuild().await.expect_err("rebuild should fail");
    assert!(matches!(err, QaError::Storage(_)));
}

#[tokio::test]
async fn ask_attributes_sources() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = test_pipeline(dir.path());

    pipeline
        .ingest(vec![
            doc(
                "company_policies.md",
                "Return policy: customers may return any item within 30 days. The return policy covers refunds.",
            ),
            doc("shipping.md", "Orders ship from the warehouse in two business days."),
        ])
        .await
        .expect("ingest should succeed");

    let record = pipeline
        .ask("What is the return policy?")
        .await
        .expect("ask should succeed");

    assert_eq!(record.question, "What is the return policy?");
    assert_eq!(record.answer, "canned answer");
    assert_eq!(
        record.sources.first().map(String::as_str),
        Some("company_policies.md")
    );
}
