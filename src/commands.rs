use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::ProgressBar;
use tracing::info;

use crate::config::Config;
use crate::documents::stage_uploads;
use crate::index::VectorIndex;
use crate::pipeline::QaPipeline;

fn load_pipeline() -> Result<QaPipeline> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let pipeline = QaPipeline::from_env(config).context("Failed to create pipeline")?;
    Ok(pipeline)
}

/// Answer a question from the indexed documents
#[inline]
pub async fn ask_question(question: &str, top_k: Option<usize>) -> Result<()> {
    let mut config = Config::load_default().context("Failed to load configuration")?;
    if let Some(k) = top_k {
        config.retrieval.top_k = k;
    }
    config.validate().context("Invalid configuration")?;

    let pipeline = QaPipeline::from_env(config).context("Failed to create pipeline")?;
    pipeline
        .initialize()
        .await
        .context("Failed to initialize vector index")?;

    let record = pipeline.ask(question).await?;

    println!("{}", style("Answer:").bold().green());
    println!("{}", record.answer);

    if let Some(highlighted) = &record.highlighted_answer {
        println!();
        println!("{}", style("With highlighted context:").bold());
        println!("{highlighted}");
    }

    println!();
    if record.sources.is_empty() {
        println!("{}", style("No supporting sources.").yellow());
    } else {
        println!("{}", style("Sources:").bold());
        for source in &record.sources {
            println!("  📄 {source}");
        }
    }

    Ok(())
}

/// Stage an upload batch into the documents directory, then rebuild
#[inline]
pub async fn ingest_documents(files: &[PathBuf]) -> Result<()> {
    let pipeline = load_pipeline()?;

    if !files.is_empty() {
        let staged = stage_uploads(&pipeline.config().documents_path(), files)?;
        println!("Staged {} file(s):", staged.len());
        for name in &staged {
            println!("  📄 {name}");
        }
    }

    rebuild_with_spinner(&pipeline).await
}

/// Rebuild the vector index from the documents directory
#[inline]
pub async fn rebuild_index() -> Result<()> {
    let pipeline = load_pipeline()?;
    rebuild_with_spinner(&pipeline).await
}

async fn rebuild_with_spinner(pipeline: &QaPipeline) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Rebuilding vector index...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = pipeline.rebuild().await;
    spinner.finish_and_clear();

    let report = result.context("Rebuild failed")?;
    info!(
        "Rebuild complete: {} documents, {} chunks",
        report.documents, report.chunks
    );

    println!("{}", style("✓ Vector index rebuilt").green());
    println!("  Documents: {}", report.documents);
    println!("  Chunks: {}", report.chunks);

    Ok(())
}

/// Show whether the index is initialized and its current counts.
/// Reads the persisted index directly; no API key required.
#[inline]
pub fn show_status() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let index_path = config.index_path();

    println!("{}", style("Index Status").bold().cyan());
    if index_path.exists() {
        let index = VectorIndex::load(&index_path).context("Failed to load vector index")?;
        println!("  State: {}", style("initialized").green());
        println!("  Documents: {}", index.document_count());
        println!("  Chunks: {}", index.len());
        println!("  Vector dimension: {}", index.dimension());
        println!("  Built at: {}", index.built_at());
    } else {
        println!("  State: {}", style("not initialized").yellow());
        println!("  Run 'docs-qa rebuild' to build the index.");
    }
    println!("  Index file: {}", index_path.display());
    println!("  Documents dir: {}", config.documents_path().display());

    Ok(())
}
