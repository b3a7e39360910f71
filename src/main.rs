use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docs_qa::Result;
use docs_qa::commands::{ask_question, ingest_documents, rebuild_index, show_status};
use docs_qa::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "docs-qa")]
#[command(about = "Retrieval-augmented question answering over local document collections")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding/generation service and pipeline settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Ask a question against the indexed documents
    Ask {
        /// The question to ask
        question: String,
        /// Number of chunks to retrieve for context
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Add documents to the knowledge base and rebuild the index
    Ingest {
        /// Files to copy into the documents directory (.txt or .md)
        files: Vec<PathBuf>,
    },
    /// Rebuild the vector index from the documents directory
    Rebuild,
    /// Show the current index status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ask { question, top_k } => {
            ask_question(&question, top_k).await?;
        }
        Commands::Ingest { files } => {
            ingest_documents(&files).await?;
        }
        Commands::Rebuild => {
            rebuild_index().await?;
        }
        Commands::Status => {
            show_status()?;
        }
    }

    Ok(())
}
