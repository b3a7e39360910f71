// External model services
// Embedding and generation are capabilities the core calls through traits so
// the pipeline stays testable with deterministic stubs

pub mod openai;

use crate::Result;

pub use openai::OpenAiClient;

/// Converts text into fixed-dimension embedding vectors
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving input order.
    /// The default implementation embeds one text at a time.
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Produces natural-language completions for a prompt
pub trait GenerationProvider: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}
