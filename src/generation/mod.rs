
use itertools::Itertools;
use tracing::{debug, info};

use crate::Result;
use crate::chunking::estimate_token_count;
use crate::retrieval::{RetrievalResult, RetrievedChunk};
use crate::services::GenerationProvider;

/// Answer returned when retrieval produced zero chunks. The generation
/// service is not called in that case; see `generate_answer`.
pub const NO_CONTEXT_ANSWER: &str =
    "No supporting context was found in the indexed documents for this question.";

const PROMPT_TEMPLATE_PREFIX: &str = "You are a helpful assistant answering questions based on the provided context.

Use the following pieces of context to answer the question at the end. If the context does not contain the answer, say that you don't know rather than guessing. When the context mentions specific policies, prices, or procedures, include them in your answer.

Context:
";

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Minimum sentence length considered for answer highlighting
const HIGHLIGHT_MIN_SENTENCE_CHARS: usize = 20;

/// A generated answer together with the context that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAnswer {
    pub answer: String,
    /// Source document paths for the chunks actually used in the prompt
    pub sources: Vec<String>,
    /// Text of the chunks actually used in the prompt, best first
    pub contexts: Vec<String>,
}

/// Assemble the generation prompt, keeping its estimated token count within
/// `max_prompt_tokens` by dropping the lowest-ranked chunks first.
///
/// The best-ranked chunk is always included, even when it alone exceeds the
/// budget, so a retrieved context is never silently reduced to nothing.
/// Returns the prompt and the number of chunks used.
#[inline]
pub fn build_prompt(
    question: &str,
    chunks: &[RetrievedChunk],
    max_prompt_tokens: usize,
) -> (String, usize) {
    let suffix = format!("\n\nQuestion: {question}\n\nAnswer:");
    let base_tokens = estimate_token_count(PROMPT_TEMPLATE_PREFIX) + estimate_token_count(&suffix);

    let mut used = 0;
    let mut context_tokens = 0;
    for chunk in chunks {
        let chunk_tokens = chunk.chunk.token_count;
        if used > 0 && base_tokens + context_tokens + chunk_tokens > max_prompt_tokens {
            break;
        }
        context_tokens += chunk_tokens;
        used += 1;
    }

    if used < chunks.len() {
        debug!(
            "Prompt budget ({} tokens) dropped {} of {} retrieved chunks",
            max_prompt_tokens,
            chunks.len() - used,
            chunks.len()
        );
    }

    let context = chunks[..used]
        .iter()
        .map(|c| c.chunk.content.as_str())
        .join(CONTEXT_SEPARATOR);

    let prompt = format!("{PROMPT_TEMPLATE_PREFIX}{context}{suffix}");
    (prompt, used)
}

/// Generate an answer for a question from its retrieval result.
///
/// Empty-context policy: when no chunks were retrieved, the generation
/// service is not called and a fixed [`NO_CONTEXT_ANSWER`] with an empty
/// source list is returned. Service failures propagate as
/// `QaError::Service` / `QaError::Timeout`.
#[inline]
pub fn generate_answer(
    generator: &dyn GenerationProvider,
    question: &str,
    retrieval: &RetrievalResult,
    max_prompt_tokens: usize,
) -> Result<GeneratedAnswer> {
    if retrieval.chunks.is_empty() {
        info!("No chunks retrieved; returning no-context answer without calling the model");
        return Ok(GeneratedAnswer {
            answer: NO_CONTEXT_ANSWER.to_string(),
            sources: Vec::new(),
            contexts: Vec::new(),
        });
    }

    let (prompt, used) = build_prompt(question, &retrieval.chunks, max_prompt_tokens);
    let answer = generator.generate(&prompt)?;

    let used_chunks = &retrieval.chunks[..used];
    let sources: Vec<String> = used_chunks
        .iter()
        .map(|c| c.chunk.doc_path.clone())
        .unique()
        .collect();
    let contexts: Vec<String> = used_chunks
        .iter()
        .map(|c| c.chunk.content.clone())
        .collect();

    debug!(
        "Generated answer ({} chars) from {} chunks across {} sources",
        answer.len(),
        used,
        sources.len()
    );

    Ok(GeneratedAnswer {
        answer,
        sources,
        contexts,
    })
}

/// Wrap context sentences that appear verbatim in the answer in `**bold**`
/// markers. Returns `None` when nothing matched.
#[inline]
pub fn highlight_answer(answer: &str, contexts: &[String]) -> Option<String> {
    let mut highlighted = answer.to_string();

    let sentences: Vec<String> = contexts
        .iter()
        .flat_map(|context| split_sentences(context))
        .unique()
        .collect();

    for sentence in &sentences {
        if sentence.chars().count() > HIGHLIGHT_MIN_SENTENCE_CHARS && answer.contains(sentence) {
            highlighted = highlighted.replace(sentence, &format!("**{sentence}**"));
        }
    }

    if highlighted == answer {
        None
    } else {
        Some(highlighted)
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
