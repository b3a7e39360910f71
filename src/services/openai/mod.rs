
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use url::Url;

use crate::config::ServiceConfig;
use crate::services::{EmbeddingProvider, GenerationProvider};
use crate::{QaError, Result};

const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
const EMBEDDINGS_ENDPOINT: &str = "/v1/embeddings";
const CHAT_COMPLETIONS_ENDPOINT: &str = "/v1/chat/completions";
const GENERATION_TEMPERATURE: f32 = 0.3;

/// Client for an OpenAI-compatible embeddings and chat-completions API
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    api_key: String,
    embedding_model: String,
    generation_model: String,
    batch_size: u32,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenAiClient {
    /// Build a client with an explicit API key
    #[inline]
    pub fn new(config: &ServiceConfig, api_key: String) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| QaError::Config(format!("invalid service URL: {}", config.base_url)))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            base_url,
            api_key,
            embedding_model: config.embedding_model.clone(),
            generation_model: config.generation_model.clone(),
            batch_size: config.batch_size,
            agent,
            retry_attempts: config.retry_attempts,
        })
    }

    /// Build a client resolving the API key from the configured environment
    /// variable
    #[inline]
    pub fn from_env(config: &ServiceConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            QaError::Config(format!(
                "environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        Self::new(config, api_key)
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Generate embeddings for a batch of texts, preserving input order
    #[inline]
    pub fn embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());

        // Process in batches to avoid overwhelming the server
        for batch in texts.chunks(self.batch_size as usize) {
            results.extend(self.embeddings_single_batch(batch)?);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }

    fn embeddings_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let response_text = self.post_json(EMBEDDINGS_ENDPOINT, &request)?;

        let response: EmbeddingsResponse = serde_json::from_str(&response_text)
            .map_err(|e| QaError::Service(format!("failed to parse embeddings response: {e}")))?;

        if response.data.len() != texts.len() {
            return Err(QaError::Service(format!(
                "mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.data.len()
            )));
        }

        // The API is allowed to return entries out of order
        let mut data = response.data;
        data.sort_by_key(|entry| entry.index);

        Ok(data.into_iter().map(|entry| entry.embedding).collect())
    }

    /// Generate a completion for a prompt
    #[inline]
    pub fn completion(&self, prompt: &str) -> Result<String> {
        debug!("Requesting completion (prompt length: {})", prompt.len());

        let request = ChatRequest {
            model: &self.generation_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: GENERATION_TEMPERATURE,
        };

        let response_text = self.post_json(CHAT_COMPLETIONS_ENDPOINT, &request)?;

        let response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| QaError::Service(format!("failed to parse completion response: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| QaError::Service("completion response contained no choices".to_string()))
    }

    fn post_json<T: Serialize>(&self, endpoint: &str, request: &T) -> Result<String> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| QaError::Config(format!("failed to build request URL: {e}")))?;

        let request_json = serde_json::to_string(request)
            .map_err(|e| QaError::Service(format!("failed to serialize request: {e}")))?;

        self.request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .header("Authorization", &format!("Bearer {}", self.api_key))
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }

    fn request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let (should_retry, mapped) = match &error {
                        ureq::Error::StatusCode(status) if *status >= 500 => {
                            warn!(
                                "Server error (status {}), attempt {}/{}",
                                status, attempt, self.retry_attempts
                            );
                            (true, QaError::Service(format!("server error: HTTP {status}")))
                        }
                        ureq::Error::StatusCode(status) => {
                            warn!("Client error (status {}), not retrying", status);
                            (
                                false,
                                QaError::Service(format!("client error: HTTP {status}")),
                            )
                        }
                        ureq::Error::Timeout(_) => {
                            warn!(
                                "Request timed out, attempt {}/{}",
                                attempt, self.retry_attempts
                            );
                            (true, QaError::Timeout(error.to_string()))
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            (true, QaError::Service(format!("transport error: {error}")))
                        }
                        _ => (false, QaError::Service(error.to_string())),
                    };

                    if !should_retry {
                        return Err(mapped);
                    }

                    last_error = Some(mapped);

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.base_url);

        Err(last_error
            .unwrap_or_else(|| QaError::Service("request failed after retries".to_string())))
    }
}

impl EmbeddingProvider for OpenAiClient {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embeddings(std::slice::from_ref(&text.to_string()))?;
        vectors
            .pop()
            .ok_or_else(|| QaError::Service("embeddings response was empty".to_string()))
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embeddings(texts)
    }
}

impl GenerationProvider for OpenAiClient {
    #[inline]
    fn generate(&self, prompt: &str) -> Result<String> {
        self.completion(prompt)
    }
}
