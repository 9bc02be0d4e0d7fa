//! OpenAI-compatible embeddings provider
//!
//! Works with any server exposing `POST {base_url}/embeddings` in the OpenAI
//! shape (OpenAI, Ollama, vLLM, LM Studio, etc.).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::http::HttpTransport;
use super::{Embedding, EmbeddingProvider};

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

/// Configuration for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL (e.g., "https://api.openai.com/v1", "http://localhost:11434/v1")
    pub base_url: String,

    /// API key (empty string for local servers like Ollama)
    pub api_key: String,

    /// Embedding model (e.g., "text-embedding-3-small", "nomic-embed-text")
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries on transient errors
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// API types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EmbeddingsApiRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

// ─────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────

pub struct OpenAiProvider {
    config: OpenAiConfig,
    http: HttpTransport,
    url: String,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = HttpTransport::new(config.timeout_secs, config.max_retries)?;
        let url = format!("{}/embeddings", config.base_url.trim_end_matches('/'));

        info!(base_url = %config.base_url, model = %config.model, "OpenAI-compatible embedding provider created");

        Ok(Self { config, http, url })
    }

    /// Build the authorization header value (if API key is set)
    fn auth_header(&self) -> Option<String> {
        if self.config.api_key.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.config.api_key))
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let body = EmbeddingsApiRequest {
            model: &self.config.model,
            input: vec![text],
        };

        let auth = self.auth_header();
        let headers: Vec<(&str, &str)> = auth
            .as_deref()
            .map(|value| vec![("Authorization", value)])
            .unwrap_or_default();

        let parsed: EmbeddingsApiResponse = self.http.post_json(&self.url, &headers, &body).await?;
        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::embedding_malformed("no embedding in response data"))?;

        if vector.is_empty() {
            return Err(Error::embedding_malformed("empty embedding vector"));
        }

        debug!(dimensions = vector.len(), chars = text.len(), "OpenAI embedding received");
        Ok(vector)
    }
}
