//! Google Generative Language embeddings provider
//!
//! Calls `POST {base_url}/{model}:embedContent` with the
//! `SEMANTIC_SIMILARITY` task type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::http::HttpTransport;
use super::{Embedding, EmbeddingProvider};

/// Configuration for the Gemini embeddings API
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    /// Model resource name; a bare name gets the `models/` prefix
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: String::new(),
            model: "models/embedding-001".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

pub struct GeminiProvider {
    config: GeminiConfig,
    http: HttpTransport,
    url: String,
}

impl GeminiProvider {
    pub fn new(mut config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::config_field_invalid(
                "embedding.api_key",
                "the gemini provider needs an API key (TEAMSKILLS_API_KEY or GEMINI_API_KEY)",
            ));
        }
        if !config.model.starts_with("models/") {
            config.model = format!("models/{}", config.model);
        }

        let http = HttpTransport::new(config.timeout_secs, config.max_retries)?;
        let url = format!(
            "{}/{}:embedContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        info!(model = %config.model, "Gemini embedding provider created");
        Ok(Self { config, http, url })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let body = EmbedContentRequest {
            model: &self.config.model,
            content: Content {
                parts: vec![Part { text }],
            },
            task_type: "SEMANTIC_SIMILARITY",
        };
        let headers = [("x-goog-api-key", self.config.api_key.as_str())];

        let parsed: EmbedContentResponse = self.http.post_json(&self.url, &headers, &body).await?;
        let vector = parsed
            .embedding
            .map(|e| e.values)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::embedding_malformed("response has no embedding values"))?;

        debug!(dimensions = vector.len(), chars = text.len(), "Gemini embedding received");
        Ok(vector)
    }
}
