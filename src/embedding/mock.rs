//! Mock embedding provider for testing and offline dry runs
//!
//! Hashed bag-of-words: every token is hashed into one signed bucket, so
//! texts that share vocabulary end up with similar vectors. Deterministic
//! across runs and platforms; empty text yields the zero vector.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

use super::{Embedding, EmbeddingProvider};

/// Label words from the normalized text templates
const TEMPLATE_WORDS: &[&str] = &["core", "top", "skills", "programming", "languages", "keywords"];

/// Mock provider configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Vector length
    pub dimensions: usize,

    /// Fail every request whose text contains this marker
    pub fail_on: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimensions: 256,
            fail_on: None,
        }
    }
}

pub struct MockProvider {
    config: MockConfig,
    model_id: String,
    calls: AtomicU64,
}

impl MockProvider {
    pub fn new(config: MockConfig) -> Self {
        let model_id = format!("mock-hash-{}", config.dimensions);
        Self {
            config,
            model_id,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of `embed` calls served
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn generate(&self, text: &str) -> Embedding {
        let dims = self.config.dimensions;
        let mut vector = vec![0.0f32; dims];

        for token in tokenize(text) {
            let hash = Sha256::digest(token.as_bytes());
            let mut index_bytes = [0u8; 8];
            index_bytes.copy_from_slice(&hash[..8]);
            let bucket = (u64::from_le_bytes(index_bytes) % dims as u64) as usize;
            let sign = if hash[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in &mut vector {
                *v /= magnitude;
            }
        }
        vector
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

/// Lowercased word tokens, keeping symbols that carry meaning in tech
/// names (c++, c#, node.js)
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '-' | '/')))
        .map(|t| t.trim_matches(|c: char| matches!(c, '.' | '-' | '/')).to_lowercase())
        .filter(|t| !t.is_empty() && !TEMPLATE_WORDS.contains(&t.as_str()))
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(ref marker) = self.config.fail_on {
            if text.contains(marker.as_str()) {
                return Err(Error::EmbeddingRequest {
                    status: Some(503),
                    message: "Mock embedding failure".to_string(),
                });
            }
        }

        Ok(self.generate(text))
    }
}
