//! Embedding provider trait

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};

use crate::error::{Error, Result};

/// A dense embedding vector
pub type Embedding = Vec<f32>;

/// Shared handle to a provider
pub type SharedProvider = Arc<dyn EmbeddingProvider>;

/// Maps text to a fixed-length vector for one model
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name ("openai", "gemini", "mock")
    fn name(&self) -> &'static str;

    /// Model identifier; part of every cache key
    fn model_id(&self) -> &str;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Upper bound on concurrent `embed` calls made by `embed_batch`
    fn max_concurrency(&self) -> usize {
        1
    }

    /// Embed many texts, preserving input order. The first failure aborts
    /// the batch and carries the failed input index.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let limit = self.max_concurrency().max(1);
        let calls: Vec<_> = texts
            .iter()
            .enumerate()
            .map(|(index, text)| async move {
                self.embed(text)
                    .await
                    .map_err(|e| Error::embedding_at(index, &e))
            })
            .collect();
        stream::iter(calls).buffered(limit).try_collect().await
    }
}
