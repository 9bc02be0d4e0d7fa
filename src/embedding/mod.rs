//! Embedding providers
//!
//! This module contains the provider abstraction and implementations:
//! - OpenAI-compatible HTTP endpoints
//! - Google Gemini `embedContent`
//! - A deterministic mock for tests and dry runs
//!
//! Every provider is used through `CachedProvider`, which adds the
//! content-addressed disk cache, request coalescing and the upstream
//! concurrency bound.

mod cache;
mod gemini;
mod http;
mod mock;
mod openai;
mod registry;
mod traits;

pub use cache::{CacheStats, CachedProvider, DiskStore};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use mock::{MockConfig, MockProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use registry::{create_cached_provider, ProviderKind};
pub use traits::{Embedding, EmbeddingProvider, SharedProvider};
