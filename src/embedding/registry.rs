//! Provider selection
//!
//! Maps the configured provider kind to a concrete implementation and wraps
//! it in the cache.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{CacheSettings, EmbeddingSettings};
use crate::error::Result;

use super::{
    CachedProvider, DiskStore, GeminiConfig, GeminiProvider, MockConfig, MockProvider, OpenAiConfig,
    OpenAiProvider, SharedProvider,
};

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible `/embeddings` endpoint
    #[serde(alias = "open_ai")]
    OpenAi,
    /// Google Generative Language `embedContent`
    Gemini,
    /// Offline hashed bag-of-words
    Mock,
}

impl ProviderKind {
    /// Get all provider kinds
    pub fn all() -> &'static [ProviderKind] {
        &[ProviderKind::OpenAi, ProviderKind::Gemini, ProviderKind::Mock]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Mock => "mock",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open_ai" | "open-ai" => Some(ProviderKind::OpenAi),
            "gemini" | "google" => Some(ProviderKind::Gemini),
            "mock" => Some(ProviderKind::Mock),
            _ => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "text-embedding-3-small",
            ProviderKind::Gemini => "models/embedding-001",
            ProviderKind::Mock => "mock-hash",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::Mock => "",
        }
    }

    /// Conventional environment variables holding this provider's key
    pub fn api_key_env_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::OpenAi => &["OPENAI_API_KEY"],
            ProviderKind::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            ProviderKind::Mock => &[],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Build the raw provider for the configured kind
pub fn create_provider(settings: &EmbeddingSettings) -> Result<SharedProvider> {
    let provider: SharedProvider = match settings.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(OpenAiConfig {
            base_url: settings.base_url(),
            api_key: settings.api_key.clone(),
            model: settings.model_id(),
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
        })?),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(GeminiConfig {
            base_url: settings.base_url(),
            api_key: settings.api_key.clone(),
            model: settings.model_id(),
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
        })?),
        ProviderKind::Mock => Arc::new(MockProvider::new(MockConfig {
            dimensions: settings.mock_dimensions,
            fail_on: None,
        })),
    };
    Ok(provider)
}

/// Build the configured provider behind the cache
pub fn create_cached_provider(embedding: &EmbeddingSettings, cache: &CacheSettings) -> Result<Arc<CachedProvider>> {
    let inner = create_provider(embedding)?;
    let store = if cache.enabled {
        Some(DiskStore::open(&cache.dir)?)
    } else {
        None
    };

    info!(
        provider = inner.name(),
        model = inner.model_id(),
        cache_dir = ?store.as_ref().map(|s| s.dir().display().to_string()),
        max_concurrency = embedding.max_concurrency,
        "Embedding provider ready"
    );

    Ok(Arc::new(CachedProvider::new(inner, store, embedding.max_concurrency)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse() {
        assert_eq!(ProviderKind::parse("OpenAI"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::parse("gemini"), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::parse(" mock "), Some(ProviderKind::Mock));
        assert_eq!(ProviderKind::parse("cohere"), None);
    }

    #[test]
    fn test_names_roundtrip() {
        for kind in ProviderKind::all() {
            assert_eq!(ProviderKind::parse(kind.name()), Some(*kind));
            assert_eq!(kind.to_string(), kind.name());
        }
    }

    #[test]
    fn test_serde_names() {
        let kind: ProviderKind = serde_json::from_str(r#""openai""#).unwrap();
        assert_eq!(kind, ProviderKind::OpenAi);
        assert_eq!(serde_json::to_string(&ProviderKind::Gemini).unwrap(), r#""gemini""#);
    }

    #[test]
    fn test_create_mock_provider() {
        let settings = EmbeddingSettings {
            provider: ProviderKind::Mock,
            mock_dimensions: 64,
            ..Default::default()
        };
        let provider = create_provider(&settings).unwrap();
        assert_eq!(provider.name(), "mock");
        assert_eq!(provider.model_id(), "mock-hash-64");
    }

    #[test]
    fn test_gemini_without_key_fails() {
        let settings = EmbeddingSettings {
            provider: ProviderKind::Gemini,
            api_key: String::new(),
            ..Default::default()
        };
        assert!(create_provider(&settings).is_err());
    }

    #[test]
    fn test_cached_provider_creates_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("cache").join("embeddings");
        let cache = CacheSettings {
            enabled: true,
            dir: dir.to_string_lossy().to_string(),
        };
        let settings = EmbeddingSettings {
            provider: ProviderKind::Mock,
            ..Default::default()
        };

        let provider = create_cached_provider(&settings, &cache).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert!(dir.exists());
    }
}
