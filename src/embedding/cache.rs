//! Embedding cache
//!
//! Content-addressed: the key is the SHA-256 of `model_id`, a NUL byte and
//! the exact text. Lookups go memory, then disk, then upstream. Each key
//! owns a `OnceCell`, so concurrent callers asking for the same text share
//! one upstream fetch. Failures are never cached.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{OnceCell, Semaphore};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::{Embedding, EmbeddingProvider, SharedProvider};

/// Cache key for `text` under `model_id`
pub fn cache_key(model_id: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

// ─────────────────────────────────────────────────────────────────
// Disk store
// ─────────────────────────────────────────────────────────────────

/// One cached vector on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    model: String,
    dimensions: usize,
    vector: Embedding,
    created_at: DateTime<Utc>,
}

/// What is currently stored on disk
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiskSummary {
    pub dir: PathBuf,
    pub entries: usize,
    pub bytes: u64,
    pub unreadable: usize,
    /// Entry count per model
    pub models: BTreeMap<String, usize>,
}

/// `<dir>/<sha256-hex>.json` files
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Open (and create) the cache directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::IoWrite {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    /// Directory without creating it, for inspection commands
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read an entry; missing, corrupt or mismatched files are misses
    async fn load(&self, key: &str, model: &str) -> Option<Embedding> {
        let path = self.path_for(key);
        let bytes = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.model == model && entry.vector.len() == entry.dimensions && !entry.vector.is_empty() => {
                Some(entry.vector)
            }
            Ok(_) => {
                warn!(path = %path.display(), "Cache entry does not match its key, refetching");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache entry, refetching");
                None
            }
        }
    }

    /// Write an entry atomically (temp file + rename)
    async fn save(&self, key: &str, model: &str, vector: &[f32]) -> Result<()> {
        let entry = CacheEntry {
            model: model.to_string(),
            dimensions: vector.len(),
            vector: vector.to_vec(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&entry)?;

        let tmp = self.dir.join(format!("{}.{}.tmp", key, Uuid::new_v4()));
        let path = self.path_for(key);
        tokio::fs::write(&tmp, json).await.map_err(|e| Error::IoWrite {
            path: tmp.clone(),
            source: e,
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| Error::IoWrite {
            path: path.clone(),
            source: e,
        })?;
        Ok(())
    }

    fn cache_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| Error::IoRead {
            path: self.dir.clone(),
            source: e,
        })?;

        Ok(entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && matches!(path.extension().and_then(|e| e.to_str()), Some("json") | Some("tmp"))
            })
            .collect())
    }

    /// Count entries and bytes per model
    pub fn summary(&self) -> Result<DiskSummary> {
        let mut summary = DiskSummary {
            dir: self.dir.clone(),
            ..Default::default()
        };

        for path in self.cache_files()? {
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match fs::read(&path) {
                Ok(b) => b,
                Err(_) => {
                    summary.unreadable += 1;
                    continue;
                }
            };
            summary.bytes += bytes.len() as u64;
            match serde_json::from_slice::<CacheEntry>(&bytes) {
                Ok(entry) => {
                    summary.entries += 1;
                    *summary.models.entry(entry.model).or_insert(0) += 1;
                }
                Err(_) => summary.unreadable += 1,
            }
        }

        Ok(summary)
    }

    /// Delete every cache file; returns how many were removed
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.cache_files()? {
            fs::remove_file(&path).map_err(|e| Error::IoWrite {
                path: path.clone(),
                source: e,
            })?;
            removed += 1;
        }
        debug!(dir = %self.dir.display(), removed, "Embedding cache cleared");
        Ok(removed)
    }
}

// ─────────────────────────────────────────────────────────────────
// Caching provider
// ─────────────────────────────────────────────────────────────────

/// Counters since the provider was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Served from memory, including callers that waited on a shared fetch
    pub memory_hits: u64,
    pub disk_hits: u64,
    /// Upstream fetches
    pub misses: u64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.memory_hits + self.disk_hits
    }

    /// Counters accumulated between `earlier` and `self`
    pub fn since(&self, earlier: &CacheStats) -> CacheStats {
        CacheStats {
            memory_hits: self.memory_hits.saturating_sub(earlier.memory_hits),
            disk_hits: self.disk_hits.saturating_sub(earlier.disk_hits),
            misses: self.misses.saturating_sub(earlier.misses),
        }
    }
}

/// Wraps a provider with memory + disk caching, request coalescing and a
/// bound on concurrent upstream calls
pub struct CachedProvider {
    inner: SharedProvider,
    store: Option<DiskStore>,
    cells: Mutex<HashMap<String, Arc<OnceCell<Embedding>>>>,
    upstream: Semaphore,
    max_concurrency: usize,
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedProvider {
    /// `store` = None keeps the cache in memory only
    pub fn new(inner: SharedProvider, store: Option<DiskStore>, max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            inner,
            store,
            cells: Mutex::new(HashMap::new()),
            upstream: Semaphore::new(max_concurrency),
            max_concurrency,
            memory_hits: AtomicU64::new(0),
            disk_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Underlying provider name
    pub fn provider_name(&self) -> &'static str {
        self.inner.name()
    }

    fn cell_for(&self, key: &str) -> Arc<OnceCell<Embedding>> {
        self.cells
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Drop a cell left empty by a failed fetch so retries start fresh and
    /// a long-lived matcher does not accumulate dead entries
    fn evict_empty(&self, key: &str, cell: &Arc<OnceCell<Embedding>>) {
        let mut cells = self.cells.lock();
        if let Some(current) = cells.get(key) {
            if Arc::ptr_eq(current, cell) && !current.initialized() {
                cells.remove(key);
            }
        }
    }

    async fn load_or_fetch(&self, key: &str, text: &str) -> Result<Embedding> {
        let model = self.inner.model_id();

        if let Some(ref store) = self.store {
            if let Some(vector) = store.load(key, model).await {
                self.disk_hits.fetch_add(1, Ordering::Relaxed);
                trace!(key, "Embedding cache disk hit");
                return Ok(vector);
            }
        }

        let vector = {
            let _permit = self
                .upstream
                .acquire()
                .await
                .map_err(|_| Error::Internal("embedding limiter closed".to_string()))?;
            self.misses.fetch_add(1, Ordering::Relaxed);
            self.inner.embed(text).await?
        };

        if let Some(ref store) = self.store {
            if let Err(e) = store.save(key, model, &vector).await {
                warn!(error = %e, "Failed to persist embedding, continuing");
            }
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for CachedProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let key = cache_key(self.inner.model_id(), text);
        let cell = self.cell_for(&key);

        let mut fetched_here = false;
        let outcome = {
            let fetched = &mut fetched_here;
            let key = key.as_str();
            cell.get_or_try_init(|| async move {
                *fetched = true;
                self.load_or_fetch(key, text).await
            })
            .await
            .cloned()
        };
        let vector = match outcome {
            Ok(vector) => vector,
            Err(e) => {
                self.evict_empty(&key, &cell);
                return Err(e);
            }
        };

        if !fetched_here {
            self.memory_hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(vector)
    }
}
