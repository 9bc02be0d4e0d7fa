//! Configuration system for the TeamSkills matcher
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. Per-request overrides (top_k, weights, domain_boost, softmax_temperature)
//! 2. Environment variables (TEAMSKILLS_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedding::ProviderKind;
use crate::error::{Error, Result};
use crate::matching::{default_anchors, AlignmentMethod, DomainAnchor};

/// Upper bound for a category repetition weight
pub const MAX_CATEGORY_WEIGHT: u32 = 16;

/// Main matcher configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Normalization and ranking settings
    pub matching: MatchingSettings,

    /// Anchor-based domain amplification
    pub domain_boost: DomainBoostSettings,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,

    /// On-disk embedding cache
    pub cache: CacheSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Normalization and ranking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Number of strongest-first items kept per member category
    pub top_k: usize,

    /// Softmax temperature for the per-role display scores (must be > 0)
    pub softmax_temperature: f64,

    /// How many times each category sentence is repeated in the member text
    pub weights: CategoryWeights,
}

/// Integer repetition weights per member category (0 drops the category)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub skills: u32,
    pub languages: u32,
    pub keywords: u32,
}

/// Anchor-based domain amplification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainBoostSettings {
    /// Enable domain amplification
    pub enabled: bool,

    /// Maximum relative boost/penalty, in [0, 1]
    pub strength: f64,

    /// Softmax temperature for the anchor distributions (must be > 0)
    pub temperature: f64,

    /// How role/member anchor distributions are compared
    pub method: AlignmentMethod,

    /// Named exemplar texts; an empty list disables amplification
    pub anchors: Vec<DomainAnchor>,
}

/// Embedding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Provider: openai, gemini or mock
    pub provider: ProviderKind,

    /// API base URL (provider default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// API key (empty for local servers)
    pub api_key: String,

    /// Model identifier (provider default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries on transient failures
    pub max_retries: u32,

    /// Maximum concurrent upstream requests per match
    pub max_concurrency: usize,

    /// Vector length produced by the mock provider
    pub mock_dimensions: usize,
}

/// Embedding cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Persist embeddings on disk
    pub enabled: bool,

    /// Cache directory
    pub dir: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            top_k: 10,
            softmax_temperature: 0.6,
            weights: CategoryWeights::default(),
        }
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            skills: 2,
            languages: 2,
            keywords: 1,
        }
    }
}

impl Default for DomainBoostSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 0.35,
            temperature: 0.7,
            method: AlignmentMethod::default(),
            anchors: default_anchors(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            base_url: None,
            api_key: String::new(),
            model: None,
            timeout_secs: 30,
            max_retries: 2,
            max_concurrency: 4,
            mock_dimensions: 256,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "~/.teamskills/cache/embeddings".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl MatchingSettings {
    /// Validate ranges; called at load time and again after request overrides
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::config_field_invalid("matching.top_k", "top_k must be at least 1"));
        }
        check_temperature("matching.softmax_temperature", self.softmax_temperature)?;
        self.weights.validate()
    }
}

impl CategoryWeights {
    /// Validate that every weight stays within the supported range
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("skills", self.skills),
            ("languages", self.languages),
            ("keywords", self.keywords),
        ] {
            if value > MAX_CATEGORY_WEIGHT {
                return Err(Error::config_field_invalid(
                    format!("matching.weights.{}", field),
                    format!("weight {} exceeds the maximum of {}", value, MAX_CATEGORY_WEIGHT),
                ));
            }
        }
        Ok(())
    }
}

impl DomainBoostSettings {
    /// Whether amplification changes anything at all
    pub fn is_active(&self) -> bool {
        self.enabled && self.strength > 0.0 && !self.anchors.is_empty()
    }

    /// Validate strength, temperature and anchor definitions
    pub fn validate(&self) -> Result<()> {
        if !self.strength.is_finite() || !(0.0..=1.0).contains(&self.strength) {
            return Err(Error::config_field_invalid(
                "domain_boost.strength",
                format!("strength must be between 0 and 1, got {}", self.strength),
            ));
        }
        check_temperature("domain_boost.temperature", self.temperature)?;

        let mut seen = HashSet::new();
        for anchor in &self.anchors {
            if anchor.name.trim().is_empty() {
                return Err(Error::config_field_invalid(
                    "domain_boost.anchors",
                    "anchor names cannot be empty",
                ));
            }
            if anchor.text.trim().is_empty() {
                return Err(Error::config_field_invalid(
                    "domain_boost.anchors",
                    format!("anchor '{}' has no exemplar text", anchor.name),
                ));
            }
            if !seen.insert(anchor.name.to_lowercase()) {
                return Err(Error::config_field_invalid(
                    "domain_boost.anchors",
                    format!("duplicate anchor name '{}'", anchor.name),
                ));
            }
        }
        Ok(())
    }
}

impl EmbeddingSettings {
    /// Effective model identifier
    pub fn model_id(&self) -> String {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    /// Effective API base URL
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }

    fn validate(&self) -> Result<()> {
        if self.provider != ProviderKind::Mock {
            let base_url = self.base_url();
            let parsed = url::Url::parse(&base_url).map_err(|e| {
                Error::config_field_invalid("embedding.base_url", format!("invalid URL '{}': {}", base_url, e))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(Error::config_field_invalid(
                    "embedding.base_url",
                    "base_url must start with http:// or https://",
                ));
            }
        }
        if self.timeout_secs == 0 {
            return Err(Error::config_field_invalid("embedding.timeout_secs", "timeout_secs must be positive"));
        }
        if self.max_concurrency == 0 {
            return Err(Error::config_field_invalid(
                "embedding.max_concurrency",
                "max_concurrency must be at least 1",
            ));
        }
        if self.mock_dimensions < 8 {
            return Err(Error::config_field_invalid(
                "embedding.mock_dimensions",
                "mock_dimensions must be at least 8",
            ));
        }
        Ok(())
    }
}

fn check_temperature(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::config_field_invalid(
            field,
            format!("temperature must be a positive number, got {}", value),
        ));
    }
    Ok(())
}

impl MatcherConfig {
    /// File (explicit or discovered), then `TEAMSKILLS_*` overrides, then
    /// validation. A missing explicit path is an error; nothing found on
    /// the search path means defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = match Self::locate(config_path)? {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            source: Some(e),
        })?;
        info!(path = %path.display(), "Configuration loaded from file");
        Ok(config)
    }

    fn locate(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            return match path.exists() {
                true => Ok(Some(path)),
                false => Err(Error::config_not_found(path)),
            };
        }

        let candidates = std::iter::once(PathBuf::from("teamskills.toml"))
            .chain(dirs::config_dir().map(|p| p.join("teamskills").join("matcher.toml")))
            .chain(default_config_path());

        let found = candidates.into_iter().find(|p| p.exists());
        if let Some(path) = &found {
            debug!(path = %path.display(), "Found configuration file");
        }
        Ok(found)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Matching settings
        if let Some(n) = env_parse("TEAMSKILLS_TOP_K") {
            self.matching.top_k = n;
        }
        if let Some(t) = env_parse("TEAMSKILLS_SOFTMAX_TEMPERATURE") {
            self.matching.softmax_temperature = t;
        }

        // Domain boost settings
        if let Some(enabled) = env_bool("TEAMSKILLS_DOMAIN_BOOST") {
            self.domain_boost.enabled = enabled;
        }
        if let Some(s) = env_parse("TEAMSKILLS_DOMAIN_STRENGTH") {
            self.domain_boost.strength = s;
        }

        // Embedding settings
        if let Ok(val) = std::env::var("TEAMSKILLS_PROVIDER") {
            match ProviderKind::parse(&val) {
                Some(kind) => self.embedding.provider = kind,
                None => {
                    let known: Vec<&str> = ProviderKind::all().iter().map(|k| k.name()).collect();
                    warn!(value = %val, known = %known.join(", "), "Ignoring unknown TEAMSKILLS_PROVIDER");
                }
            }
        }
        if let Ok(val) = std::env::var("TEAMSKILLS_BASE_URL") {
            self.embedding.base_url = Some(val);
        }
        if let Ok(val) = std::env::var("TEAMSKILLS_MODEL") {
            self.embedding.model = Some(val);
        }
        if let Ok(val) = std::env::var("TEAMSKILLS_API_KEY") {
            self.embedding.api_key = val;
        }
        if self.embedding.api_key.is_empty() {
            if let Some(key) = self
                .embedding
                .provider
                .api_key_env_vars()
                .iter()
                .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
            {
                self.embedding.api_key = key;
            }
        }
        if let Some(n) = env_parse("TEAMSKILLS_MAX_CONCURRENCY") {
            self.embedding.max_concurrency = n;
        }
        if let Some(n) = env_parse("TEAMSKILLS_TIMEOUT_SECS") {
            self.embedding.timeout_secs = n;
        }

        // Cache settings
        if let Some(enabled) = env_bool("TEAMSKILLS_CACHE_ENABLED") {
            self.cache.enabled = enabled;
        }
        if let Ok(val) = std::env::var("TEAMSKILLS_CACHE_DIR") {
            self.cache.dir = val;
        }

        // Logging settings
        if let Ok(val) = std::env::var("TEAMSKILLS_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("TEAMSKILLS_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Some(json) = env_bool("TEAMSKILLS_LOG_JSON") {
            self.logging.json_format = json;
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.cache.dir = expand_path(&self.cache.dir);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.matching.validate()?;
        self.domain_boost.validate()?;
        self.embedding.validate()?;

        if self.cache.enabled && self.cache.dir.trim().is_empty() {
            return Err(Error::config_field_invalid("cache.dir", "cache directory cannot be empty"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Get the cache directory as a PathBuf
    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.cache.dir)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|val| val.trim().parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|val| val.to_lowercase() == "true" || val == "1")
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.to_path_buf();
    move |source| Error::IoWrite { path, source }
}

/// `~/.teamskills/matcher.toml`
fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".teamskills").join("matcher.toml"))
}

/// Write a commented default config; refuses to replace an existing file
/// unless `force`
pub fn init_config(path: Option<&str>, force: bool) -> Result<()> {
    let target = match path {
        Some(p) => PathBuf::from(expand_path(p)),
        None => default_config_path().unwrap_or_else(|| PathBuf::from("matcher.toml")),
    };

    if target.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists; pass --force to replace it",
            target.display()
        )));
    }

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err(parent))?;
    }
    fs::write(&target, generate_default_config()).map_err(write_err(&target))?;

    println!("Configuration file created: {}", target.display());
    Ok(())
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# TeamSkills Matcher Configuration

[matching]
# Strongest-first items kept per member category (skills, languages, keywords)
top_k = 10

# Softmax temperature for per-role display scores (lower = sharper)
softmax_temperature = 0.6

[matching.weights]
# Repetitions of each category sentence in the member text (0 drops it)
skills = 2
languages = 2
keywords = 1

[domain_boost]
# Rescale similarities by role/member agreement on domain anchors
enabled = true

# Maximum relative boost or penalty (0..1)
strength = 0.35

# Softmax temperature for anchor distributions
temperature = 0.7

# "peak" (same top anchor boosts, different top anchor penalizes), "dot"
# (expected overlap of the anchor distributions) or "cosine" (their cosine)
method = "peak"

# Omit to use the built-in anchors, or define your own:
# [[domain_boost.anchors]]
# name = "frontend"
# text = "frontend web development; UI; React; TypeScript; CSS"

[embedding]
# Provider: gemini, openai (any OpenAI-compatible endpoint) or mock (offline)
provider = "gemini"

# API key (or set TEAMSKILLS_API_KEY / GEMINI_API_KEY / OPENAI_API_KEY)
api_key = ""

# base_url = "https://generativelanguage.googleapis.com/v1beta"
# model = "models/embedding-001"

# Request timeout in seconds
timeout_secs = 30

# Maximum retries on transient failures
max_retries = 2

# Maximum concurrent upstream requests
max_concurrency = 4

[cache]
# Persist embeddings keyed by model and content hash
enabled = true
dir = "~/.teamskills/cache/embeddings"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.teamskills/logs/matcher.log"

max_file_size_mb = 100
max_files = 5
json_format = false
"#
    .to_string()
}
