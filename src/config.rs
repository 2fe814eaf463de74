//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized, typed configuration for the retrieval engine: storage location, cache
//! sizes, fusion weights, and vector-index timeouts. Sourced from a TOML file with
//! environment-variable overrides and validated before use.
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (`LEGAL_SEARCH_*`)
//! 2. Configuration file (TOML)
//! 3. Default values
//!
//! ## Usage
//! ```rust
//! use falu_legal_search::config::Config;
//!
//! let config = Config::from_file("config.toml").unwrap();
//! println!("db path: {:?}", config.storage.db_path);
//! ```

use crate::errors::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// REST transport settings for the tool surface.
    pub server: ServerConfig,
    /// Persistence adapter settings
    pub storage: StorageConfig,
    /// Vector index settings
    pub vector: VectorConfig,
    /// Fusion ranker and cache settings
    pub search: SearchEngineConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// REST transport configuration (the public tool surface exposed over HTTP).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_seconds: u64,
}

/// Persistence adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file path.
    pub db_path: PathBuf,
    /// Bounded connection-pool size (scoped acquisitions).
    pub pool_size: usize,
    /// Enable content compression for large statute text.
    pub enable_compression: bool,
    /// LRU cache capacities.
    pub cache_sizes: CacheSizes,
}

/// Capacities for the three LRU caches hosted by the persistence adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSizes {
    pub alias: usize,
    pub law: usize,
    pub concept: usize,
}

/// Vector index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Embedding model identifier passed to the external embedder collaborator.
    pub model_name: String,
    /// Embedding dimension; the corpus is assumed single-dimension.
    pub dimension: usize,
    /// Deadline for the background preload to signal the readiness gate.
    pub preload_timeout_ms: u64,
    /// Deadline for a single vector search worker.
    pub search_timeout_ms: u64,
    /// Titles treated as "core laws" for the boost factor.
    pub core_law_titles: Vec<String>,
    /// Multiplicative boost applied to core-law articles.
    pub core_law_boost: f32,
    /// Article length below which a `0.5` boost multiplier applies.
    pub short_article_threshold: usize,
    /// Article length below which a `0.1` boost multiplier applies (overrides the above).
    pub very_short_article_threshold: usize,
}

/// Search engine and fusion-ranker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEngineConfig {
    pub default_max_results: usize,
    pub rrf_k: u32,
    pub path_weights: PathWeights,
    pub min_query_length: usize,
    pub max_query_length: usize,
}

/// Per-retrieval-path weights used by the RRF fusion ranker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathWeights {
    pub concept: f32,
    pub fts: f32,
    pub vector: f32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

impl Config {
    /// Load configuration from the default location (`config.toml`).
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file, falling back to defaults if absent.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("LEGAL_SEARCH_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("LEGAL_SEARCH_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(db_path) = std::env::var("LEGAL_SEARCH_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }
        if let Ok(model_name) = std::env::var("LEGAL_SEARCH_VECTOR_MODEL") {
            self.vector.model_name = model_name;
        }
        if let Ok(level) = std::env::var("LEGAL_SEARCH_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(SearchError::ValidationFailed {
                field: "server.port".to_string(),
                reason: "port cannot be zero".to_string(),
            });
        }
        if self.storage.pool_size == 0 {
            return Err(SearchError::ValidationFailed {
                field: "storage.pool_size".to_string(),
                reason: "pool size must be greater than zero".to_string(),
            });
        }
        if self.vector.dimension == 0 {
            return Err(SearchError::ValidationFailed {
                field: "vector.dimension".to_string(),
                reason: "vector dimension must be greater than zero".to_string(),
            });
        }
        if self.search.min_query_length > self.search.max_query_length {
            return Err(SearchError::ValidationFailed {
                field: "search.min_query_length".to_string(),
                reason: "minimum query length cannot exceed maximum".to_string(),
            });
        }
        if self.search.rrf_k == 0 {
            return Err(SearchError::ValidationFailed {
                field: "search.rrf_k".to_string(),
                reason: "rrf_k must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Serialize the configuration back to TOML (used by tests and ops tooling).
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)
            .map_err(|e| SearchError::Config { message: e.to_string() })?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                enable_cors: true,
                request_timeout_seconds: 30,
            },
            storage: StorageConfig {
                db_path: PathBuf::from("./data/legal_search.db"),
                pool_size: 5,
                enable_compression: true,
                cache_sizes: CacheSizes {
                    alias: 1000,
                    law: 500,
                    concept: 500,
                },
            },
            vector: VectorConfig {
                model_name: "legal-embed-zh".to_string(),
                dimension: 768,
                preload_timeout_ms: 15_000,
                search_timeout_ms: 10_000,
                core_law_titles: vec![
                    "民法典".to_string(),
                    "公司法".to_string(),
                    "刑法".to_string(),
                    "劳动法".to_string(),
                    "劳动合同法".to_string(),
                ],
                core_law_boost: 1.15,
                short_article_threshold: 50,
                very_short_article_threshold: 20,
            },
            search: SearchEngineConfig {
                default_max_results: 15,
                rrf_k: 60,
                path_weights: PathWeights {
                    concept: 2.0,
                    fts: 1.0,
                    vector: 0.8,
                },
                min_query_length: 1,
                max_query_length: 500,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}
