//! # Chinese Statutory Law Retrieval Engine
//!
//! ## Overview
//! This library implements a hybrid retrieval and ranking engine over a corpus of
//! Chinese national laws, regulations, and judicial interpretations. It combines
//! alias resolution, concept lookup, BM25-style full-text search, and dense-vector
//! semantic search, fused by Reciprocal Rank Fusion, and enriches article-level
//! results with hierarchy breadcrumbs, sibling articles, and cross-references.
//!
//! ## Architecture
//! - `numeral`: Chinese/Arabic numeral codec
//! - `splitter`: statute-to-articles parser
//! - `storage`: connection pool, LRU caches, persistence
//! - `alias`: short/colloquial name resolution
//! - `concept`: legal-concept-to-article-range resolution
//! - `fts`: full-text search strategy ladder
//! - `vector`: in-memory embedding index
//! - `fusion`: Reciprocal Rank Fusion ranker
//! - `enrich`: sibling articles and cross-references
//! - `orchestrator`: public search operations
//! - `readiness`: background vector preload gate
//! - `config`: layered typed configuration
//! - `errors`: crate-wide error taxonomy
//! - `ingestion`: narrow typed write surface for external ingestion
//! - `api`: REST transport over the tool surface

pub mod alias;
pub mod api;
pub mod concept;
pub mod config;
pub mod enrich;
pub mod errors;
pub mod fts;
pub mod fusion;
pub mod ingestion;
pub mod numeral;
pub mod orchestrator;
pub mod readiness;
pub mod splitter;
pub mod storage;
pub mod utils;
pub mod vector;

pub use config::Config;
pub use errors::{Result, SearchError};
pub use orchestrator::Orchestrator;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle status of a law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LawStatus {
    InForce,
    Amended,
    NotYetEffective,
    Repealed,
}

impl LawStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LawStatus::InForce => "in_force",
            LawStatus::Amended => "amended",
            LawStatus::NotYetEffective => "not_yet_effective",
            LawStatus::Repealed => "repealed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_force" => Some(LawStatus::InForce),
            "amended" => Some(LawStatus::Amended),
            "not_yet_effective" => Some(LawStatus::NotYetEffective),
            "repealed" => Some(LawStatus::Repealed),
            _ => None,
        }
    }

    /// Badge rendered in tool-surface payloads. `批量引用核验` uses its own
    /// ✅/❌/❓ scheme independent of this one.
    pub fn badge(&self) -> &'static str {
        match self {
            LawStatus::InForce => "✅",
            LawStatus::Amended => "⚠️",
            LawStatus::NotYetEffective => "⏳",
            LawStatus::Repealed => "⚠️",
        }
    }

    /// Localized label used in user-visible text.
    pub fn label(&self) -> &'static str {
        match self {
            LawStatus::InForce => "现行有效",
            LawStatus::Amended => "已修订",
            LawStatus::NotYetEffective => "尚未生效",
            LawStatus::Repealed => "已废止",
        }
    }
}

/// Category of a law alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasType {
    ShortName,
    Abbreviation,
    Colloquial,
}

/// Kind of cross-reference between articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    Interpretation,
    Conflicting,
    Related,
}

/// A national law, regulation, or judicial interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Law {
    pub id: i64,
    pub title: String,
    pub publish_date: String,
    pub category: String,
    pub status: LawStatus,
    pub content: String,
}

/// A single numbered article within a law.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub law_id: i64,
    pub number_int: i64,
    pub number_str: String,
    pub content: String,
    pub chapter_path: String,
}

/// A short/colloquial alias for a law.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alias {
    pub alias: String,
    pub law_id: i64,
    pub alias_type: AliasType,
    pub confidence: f32,
}

impl Alias {
    pub fn new(alias: impl Into<String>, law_id: i64, alias_type: AliasType, confidence: f32) -> Self {
        Self {
            alias: alias.into(),
            law_id,
            alias_type,
            confidence,
        }
    }
}

/// A legal concept mapped to a law and an article-range hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub topic: String,
    pub law_id: i64,
    pub article_hints: String,
    pub relevance: f32,
}

/// A cross-reference between a statute article and an interpretation article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossReference {
    pub source_law_id: i64,
    pub source_article_int: i64,
    pub target_law_id: i64,
    pub target_article_int: i64,
    pub ref_type: RefType,
}

/// A unit-norm embedding vector for a single article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub article_id: i64,
    pub vector: Vec<f32>,
}

/// Trait implemented by the external embedder collaborator.
///
/// The core only depends on this interface; no embedding model ships with the
/// crate. Implementations must return L2-normalized vectors.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.encode(text).await?);
        }
        Ok(out)
    }
}

/// Engine handle bundling every shared component behind `Arc`s.
///
/// This is the only process-wide state the crate exposes; tests construct their
/// own handle against an isolated store rather than relying on a singleton.
#[derive(Clone)]
pub struct Engine {
    config: Arc<config::Config>,
    storage: Arc<storage::StorageManager>,
    vector_index: Arc<vector::VectorIndex>,
    readiness: Arc<readiness::ReadinessController>,
    orchestrator: Arc<orchestrator::Orchestrator>,
}

impl Engine {
    /// Construct a new engine, opening persistence and spawning the vector preload task.
    pub async fn new(config: config::Config) -> Result<Self> {
        Self::with_embedder(config, None).await
    }

    /// Construct a new engine with an explicit embedder collaborator, used by tests
    /// to inject a deterministic or failing embedder.
    pub async fn with_embedder(
        config: config::Config,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let storage = Arc::new(storage::StorageManager::new(config.storage.clone())?);
        let vector_index = Arc::new(vector::VectorIndex::new(
            config.vector.clone(),
            storage.clone(),
            embedder,
        ));
        let readiness = Arc::new(readiness::ReadinessController::new(config.vector.clone()));
        readiness.spawn_preload(vector_index.clone());

        let orchestrator = Arc::new(orchestrator::Orchestrator::new(
            config.clone(),
            storage.clone(),
            vector_index.clone(),
            readiness.clone(),
        ));

        Ok(Self {
            config,
            storage,
            vector_index,
            readiness,
            orchestrator,
        })
    }

    pub fn orchestrator(&self) -> &orchestrator::Orchestrator {
        &self.orchestrator
    }

    pub fn storage(&self) -> &storage::StorageManager {
        &self.storage
    }

    pub fn vector_index(&self) -> &vector::VectorIndex {
        &self.vector_index
    }

    pub fn config(&self) -> &config::Config {
        &self.config
    }

    /// Clear all LRU caches and restart the vector preload cycle.
    pub fn clear_caches(&self) {
        self.storage.clear_caches();
        self.vector_index.reload();
        self.readiness.reset();
        self.readiness.spawn_preload(self.vector_index.clone());
    }
}

/// Shared application state handed to the REST transport layer.
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
}
