//! # Vector Index
//!
//! ## Purpose
//! Holds an in-memory, L2-normalized embedding matrix for cosine similarity
//! search, with a per-article boost factor applied on top of raw cosine
//! score. Loading is mutex-guarded and happens at most once per generation;
//! once loaded the matrix is read-only and searches proceed lock-free.
//!
//! ## Key Features
//! - Single mutex-guarded load transition; concurrent callers during loading
//!   wait on the same future rather than racing redundant loads
//! - Boost factors for core laws and short/procedural articles
//! - `reload()` invalidates the matrix so the next search rebuilds it

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::VectorConfig;
use crate::errors::{Result, SearchError};
use crate::storage::StorageManager;
use crate::Embedder;

/// A single ranked vector search hit.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub article_id: i64,
    pub score: f32,
    pub raw_score: f32,
}

struct LoadedMatrix {
    ids: Vec<i64>,
    matrix: Vec<f32>,
    boost: Vec<f32>,
    dimension: usize,
}

impl LoadedMatrix {
    fn row(&self, i: usize) -> &[f32] {
        &self.matrix[i * self.dimension..(i + 1) * self.dimension]
    }
}

/// In-memory semantic index over article embeddings.
pub struct VectorIndex {
    config: VectorConfig,
    storage: Arc<StorageManager>,
    embedder: Option<Arc<dyn Embedder>>,
    load_gate: AsyncMutex<()>,
    loaded: RwLock<Option<Arc<LoadedMatrix>>>,
    load_count: AtomicUsize,
}

fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute the multiplicative boost for an article row given its law title
/// and character length.
pub fn compute_boost(config: &VectorConfig, law_title: &str, article_length: usize) -> f32 {
    let mut boost = 1.0f32;
    if config.core_law_titles.iter().any(|t| law_title.contains(t.as_str())) {
        boost *= config.core_law_boost;
    }
    if article_length < config.very_short_article_threshold {
        boost *= 0.1;
    } else if article_length < config.short_article_threshold {
        boost *= 0.5;
    }
    boost
}

impl VectorIndex {
    pub fn new(config: VectorConfig, storage: Arc<StorageManager>, embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self {
            config,
            storage,
            embedder,
            load_gate: AsyncMutex::new(()),
            loaded: RwLock::new(None),
            load_count: AtomicUsize::new(0),
        }
    }

    /// Number of times the matrix has actually been (re)built. Exposed for
    /// concurrency tests asserting the load happens exactly once per
    /// generation under concurrent callers.
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.read().is_some()
    }

    /// Invalidate the current matrix; the next call to `ensure_loaded` or
    /// `search` rebuilds it from persistence.
    pub fn reload(&self) {
        *self.loaded.write() = None;
    }

    /// Load the matrix if it is not already loaded. Safe to call from many
    /// concurrent tasks: only one performs the actual build.
    pub async fn ensure_loaded(&self) -> Result<()> {
        if self.loaded.read().is_some() {
            return Ok(());
        }
        let _guard = self.load_gate.lock().await;
        if self.loaded.read().is_some() {
            return Ok(());
        }

        match self.build_matrix() {
            Ok(matrix) => {
                let n = matrix.ids.len();
                *self.loaded.write() = Some(Arc::new(matrix));
                self.load_count.fetch_add(1, Ordering::SeqCst);
                tracing::info!(rows = n, "vector index loaded");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "vector index failed to load; vector search will degrade to empty");
                *self.loaded.write() = Some(Arc::new(LoadedMatrix {
                    ids: Vec::new(),
                    matrix: Vec::new(),
                    boost: Vec::new(),
                    dimension: self.config.dimension,
                }));
                self.load_count.fetch_add(1, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn build_matrix(&self) -> Result<LoadedMatrix> {
        let rows = self.storage.all_embeddings()?;
        let dimension = self.config.dimension;

        let mut ids = Vec::with_capacity(rows.len());
        let mut matrix = Vec::with_capacity(rows.len() * dimension);
        let mut boost = Vec::with_capacity(rows.len());

        for row in rows {
            if row.vector.len() != dimension {
                tracing::warn!(
                    article_id = row.article_id,
                    expected = dimension,
                    actual = row.vector.len(),
                    "embedding dimension mismatch, skipping row"
                );
                continue;
            }
            ids.push(row.article_id);
            matrix.extend(l2_normalize(&row.vector));
            boost.push(compute_boost(&self.config, &row.law_title, row.article_length));
        }

        Ok(LoadedMatrix { ids, matrix, boost, dimension })
    }

    /// Encode `text` and return the top `limit` articles by boosted cosine score.
    pub async fn search(&self, text: &str, limit: usize) -> Result<Vec<VectorHit>> {
        self.ensure_loaded().await.ok();

        let loaded = self.loaded.read().clone();
        let loaded = match loaded {
            Some(l) if !l.ids.is_empty() => l,
            _ => return Ok(Vec::new()),
        };

        let embedder = match &self.embedder {
            Some(e) => e,
            None => {
                return Err(SearchError::EmbedderUnavailable {
                    reason: "no embedder configured".to_string(),
                })
            }
        };

        let query = l2_normalize(&embedder.encode(text).await?);

        let mut scored: Vec<VectorHit> = (0..loaded.ids.len())
            .map(|i| {
                let raw = dot(loaded.row(i), &query);
                VectorHit {
                    article_id: loaded.ids[i],
                    score: raw * loaded.boost[i],
                    raw_score: raw,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheSizes, StorageConfig};
    use crate::{Article, Law, LawStatus};
    use async_trait::async_trait;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            Err(SearchError::VectorTimeout { timeout_ms: 10_000 })
        }
    }

    fn test_storage() -> Arc<StorageManager> {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("vector_test.db");
        std::mem::forget(dir);
        Arc::new(
            StorageManager::new(StorageConfig {
                db_path,
                pool_size: 2,
                enable_compression: false,
                cache_sizes: CacheSizes { alias: 10, law: 10, concept: 10 },
            })
            .unwrap(),
        )
    }

    fn vector_config() -> VectorConfig {
        VectorConfig {
            model_name: "test-model".to_string(),
            dimension: 4,
            preload_timeout_ms: 1000,
            search_timeout_ms: 1000,
            core_law_titles: vec!["民法典".to_string()],
            core_law_boost: 1.15,
            short_article_threshold: 50,
            very_short_article_threshold: 20,
        }
    }

    #[test]
    fn boost_matches_literal_spot_checks() {
        let config = vector_config();
        assert_eq!(compute_boost(&config, "中华人民共和国民法典", 10), 1.15 * 0.1);
        assert_eq!(compute_boost(&config, "中华人民共和国民法典", 40), 1.15 * 0.5);
        assert_eq!(compute_boost(&config, "中华人民共和国民法典", 300), 1.15);
        assert_eq!(compute_boost(&config, "中华人民共和国刑法", 300), 1.0);
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_times_boost() {
        let storage = test_storage();
        storage
            .put_law(&Law {
                id: 1,
                title: "中华人民共和国民法典".to_string(),
                publish_date: "2020-05-28".to_string(),
                category: "法律".to_string(),
                status: LawStatus::InForce,
                content: String::new(),
            })
            .unwrap();
        storage
            .put_article(&Article {
                id: 10,
                law_id: 1,
                number_int: 1023,
                number_str: "1023".to_string(),
                content: "第一千零二十三条 ".to_string() + &"声".repeat(60),
                chapter_path: String::new(),
            })
            .unwrap();
        storage.put_embedding(10, &[1.0, 0.0, 0.0, 0.0]).unwrap();

        let index = VectorIndex::new(
            vector_config(),
            storage,
            Some(Arc::new(FixedEmbedder(vec![1.0, 0.0, 0.0, 0.0]))),
        );

        let hits = index.search("声音权益", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].article_id, 10);
        assert!((hits[0].raw_score - 1.0).abs() < 1e-6);
        assert!((hits[0].score - 1.15).abs() < 1e-6);
    }

    #[tokio::test]
    async fn load_happens_exactly_once_under_concurrent_callers() {
        let storage = test_storage();
        let index = Arc::new(VectorIndex::new(
            vector_config(),
            storage,
            Some(Arc::new(FixedEmbedder(vec![0.0; 4]))),
        ));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let index = index.clone();
            handles.push(tokio::spawn(async move {
                index.ensure_loaded().await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(index.load_count(), 1);
    }

    #[tokio::test]
    async fn embedder_failure_degrades_to_error_without_panicking() {
        let storage = test_storage();
        let index = VectorIndex::new(vector_config(), storage, Some(Arc::new(FailingEmbedder)));
        let result = index.search("合同解除权", 5).await;
        assert!(result.is_err());
    }
}
