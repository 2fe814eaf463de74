//! # Readiness Controller
//!
//! ## Purpose
//! At startup, spawns a background task that loads the vector index and then
//! signals a one-shot readiness event — always, whether the load succeeded or
//! failed, so waiters never block indefinitely. Any path needing vector
//! search awaits the event with a bounded deadline; failure downgrades vector
//! search to a no-op rather than aborting the request.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::config::VectorConfig;
use crate::vector::VectorIndex;

/// Gates vector-search readiness behind a background preload task.
pub struct ReadinessController {
    config: VectorConfig,
    channel: Mutex<(watch::Sender<bool>, watch::Receiver<bool>)>,
}

impl ReadinessController {
    pub fn new(config: VectorConfig) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            config,
            channel: Mutex::new((tx, rx)),
        }
    }

    /// Spawn the background preload task for the current generation. The
    /// task always signals the gate on completion, independent of outcome.
    pub fn spawn_preload(&self, vector_index: Arc<VectorIndex>) {
        let tx = self.channel.lock().0.clone();
        tokio::spawn(async move {
            if let Err(e) = vector_index.ensure_loaded().await {
                tracing::warn!(error = %e, "vector index preload failed; vector search will degrade");
            }
            let _ = tx.send(true);
        });
    }

    /// Wait for the current generation's preload to finish, up to
    /// `preload_timeout_ms`. Returns `false` on timeout — callers should treat
    /// that as "vector path unavailable for this request" rather than an error.
    pub async fn wait_ready(&self) -> bool {
        let mut rx = self.channel.lock().1.clone();
        if *rx.borrow() {
            return true;
        }
        let deadline = Duration::from_millis(self.config.preload_timeout_ms);
        match tokio::time::timeout(deadline, rx.changed()).await {
            Ok(Ok(())) => *rx.borrow(),
            _ => {
                tracing::warn!(
                    timeout_ms = self.config.preload_timeout_ms,
                    "vector readiness gate timed out"
                );
                false
            }
        }
    }

    /// Start a fresh generation: readers that haven't observed the previous
    /// signal yet keep waiting on their own clone, but any new `wait_ready`
    /// call waits on a channel that starts unset again.
    pub fn reset(&self) {
        let (tx, rx) = watch::channel(false);
        *self.channel.lock() = (tx, rx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheSizes, StorageConfig};
    use crate::storage::StorageManager;
    use async_trait::async_trait;
    use crate::errors::Result;
    use crate::Embedder;

    struct NoopEmbedder;

    #[async_trait]
    impl Embedder for NoopEmbedder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 4])
        }
    }

    fn vector_config(preload_timeout_ms: u64) -> VectorConfig {
        VectorConfig {
            model_name: "test-model".to_string(),
            dimension: 4,
            preload_timeout_ms,
            search_timeout_ms: 1000,
            core_law_titles: vec![],
            core_law_boost: 1.15,
            short_article_threshold: 50,
            very_short_article_threshold: 20,
        }
    }

    fn storage() -> Arc<StorageManager> {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("readiness_test.db");
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

    #[tokio::test]
    async fn becomes_ready_after_preload_completes() {
        let config = vector_config(5_000);
        let controller = ReadinessController::new(config.clone());
        let index = Arc::new(VectorIndex::new(config, storage(), Some(Arc::new(NoopEmbedder))));

        controller.spawn_preload(index);
        assert!(controller.wait_ready().await);
    }

    #[tokio::test]
    async fn reset_starts_a_fresh_generation() {
        let config = vector_config(5_000);
        let controller = ReadinessController::new(config.clone());
        let index = Arc::new(VectorIndex::new(config.clone(), storage(), Some(Arc::new(NoopEmbedder))));
        controller.spawn_preload(index.clone());
        assert!(controller.wait_ready().await);

        controller.reset();
        index.reload();
        controller.spawn_preload(index);
        assert!(controller.wait_ready().await);
    }
}
