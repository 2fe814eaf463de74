//! # Ingestion Adapter
//!
//! ## Purpose
//! Narrow typed write surface used by offline corpus-loading tooling. Each
//! method performs exactly one validated insert against the persistence
//! adapter; none of them parse raw statute text themselves — that is the
//! splitter's job, run by the caller before handing rows here.

use std::sync::Arc;

use crate::errors::{Result, SearchError};
use crate::storage::StorageManager;
use crate::{Alias, Article, CrossReference, Law, Topic};

/// Thin validated write surface over [`StorageManager`].
pub struct IngestionAdapter {
    storage: Arc<StorageManager>,
}

impl IngestionAdapter {
    pub fn new(storage: Arc<StorageManager>) -> Self {
        Self { storage }
    }

    /// Insert a law, assigning it an id if the caller hasn't already.
    pub fn insert_law(&self, mut law: Law) -> Result<i64> {
        if law.title.trim().is_empty() {
            return Err(SearchError::ValidationFailed {
                field: "title".to_string(),
                reason: "law title cannot be empty".to_string(),
            });
        }
        if law.id == 0 {
            law.id = self.storage.next_law_id()?;
        }
        let id = law.id;
        self.storage.put_law(&law)?;
        tracing::info!(law_id = id, title = %law.title, "law ingested");
        Ok(id)
    }

    /// Insert an article under `law_id`, assigning it an id if needed.
    pub fn insert_article(&self, mut article: Article) -> Result<i64> {
        if self.storage.get_law(article.law_id)?.is_none() {
            return Err(SearchError::ValidationFailed {
                field: "law_id".to_string(),
                reason: format!("no law with id {}", article.law_id),
            });
        }
        if article.id == 0 {
            article.id = self.storage.next_article_id()?;
        }
        let id = article.id;
        self.storage.put_article(&article)?;
        tracing::debug!(article_id = id, law_id = article.law_id, "article ingested");
        Ok(id)
    }

    /// Insert an alias row, validating the target law exists.
    pub fn insert_alias(&self, alias: Alias) -> Result<()> {
        if self.storage.get_law(alias.law_id)?.is_none() {
            return Err(SearchError::ValidationFailed {
                field: "law_id".to_string(),
                reason: format!("no law with id {}", alias.law_id),
            });
        }
        self.storage.put_alias(&alias)?;
        tracing::debug!(alias = %alias.alias, law_id = alias.law_id, "alias ingested");
        Ok(())
    }

    /// Insert a concept/topic mapping row, validating the target law exists.
    pub fn insert_topic(&self, topic: Topic) -> Result<()> {
        if self.storage.get_law(topic.law_id)?.is_none() {
            return Err(SearchError::ValidationFailed {
                field: "law_id".to_string(),
                reason: format!("no law with id {}", topic.law_id),
            });
        }
        self.storage.put_topic(&topic)?;
        tracing::debug!(topic = %topic.topic, law_id = topic.law_id, "topic ingested");
        Ok(())
    }

    /// Insert a cross-reference, validating both endpoints resolve to laws.
    pub fn insert_cross_reference(&self, xref: CrossReference) -> Result<()> {
        if self.storage.get_law(xref.source_law_id)?.is_none() {
            return Err(SearchError::ValidationFailed {
                field: "source_law_id".to_string(),
                reason: format!("no law with id {}", xref.source_law_id),
            });
        }
        if self.storage.get_law(xref.target_law_id)?.is_none() {
            return Err(SearchError::ValidationFailed {
                field: "target_law_id".to_string(),
                reason: format!("no law with id {}", xref.target_law_id),
            });
        }
        self.storage.put_cross_reference(&xref)?;
        tracing::debug!(
            source_law_id = xref.source_law_id,
            source_article_int = xref.source_article_int,
            target_law_id = xref.target_law_id,
            "cross-reference ingested"
        );
        Ok(())
    }

    /// Insert an embedding for `article_id`, validating the dimension and
    /// that the article exists.
    pub fn insert_embedding(&self, article_id: i64, vector: Vec<f32>, expected_dimension: usize) -> Result<()> {
        if self.storage.get_article(article_id)?.is_none() {
            return Err(SearchError::ValidationFailed {
                field: "article_id".to_string(),
                reason: format!("no article with id {article_id}"),
            });
        }
        if vector.len() != expected_dimension {
            return Err(SearchError::ValidationFailed {
                field: "vector".to_string(),
                reason: format!(
                    "expected dimension {expected_dimension}, got {}",
                    vector.len()
                ),
            });
        }
        self.storage.put_embedding(article_id, &vector)?;
        tracing::debug!(article_id, dimension = vector.len(), "embedding ingested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheSizes, StorageConfig};
    use crate::{AliasType, LawStatus};

    fn storage() -> Arc<StorageManager> {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ingestion_test.db");
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

    fn sample_law() -> Law {
        Law {
            id: 0,
            title: "中华人民共和国民法典".to_string(),
            publish_date: "2020-05-28".to_string(),
            category: "法律".to_string(),
            status: LawStatus::InForce,
            content: "第一条 ...".to_string(),
        }
    }

    #[test]
    fn insert_law_assigns_id_when_absent() {
        let adapter = IngestionAdapter::new(storage());
        let id = adapter.insert_law(sample_law()).unwrap();
        assert!(id > 0);
    }

    #[test]
    fn insert_law_rejects_empty_title() {
        let adapter = IngestionAdapter::new(storage());
        let mut law = sample_law();
        law.title = "  ".to_string();
        assert!(adapter.insert_law(law).is_err());
    }

    #[test]
    fn insert_article_rejects_unknown_law() {
        let adapter = IngestionAdapter::new(storage());
        let article = Article {
            id: 0,
            law_id: 999,
            number_int: 1,
            number_str: "1".to_string(),
            content: "...".to_string(),
            chapter_path: String::new(),
        };
        assert!(adapter.insert_article(article).is_err());
    }

    #[test]
    fn insert_alias_and_embedding_roundtrip() {
        let storage = storage();
        let adapter = IngestionAdapter::new(storage.clone());
        let law_id = adapter.insert_law(sample_law()).unwrap();
        adapter
            .insert_alias(Alias::new("民法典", law_id, AliasType::ShortName, 1.0))
            .unwrap();

        let article_id = adapter
            .insert_article(Article {
                id: 0,
                law_id,
                number_int: 1,
                number_str: "1".to_string(),
                content: "第一条 ...".to_string(),
                chapter_path: String::new(),
            })
            .unwrap();

        adapter.insert_embedding(article_id, vec![0.1, 0.2, 0.3], 3).unwrap();
        assert!(adapter.insert_embedding(article_id, vec![0.1], 3).is_err());
    }
}
