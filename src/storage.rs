//! # Storage Management Module
//!
//! ## Purpose
//! Persistence adapter for the retrieval engine: opens an embedded,
//! write-ahead-logged store, exposes a bounded scoped-acquisition pool over it
//! (mirroring a relational connection pool even though the backing engine is
//! embedded), and hosts the three bounded LRU caches named in the design
//! (alias resolution, law-by-id, concept resolution).
//!
//! ## Key Features
//! - Embedded, durable storage for laws, articles, aliases, topics, synonyms,
//!   cross-references, and embeddings
//! - Bounded scoped-acquisition pool (RAII guard, released on every exit path)
//! - Gzip compression for large statute bodies
//! - Three independently bounded LRU caches, invalidated together by `clear_caches`

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::StorageConfig;
use crate::errors::{Result, SearchError};
use crate::{Alias, Article, CrossReference, Law, LawStatus, RefType, Topic};

/// Resolved alias lookup result: `(law_id, canonical_title, effective_confidence)`.
pub type AliasResolution = (i64, String, f32);

/// A concept/topic hit joined with its law's canonical title, ready for ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptHit {
    pub topic: String,
    pub law_id: i64,
    pub law_title: String,
    pub article_hints: String,
    pub relevance: f32,
}

/// A raw embedding row as loaded for vector index construction.
pub struct EmbeddingRow {
    pub article_id: i64,
    pub vector: Vec<f32>,
    pub article_length: usize,
    pub law_title: String,
}

/// Storage-level statistics, reported by `health_check`/ops tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_laws: u64,
    pub total_articles: u64,
    pub database_size_bytes: u64,
}

/// RAII guard for a scoped pool acquisition. Releases its permit on drop along
/// every exit path, including panics and early returns.
pub struct PoolGuard {
    db: Arc<sled::Db>,
    _permit: OwnedSemaphorePermit,
}

impl PoolGuard {
    pub fn db(&self) -> &sled::Db {
        &self.db
    }
}

/// Persistence adapter owning the connection pool, the on-disk trees, and the
/// three bounded LRU caches.
pub struct StorageManager {
    config: StorageConfig,
    db: Arc<sled::Db>,
    pool: Arc<Semaphore>,

    laws: sled::Tree,
    laws_by_title: sled::Tree,
    articles: sled::Tree,
    articles_by_law: sled::Tree,
    aliases: sled::Tree,
    topics: sled::Tree,
    concept_synonyms_fwd: sled::Tree,
    concept_synonyms_rev: sled::Tree,
    search_synonym_terms: sled::Tree,
    search_synonym_groups: sled::Tree,
    cross_references: sled::Tree,
    embeddings: sled::Tree,

    alias_cache: Mutex<LruCache<String, Option<AliasResolution>>>,
    law_cache: Mutex<LruCache<i64, Law>>,
    concept_cache: Mutex<LruCache<String, Vec<ConceptHit>>>,

    next_synonym_group: AtomicU64,
}

impl StorageManager {
    /// Open (or create) the backing store and every tree it needs.
    pub fn new(config: StorageConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = sled::Config::new()
            .path(&config.db_path)
            .cache_capacity(64 * 1024 * 1024)
            .mode(sled::Mode::LowSpace)
            .open()
            .map_err(|e| SearchError::StoreError {
                operation: "open".to_string(),
                details: format!("{:?}: {e}", config.db_path),
            })?;

        let open_tree = |name: &str| -> Result<sled::Tree> {
            db.open_tree(name).map_err(|e| SearchError::StoreError {
                operation: format!("open_tree({name})"),
                details: e.to_string(),
            })
        };

        let manager = Self {
            laws: open_tree("laws")?,
            laws_by_title: open_tree("laws_by_title")?,
            articles: open_tree("articles")?,
            articles_by_law: open_tree("articles_by_law")?,
            aliases: open_tree("aliases")?,
            topics: open_tree("topics")?,
            concept_synonyms_fwd: open_tree("concept_synonyms_fwd")?,
            concept_synonyms_rev: open_tree("concept_synonyms_rev")?,
            search_synonym_terms: open_tree("search_synonym_terms")?,
            search_synonym_groups: open_tree("search_synonym_groups")?,
            cross_references: open_tree("cross_references")?,
            embeddings: open_tree("embeddings")?,
            pool: Arc::new(Semaphore::new(config.pool_size.max(1))),
            alias_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(config.cache_sizes.alias.max(1)).unwrap(),
            )),
            law_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(config.cache_sizes.law.max(1)).unwrap(),
            )),
            concept_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(config.cache_sizes.concept.max(1)).unwrap(),
            )),
            next_synonym_group: AtomicU64::new(0),
            db: Arc::new(db),
            config,
        };

        tracing::info!(
            db_path = %manager.config.db_path.display(),
            pool_size = manager.config.pool_size,
            "storage manager initialized"
        );

        Ok(manager)
    }

    /// Acquire a scoped slot from the bounded pool. The returned guard releases
    /// its slot when dropped, on every exit path.
    pub async fn acquire(&self) -> Result<PoolGuard> {
        let permit = self
            .pool
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| SearchError::StoreError {
                operation: "acquire".to_string(),
                details: e.to_string(),
            })?;
        Ok(PoolGuard {
            db: self.db.clone(),
            _permit: permit,
        })
    }

    // ---- laws -----------------------------------------------------------

    fn compress(&self, text: &str) -> Result<Vec<u8>> {
        use std::io::Write;
        if !self.config.enable_compression {
            return Ok(text.as_bytes().to_vec());
        }
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(text.as_bytes())?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, data: &[u8]) -> Result<String> {
        use std::io::Read;
        if !self.config.enable_compression {
            return Ok(String::from_utf8_lossy(data).into_owned());
        }
        let mut decoder = flate2::read::GzDecoder::new(data);
        let mut out = String::new();
        decoder.read_to_string(&mut out)?;
        Ok(out)
    }

    /// Next identifier for a law row. `sled`'s counter starts at 0, so this
    /// adds 1 to keep every generated id nonzero (0 is reserved by callers as
    /// "not yet assigned").
    pub fn next_law_id(&self) -> Result<i64> {
        Ok(self.db.generate_id()? as i64 + 1)
    }

    /// Next identifier for an article row. See `next_law_id` for the `+1`.
    pub fn next_article_id(&self) -> Result<i64> {
        Ok(self.db.generate_id()? as i64 + 1)
    }

    pub fn put_law(&self, law: &Law) -> Result<()> {
        let stored = StoredLaw {
            id: law.id,
            title: law.title.clone(),
            publish_date: law.publish_date.clone(),
            category: law.category.clone(),
            status: law.status.as_str().to_string(),
            compressed_content: self.compress(&law.content)?,
        };
        let key = law.id.to_be_bytes();
        self.laws.insert(key, bincode::serialize(&stored)?)?;

        let title_key = law.title.as_bytes();
        let mut ids: Vec<i64> = match self.laws_by_title.get(title_key)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => Vec::new(),
        };
        if !ids.contains(&law.id) {
            ids.push(law.id);
        }
        self.laws_by_title.insert(title_key, bincode::serialize(&ids)?)?;

        tracing::debug!(law_id = law.id, title = %law.title, "law stored");
        Ok(())
    }

    fn decode_law(&self, bytes: &[u8]) -> Result<Law> {
        let stored: StoredLaw = bincode::deserialize(bytes)?;
        Ok(Law {
            id: stored.id,
            title: stored.title,
            publish_date: stored.publish_date,
            category: stored.category,
            status: LawStatus::parse(&stored.status).unwrap_or(LawStatus::InForce),
            content: self.decompress(&stored.compressed_content)?,
        })
    }

    pub fn get_law(&self, law_id: i64) -> Result<Option<Law>> {
        if let Some(law) = self.law_cache.lock().get(&law_id).cloned() {
            return Ok(Some(law));
        }
        let key = law_id.to_be_bytes();
        match self.laws.get(key)? {
            Some(bytes) => {
                let law = self.decode_law(&bytes)?;
                self.law_cache.lock().put(law_id, law.clone());
                Ok(Some(law))
            }
            None => Ok(None),
        }
    }

    /// All stored versions of a law with an exact title match.
    pub fn laws_by_title_exact(&self, title: &str) -> Result<Vec<Law>> {
        let ids: Vec<i64> = match self.laws_by_title.get(title.as_bytes())? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => return Ok(Vec::new()),
        };
        ids.into_iter()
            .filter_map(|id| self.get_law(id).transpose())
            .collect()
    }

    /// Every law whose title contains `needle` (a full tree scan; the corpus
    /// is small enough that this stays well within interactive latency).
    pub fn laws_by_title_substring(&self, needle: &str) -> Result<Vec<Law>> {
        let mut out = Vec::new();
        for entry in self.laws.iter() {
            let (_, bytes) = entry?;
            let law = self.decode_law(&bytes)?;
            if law.title.contains(needle) {
                out.push(law);
            }
        }
        Ok(out)
    }

    /// Every article across every law (full scan — the corpus is small enough
    /// that FTS rungs can afford to operate over this in memory).
    pub fn all_articles(&self) -> Result<Vec<Article>> {
        let mut out = Vec::new();
        for entry in self.articles.iter() {
            let (_, bytes) = entry?;
            out.push(bincode::deserialize(&bytes)?);
        }
        Ok(out)
    }

    pub fn all_laws(&self) -> Result<Vec<Law>> {
        let mut out = Vec::new();
        for entry in self.laws.iter() {
            let (_, bytes) = entry?;
            out.push(self.decode_law(&bytes)?);
        }
        Ok(out)
    }

    // ---- articles ---------------------------------------------------------

    pub fn put_article(&self, article: &Article) -> Result<()> {
        let key = article.id.to_be_bytes();
        self.articles.insert(key, bincode::serialize(article)?)?;

        let mut index_key = Vec::with_capacity(24);
        index_key.extend_from_slice(&article.law_id.to_be_bytes());
        index_key.extend_from_slice(&article.number_int.to_be_bytes());
        index_key.extend_from_slice(&article.id.to_be_bytes());
        self.articles_by_law.insert(index_key, &article.id.to_be_bytes())?;

        tracing::debug!(article_id = article.id, law_id = article.law_id, "article stored");
        Ok(())
    }

    pub fn get_article(&self, article_id: i64) -> Result<Option<Article>> {
        match self.articles.get(article_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All articles belonging to a law, ordered by `number_int` (ascending).
    pub fn articles_for_law(&self, law_id: i64) -> Result<Vec<Article>> {
        let mut out = Vec::new();
        for entry in self.articles_by_law.scan_prefix(law_id.to_be_bytes()) {
            let (_, article_id_bytes) = entry?;
            let article_id = i64::from_be_bytes(article_id_bytes.as_ref().try_into().map_err(
                |_| SearchError::InvariantViolation {
                    location: "articles_by_law index".to_string(),
                    details: "malformed article id".to_string(),
                },
            )?);
            if let Some(article) = self.get_article(article_id)? {
                out.push(article);
            }
        }
        Ok(out)
    }

    /// Exact lookup by `(law_id, number_int)`; when multiple suffix-extended
    /// articles share a `number_int`, all are returned in insertion order.
    pub fn articles_by_number(&self, law_id: i64, number_int: i64) -> Result<Vec<Article>> {
        let mut prefix = Vec::with_capacity(16);
        prefix.extend_from_slice(&law_id.to_be_bytes());
        prefix.extend_from_slice(&number_int.to_be_bytes());
        let mut out = Vec::new();
        for entry in self.articles_by_law.scan_prefix(&prefix) {
            let (_, article_id_bytes) = entry?;
            let article_id = i64::from_be_bytes(article_id_bytes.as_ref().try_into().map_err(
                |_| SearchError::InvariantViolation {
                    location: "articles_by_law index".to_string(),
                    details: "malformed article id".to_string(),
                },
            )?);
            if let Some(article) = self.get_article(article_id)? {
                out.push(article);
            }
        }
        Ok(out)
    }

    /// Fallback lookup: articles whose `number_str` contains `fragment`.
    pub fn articles_number_str_like(&self, law_id: i64, fragment: &str) -> Result<Vec<Article>> {
        Ok(self
            .articles_for_law(law_id)?
            .into_iter()
            .filter(|a| a.number_str.contains(fragment))
            .collect())
    }

    // ---- aliases ------------------------------------------------------------

    pub fn put_alias(&self, alias: &Alias) -> Result<()> {
        let key = alias.alias.as_bytes();
        let mut rows: Vec<Alias> = match self.aliases.get(key)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => Vec::new(),
        };
        rows.push(alias.clone());
        self.aliases.insert(key, bincode::serialize(&rows)?)?;
        Ok(())
    }

    pub fn aliases_exact(&self, alias: &str) -> Result<Vec<Alias>> {
        match self.aliases.get(alias.as_bytes())? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn aliases_substring(&self, needle: &str) -> Result<Vec<Alias>> {
        let mut out = Vec::new();
        for entry in self.aliases.iter() {
            let (key, bytes) = entry?;
            let alias_text = String::from_utf8_lossy(&key);
            if alias_text.contains(needle) {
                let rows: Vec<Alias> = bincode::deserialize(&bytes)?;
                out.extend(rows);
            }
        }
        Ok(out)
    }

    pub fn alias_cache_get(&self, key: &str) -> Option<Option<AliasResolution>> {
        self.alias_cache.lock().get(key).cloned()
    }

    pub fn alias_cache_put(&self, key: String, value: Option<AliasResolution>) {
        self.alias_cache.lock().put(key, value);
    }

    // ---- topics / concepts ---------------------------------------------------

    pub fn put_topic(&self, topic: &Topic) -> Result<()> {
        let key = topic.topic.as_bytes();
        let mut rows: Vec<Topic> = match self.topics.get(key)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => Vec::new(),
        };
        rows.push(topic.clone());
        self.topics.insert(key, bincode::serialize(&rows)?)?;
        Ok(())
    }

    fn topic_rows_to_hits(&self, rows: Vec<Topic>) -> Result<Vec<ConceptHit>> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let title = self
                .get_law(row.law_id)?
                .map(|l| l.title)
                .unwrap_or_default();
            out.push(ConceptHit {
                topic: row.topic,
                law_id: row.law_id,
                law_title: title,
                article_hints: row.article_hints,
                relevance: row.relevance,
            });
        }
        Ok(out)
    }

    pub fn topics_exact(&self, term: &str) -> Result<Vec<ConceptHit>> {
        let rows: Vec<Topic> = match self.topics.get(term.as_bytes())? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => return Ok(Vec::new()),
        };
        self.topic_rows_to_hits(rows)
    }

    pub fn topics_substring(&self, needle: &str, limit: usize) -> Result<Vec<ConceptHit>> {
        let mut rows = Vec::new();
        for entry in self.topics.iter() {
            let (key, bytes) = entry?;
            if String::from_utf8_lossy(&key).contains(needle) {
                let topic_rows: Vec<Topic> = bincode::deserialize(&bytes)?;
                rows.extend(topic_rows);
                if rows.len() >= limit {
                    break;
                }
            }
        }
        rows.truncate(limit);
        self.topic_rows_to_hits(rows)
    }

    pub fn concept_cache_get(&self, key: &str) -> Option<Vec<ConceptHit>> {
        self.concept_cache.lock().get(key).cloned()
    }

    pub fn concept_cache_put(&self, key: String, value: Vec<ConceptHit>) {
        self.concept_cache.lock().put(key, value);
    }

    // ---- synonyms -------------------------------------------------------------

    pub fn put_concept_synonym(&self, term: &str, canonical_term: &str) -> Result<()> {
        self.concept_synonyms_fwd
            .insert(term.as_bytes(), canonical_term.as_bytes())?;
        let key = canonical_term.as_bytes();
        let mut reverse: Vec<String> = match self.concept_synonyms_rev.get(key)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => Vec::new(),
        };
        if !reverse.iter().any(|t| t == term) {
            reverse.push(term.to_string());
        }
        self.concept_synonyms_rev
            .insert(key, bincode::serialize(&reverse)?)?;
        Ok(())
    }

    pub fn concept_synonym_forward(&self, term: &str) -> Result<Option<String>> {
        match self.concept_synonyms_fwd.get(term.as_bytes())? {
            Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            None => Ok(None),
        }
    }

    pub fn concept_synonym_reverse(&self, canonical_term: &str) -> Result<Vec<String>> {
        match self.concept_synonyms_rev.get(canonical_term.as_bytes())? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Register `words` as members of one synonym group for FTS expansion.
    pub fn put_search_synonym_group(&self, words: &[String]) -> Result<u64> {
        let group_id = self.next_synonym_group.fetch_add(1, Ordering::SeqCst);
        self.search_synonym_groups
            .insert(group_id.to_be_bytes(), bincode::serialize(words)?)?;
        for word in words {
            self.search_synonym_terms
                .insert(word.as_bytes(), &group_id.to_be_bytes())?;
        }
        Ok(group_id)
    }

    pub fn search_synonym_group_for(&self, word: &str) -> Result<Vec<String>> {
        let group_id = match self.search_synonym_terms.get(word.as_bytes())? {
            Some(bytes) => u64::from_be_bytes(bytes.as_ref().try_into().map_err(|_| {
                SearchError::InvariantViolation {
                    location: "search_synonym_terms".to_string(),
                    details: "malformed group id".to_string(),
                }
            })?),
            None => return Ok(vec![word.to_string()]),
        };
        match self.search_synonym_groups.get(group_id.to_be_bytes())? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(vec![word.to_string()]),
        }
    }

    // ---- cross references --------------------------------------------------

    pub fn put_cross_reference(&self, xref: &CrossReference) -> Result<()> {
        let mut key = Vec::with_capacity(16);
        key.extend_from_slice(&xref.source_law_id.to_be_bytes());
        key.extend_from_slice(&xref.source_article_int.to_be_bytes());
        let mut rows: Vec<StoredXref> = match self.cross_references.get(&key)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => Vec::new(),
        };
        rows.push(StoredXref {
            target_law_id: xref.target_law_id,
            target_article_int: xref.target_article_int,
            ref_type: match xref.ref_type {
                RefType::Interpretation => "interpretation",
                RefType::Conflicting => "conflicting",
                RefType::Related => "related",
            }
            .to_string(),
        });
        self.cross_references.insert(key, bincode::serialize(&rows)?)?;
        Ok(())
    }

    pub fn cross_references_for(
        &self,
        source_law_id: i64,
        source_article_int: i64,
    ) -> Result<Vec<CrossReference>> {
        let mut key = Vec::with_capacity(16);
        key.extend_from_slice(&source_law_id.to_be_bytes());
        key.extend_from_slice(&source_article_int.to_be_bytes());
        let rows: Vec<StoredXref> = match self.cross_references.get(&key)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => return Ok(Vec::new()),
        };
        Ok(rows
            .into_iter()
            .map(|r| CrossReference {
                source_law_id,
                source_article_int,
                target_law_id: r.target_law_id,
                target_article_int: r.target_article_int,
                ref_type: match r.ref_type.as_str() {
                    "conflicting" => RefType::Conflicting,
                    "related" => RefType::Related,
                    _ => RefType::Interpretation,
                },
            })
            .collect())
    }

    // ---- embeddings -----------------------------------------------------------

    pub fn put_embedding(&self, article_id: i64, vector: &[f32]) -> Result<()> {
        let mut bytes = Vec::with_capacity(vector.len() * 4);
        for v in vector {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        self.embeddings.insert(article_id.to_be_bytes(), bytes)?;
        Ok(())
    }

    /// Load every embedding joined with its article length and law title, for
    /// vector index construction.
    pub fn all_embeddings(&self) -> Result<Vec<EmbeddingRow>> {
        let mut out = Vec::new();
        for entry in self.embeddings.iter() {
            let (key, bytes) = entry?;
            let article_id = i64::from_be_bytes(key.as_ref().try_into().map_err(|_| {
                SearchError::InvariantViolation {
                    location: "embeddings".to_string(),
                    details: "malformed article id key".to_string(),
                }
            })?);

            if bytes.len() % 4 != 0 {
                tracing::warn!(article_id, "embedding blob length is not a multiple of 4, skipping");
                continue;
            }
            let vector: Vec<f32> = bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();

            let article = match self.get_article(article_id)? {
                Some(a) => a,
                None => {
                    tracing::warn!(article_id, "embedding references missing article, skipping");
                    continue;
                }
            };
            let law_title = self
                .get_law(article.law_id)?
                .map(|l| l.title)
                .unwrap_or_default();

            out.push(EmbeddingRow {
                article_id,
                vector,
                article_length: article.content.chars().count(),
                law_title,
            });
        }
        Ok(out)
    }

    // ---- lifecycle -------------------------------------------------------------

    /// Empty all three LRU caches. Does not touch persisted data.
    pub fn clear_caches(&self) {
        self.alias_cache.lock().clear();
        self.law_cache.lock().clear();
        self.concept_cache.lock().clear();
        tracing::info!("storage caches cleared");
    }

    pub fn health_check(&self) -> Result<()> {
        let test_key = b"__health_check__";
        self.laws.insert(test_key, b"ok".as_slice())?;
        let found = self.laws.get(test_key)?;
        self.laws.remove(test_key)?;
        if found.is_none() {
            return Err(SearchError::StoreError {
                operation: "health_check".to_string(),
                details: "round-trip value not found".to_string(),
            });
        }
        Ok(())
    }

    pub fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            total_laws: self.laws.len() as u64,
            total_articles: self.articles.len() as u64,
            database_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredLaw {
    id: i64,
    title: String,
    publish_date: String,
    category: String,
    status: String,
    compressed_content: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredXref {
    target_law_id: i64,
    target_article_int: i64,
    ref_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSizes;

    fn test_config() -> StorageConfig {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        std::mem::forget(dir);
        StorageConfig {
            db_path,
            pool_size: 2,
            enable_compression: true,
            cache_sizes: CacheSizes {
                alias: 10,
                law: 10,
                concept: 10,
            },
        }
    }

    fn sample_law(id: i64, title: &str) -> Law {
        Law {
            id,
            title: title.to_string(),
            publish_date: "2021-01-01".to_string(),
            category: "法律".to_string(),
            status: LawStatus::InForce,
            content: "第一条 示例内容。".to_string(),
        }
    }

    #[test]
    fn stores_and_retrieves_law_by_id_through_cache() {
        let storage = StorageManager::new(test_config()).unwrap();
        let law = sample_law(1, "中华人民共和国民法典");
        storage.put_law(&law).unwrap();

        let fetched = storage.get_law(1).unwrap().unwrap();
        assert_eq!(fetched.title, "中华人民共和国民法典");
        assert_eq!(fetched.content, law.content);
    }

    #[test]
    fn title_substring_scan_finds_partial_matches() {
        let storage = StorageManager::new(test_config()).unwrap();
        storage.put_law(&sample_law(1, "中华人民共和国民法典")).unwrap();
        storage.put_law(&sample_law(2, "中华人民共和国刑法")).unwrap();

        let hits = storage.laws_by_title_substring("民法典").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn articles_by_number_returns_suffix_extended_siblings() {
        let storage = StorageManager::new(test_config()).unwrap();
        storage.put_law(&sample_law(1, "中华人民共和国民法典")).unwrap();
        storage
            .put_article(&Article {
                id: 10,
                law_id: 1,
                number_int: 538,
                number_str: "538".to_string(),
                content: "第五百三十八条 ...".to_string(),
                chapter_path: String::new(),
            })
            .unwrap();
        storage
            .put_article(&Article {
                id: 11,
                law_id: 1,
                number_int: 538,
                number_str: "538之一".to_string(),
                content: "第五百三十八条之一 ...".to_string(),
                chapter_path: String::new(),
            })
            .unwrap();

        let found = storage.articles_by_number(1, 538).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn clear_caches_empties_all_three() {
        let storage = StorageManager::new(test_config()).unwrap();
        storage.alias_cache_put("民法典".to_string(), Some((1, "x".to_string(), 1.0)));
        storage.law_cache.lock().put(1, sample_law(1, "x"));
        storage.concept_cache_put("债权".to_string(), vec![]);
        storage.clear_caches();

        assert!(storage.alias_cache_get("民法典").is_none());
        assert!(storage.concept_cache_get("债权").is_none());
    }
}
