//! # Query Orchestrator
//!
//! ## Purpose
//! The public tool surface: eight operations composing alias resolution,
//! concept lookup, the full-text ladder, and vector search, in that priority
//! order, fused where more than one path contributes. A failure on any single
//! path is logged and the remaining paths still run — no operation here
//! aborts a request because one retrieval path errored.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::errors::{Result, SearchError};
use crate::readiness::ReadinessController;
use crate::storage::StorageManager;
use crate::vector::{self, VectorIndex};
use crate::{alias, concept, enrich, fts, fusion, splitter};
use crate::{Law, LawStatus};

const SIBLING_SNIPPET_CHARS: usize = 200;
const MAX_CITATION_KEYWORDS: usize = 8;

/// Legal-filler words excluded when deriving search keywords from free text.
const STOPWORDS: &[&str] = &[
    "的", "了", "和", "与", "或", "在", "对", "为", "是", "及", "等", "之", "其", "该",
    "应当", "依照", "根据", "按照", "本", "条", "款", "项", "规定", "以及", "并",
];

static QUOTED_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"《([^》]+)》第([0-9〇零一二三四五六七八九十百千万]+)条(之([0-9〇零一二三四五六七八九十百千万]+))?")
        .unwrap()
});

static BARE_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([\u{4e00}-\u{9fff}]{2,}?(?:法|典|条例|规定|办法))第([0-9〇零一二三四五六七八九十百千万]+)条(之([0-9〇零一二三四五六七八九十百千万]+))?",
    )
    .unwrap()
});

/// Bundles every shared component behind `Arc`s; cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<Config>,
    storage: Arc<StorageManager>,
    vector_index: Arc<VectorIndex>,
    readiness: Arc<ReadinessController>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<Config>,
        storage: Arc<StorageManager>,
        vector_index: Arc<VectorIndex>,
        readiness: Arc<ReadinessController>,
    ) -> Self {
        Self {
            config,
            storage,
            vector_index,
            readiness,
        }
    }

    /// Run vector search on a background task, bounded by `search_timeout_ms`.
    /// A timed-out or panicked worker returns `Err`; callers treat that as a
    /// degraded (empty) vector path rather than a request failure.
    async fn timed_vector_search(&self, query: &str, limit: usize) -> Result<Vec<vector::VectorHit>> {
        let vector_index = self.vector_index.clone();
        let query = query.to_string();
        let deadline = Duration::from_millis(self.config.vector.search_timeout_ms);
        let handle = tokio::spawn(async move { vector_index.search(&query, limit).await });
        match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(inner)) => inner,
            Ok(Err(_join_err)) => Err(SearchError::Internal {
                message: "vector search worker panicked".to_string(),
            }),
            Err(_) => Err(SearchError::VectorTimeout {
                timeout_ms: self.config.vector.search_timeout_ms,
            }),
        }
    }

    fn resolve_law(&self, query: &str) -> Result<Option<Law>> {
        if let Some((law_id, _, _)) = alias::resolve(&self.storage, query) {
            if let Some(law) = self.storage.get_law(law_id)? {
                return Ok(Some(law));
            }
        }
        if let Some(law) = pick_latest(self.storage.laws_by_title_exact(query)?) {
            return Ok(Some(law));
        }
        Ok(pick_latest(self.storage.laws_by_title_substring(query)?))
    }

    /// `search_laws`: alias (verbatim) → concept (inline extracts) →
    /// FTS ladder → vector (only if the first three haven't already filled
    /// `limit`, gated on readiness with a bounded wait).
    pub async fn search_laws(
        &self,
        query: &str,
        category: Option<String>,
        status: Option<LawStatus>,
        limit: Option<usize>,
    ) -> Result<String> {
        let limit = limit.unwrap_or(self.config.search.default_max_results);
        let mut sections: Vec<String> = Vec::new();
        let mut filled = 0usize;

        if let Some((law_id, _, confidence)) = alias::resolve(&self.storage, query) {
            if let Some(law) = self.storage.get_law(law_id)? {
                sections.push(format!(
                    "📌 精确匹配\n\n### {}\n- **类别**: {}\n- **状态**: {} {}\n- **匹配置信度**: {:.2}\n",
                    law.title,
                    law.category,
                    law.status.label(),
                    law.status.badge(),
                    confidence
                ));
                filled += 1;
            }
        }

        let concept_hits = concept::resolve(&self.storage, query);
        if !concept_hits.is_empty() {
            let mut block = String::from("📂 概念匹配\n\n");
            for hit in &concept_hits {
                block.push_str(&format!("### {} · {}\n", hit.topic, hit.law_title));
                for article_int in concept::parse_article_hints(&hit.article_hints) {
                    if let Some(article) = self
                        .storage
                        .articles_by_number(hit.law_id, article_int)?
                        .into_iter()
                        .next()
                    {
                        block.push_str(&format!(
                            "- 第{}条: {}\n",
                            article.number_str,
                            truncate_chars(&article.content, 80)
                        ));
                    }
                }
                block.push('\n');
            }
            filled += concept_hits.len();
            sections.push(block);
        }

        let filters = fts::FtsFilters {
            category,
            status: Some(status.unwrap_or(LawStatus::InForce)),
        };
        let fts_limit = limit.saturating_sub(filled).max(3);
        let fts_hits = fts::search_laws_fts(&self.storage, query, &filters, fts_limit)?;
        if !fts_hits.is_empty() {
            let mut block = String::from("📄 全文匹配\n\n");
            for hit in &fts_hits {
                block.push_str(&format!(
                    "- {} ({} {})\n",
                    hit.law.title,
                    hit.law.status.label(),
                    hit.law.status.badge()
                ));
            }
            filled += fts_hits.len();
            sections.push(block);
        }

        if filled < limit {
            if self.readiness.wait_ready().await {
                match self.timed_vector_search(query, limit.saturating_sub(filled)).await {
                    Ok(hits) if !hits.is_empty() => {
                        let mut block = String::from("🧭 语义匹配\n\n");
                        for hit in hits {
                            if let Some(article) = self.storage.get_article(hit.article_id)? {
                                if let Some(law) = self.storage.get_law(article.law_id)? {
                                    block.push_str(&format!(
                                        "- {} 第{}条 (score {:.3})\n",
                                        law.title, article.number_str, hit.score
                                    ));
                                }
                            }
                        }
                        sections.push(block);
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "vector search degraded for search_laws"),
                }
            }
        }

        if sections.is_empty() {
            return Ok(format!("❌ 未找到匹配 '{query}' 的法律"));
        }
        Ok(sections.join("\n"))
    }

    /// `get_article`: resolve the law (alias → exact title → substring,
    /// latest `publish_date` wins), parse the article number, then enrich
    /// with status, siblings, and cross-references.
    pub async fn get_article(&self, law_title: &str, article_number: &str) -> Result<String> {
        let law = match self.resolve_law(law_title)? {
            Some(l) => l,
            None => return Ok(format!("❌ 未找到法律: {law_title}")),
        };

        let (number_int, number_str) = splitter::parse_article_number(article_number);
        let mut candidates = self.storage.articles_by_number(law.id, number_int)?;
        if candidates.is_empty() {
            candidates = self.storage.articles_number_str_like(law.id, &number_str)?;
        }
        let article = match candidates.into_iter().find(|a| a.number_str == number_str).or_else(|| {
            self.storage
                .articles_by_number(law.id, number_int)
                .ok()
                .and_then(|v| v.into_iter().next())
        }) {
            Some(a) => a,
            None => return Ok(format!("❌ 在《{}》中未找到{article_number}", law.title)),
        };

        let mut out = format!("## {} - 第{}条\n\n{}\n\n", law.title, article.number_str, article.content);
        out.push_str(&format!("**状态**: {} {}\n\n", law.status.label(), law.status.badge()));

        let siblings = enrich::siblings(&self.storage, law.id, &article.chapter_path, article.number_int)?;
        if !siblings.is_empty() {
            out.push_str("### 同章节法条\n\n");
            for sibling in siblings {
                out.push_str(&format!("- 第{}条\n", sibling.number_str));
            }
            out.push('\n');
        }

        let xrefs = enrich::cross_reference_lines(&self.storage, law.id, article.number_int)?;
        if !xrefs.is_empty() {
            out.push_str("### 关联解释\n\n");
            for line in xrefs {
                out.push_str(&format!("- {line}\n"));
            }
        }

        Ok(out)
    }

    /// `search_article_content`: concept + FTS + vector, fused by RRF
    /// keyed on `(law_title, number_str)`.
    pub async fn search_article_content(&self, keywords: &str, limit: Option<usize>) -> Result<String> {
        let limit = limit.unwrap_or(10);
        let mut key_info: HashMap<(String, String), (i64, i64, String)> = HashMap::new();

        let mut concept_keys = Vec::new();
        for hit in concept::resolve(&self.storage, keywords) {
            for article_int in concept::parse_article_hints(&hit.article_hints) {
                if let Some(article) = self
                    .storage
                    .articles_by_number(hit.law_id, article_int)?
                    .into_iter()
                    .next()
                {
                    if let Some(law) = self.storage.get_law(hit.law_id)? {
                        let key = (law.title.clone(), article.number_str.clone());
                        key_info
                            .entry(key.clone())
                            .or_insert((law.id, article.number_int, law.publish_date.clone()));
                        concept_keys.push(key);
                    }
                }
            }
        }

        let fts_hits = match fts::search_articles_fts(&self.storage, keywords, limit * 3) {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "fts article search failed for search_article_content");
                Vec::new()
            }
        };
        let mut fts_keys = Vec::new();
        for hit in &fts_hits {
            if let Some(law) = self.storage.get_law(hit.article.law_id)? {
                let key = (law.title.clone(), hit.article.number_str.clone());
                key_info
                    .entry(key.clone())
                    .or_insert((law.id, hit.article.number_int, law.publish_date.clone()));
                fts_keys.push(key);
            }
        }

        let mut vector_keys = Vec::new();
        if self.readiness.wait_ready().await {
            match self.timed_vector_search(keywords, limit * 3).await {
                Ok(hits) => {
                    for hit in hits {
                        if let Some(article) = self.storage.get_article(hit.article_id)? {
                            if let Some(law) = self.storage.get_law(article.law_id)? {
                                let key = (law.title.clone(), article.number_str.clone());
                                key_info
                                    .entry(key.clone())
                                    .or_insert((law.id, article.number_int, law.publish_date.clone()));
                                vector_keys.push(key);
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "vector search degraded for search_article_content"),
            }
        }

        let weights = &self.config.search.path_weights;
        let lists = vec![
            fusion::WeightedList::new(concept_keys, weights.concept),
            fusion::WeightedList::new(fts_keys, weights.fts),
            fusion::WeightedList::new(vector_keys, weights.vector),
        ];

        let fused = fusion::fuse(&lists, self.config.search.rrf_k, limit, |key: &(String, String)| {
            key_info.get(key).map(|(_, _, date)| date.clone()).unwrap_or_default()
        });

        if fused.is_empty() {
            return Ok(format!("❌ 未找到与 '{keywords}' 相关的法条"));
        }

        let mut out = String::new();
        for (law_title, number_str) in fused {
            let Some((law_id, article_int, _)) = key_info.get(&(law_title.clone(), number_str.clone())) else {
                continue;
            };
            let article = self
                .storage
                .articles_by_number(*law_id, *article_int)?
                .into_iter()
                .find(|a| a.number_str == number_str);
            let Some(article) = article else { continue };

            let breadcrumb = if article.chapter_path.is_empty() {
                String::new()
            } else {
                format!("{} > ", article.chapter_path)
            };
            out.push_str(&format!(
                "### {} · {}第{}条\n\n{}\n\n",
                law_title,
                breadcrumb,
                number_str,
                truncate_chars(&article.content, SIBLING_SNIPPET_CHARS)
            ));
        }
        Ok(out)
    }

    /// `check_law_validity`: status plus, for repealed laws, a
    /// successor law sharing a title prefix with a later `publish_date`.
    pub fn check_law_validity(&self, law_title: &str) -> Result<String> {
        let law = match self.resolve_law(law_title)? {
            Some(l) => l,
            None => return Ok(format!("❌ 未找到法律: {law_title}")),
        };

        let mut out = format!(
            "## {}\n\n- **状态**: {} {}\n",
            law.title,
            law.status.label(),
            law.status.badge()
        );

        if law.status == LawStatus::Repealed {
            let prefix: String = law.title.chars().take(4).collect();
            let mut candidates: Vec<Law> = self
                .storage
                .laws_by_title_substring(&prefix)?
                .into_iter()
                .filter(|c| c.id != law.id && c.publish_date > law.publish_date)
                .collect();
            candidates.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
            if let Some(successor) = candidates.into_iter().next() {
                out.push_str(&format!("\n建议替代：{}\n", successor.title));
            }
        }

        Ok(out)
    }

    /// `get_law_structure`: the Book/Part/Chapter/Section tree, parsed
    /// on demand from the law's stored full text, without article bodies.
    pub fn get_law_structure(&self, law_title: &str) -> Result<String> {
        let law = match self.resolve_law(law_title)? {
            Some(l) => l,
            None => return Ok(format!("❌ 未找到法律: {law_title}")),
        };

        let tree = splitter::parse_structure(&law.content);
        if tree.is_empty() {
            return Ok(format!("⚠️ 《{}》无章节结构（平铺法条）", law.title));
        }

        let mut out = format!("# {}\n\n", law.title);
        render_structure(&tree, 0, &mut out);
        Ok(out)
    }

    /// `get_legal_basis`: extract up to 8 keyword tokens from free-text
    /// case facts and delegate to `search_laws`.
    pub async fn get_legal_basis(&self, case_description: &str, limit: Option<usize>) -> Result<String> {
        let tokens = extract_keywords(case_description);
        if tokens.is_empty() {
            return Ok("❓ 未能从案情描述中提取有效关键词".to_string());
        }
        let query = tokens.join(" ");
        self.search_laws(&query, None, None, Some(limit.unwrap_or(5))).await
    }

    /// `batch_verify_citations`: scans `《Law》第N条` and bare
    /// `Law第N条` citation forms, resolves each, and reports validity.
    pub async fn batch_verify_citations(&self, text: &str) -> Result<String> {
        let mut citations: Vec<(String, String)> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for caps in QUOTED_CITATION.captures_iter(text) {
            push_citation(&mut citations, &mut seen, &caps);
        }
        for caps in BARE_CITATION.captures_iter(text) {
            push_citation(&mut citations, &mut seen, &caps);
        }

        if citations.is_empty() {
            return Ok("❓ 未在文本中识别到法律引用".to_string());
        }

        let mut out = String::new();
        for (law_name, article_number) in citations {
            let line = match self.resolve_law(&law_name)? {
                None => format!("❓ 《{law_name}》{article_number}: 未找到"),
                Some(law) if law.status == LawStatus::Repealed => {
                    format!("❌ 《{law_name}》{article_number}: 已废止")
                }
                Some(law) => {
                    let (number_int, number_str) = splitter::parse_article_number(&article_number);
                    let exists = !self.storage.articles_by_number(law.id, number_int)?.is_empty()
                        || !self
                            .storage
                            .articles_number_str_like(law.id, &number_str)?
                            .is_empty();
                    if exists {
                        format!("✅ 《{law_name}》{article_number}: 有效")
                    } else {
                        format!("❓ 《{law_name}》{article_number}: 未找到")
                    }
                }
            };
            out.push_str(&line);
            out.push('\n');
        }

        Ok(out)
    }

    /// `clear_caches`: clears the LRU caches, invalidates the vector
    /// matrix, and restarts the readiness gate's preload generation.
    pub fn clear_caches(&self) {
        self.storage.clear_caches();
        self.vector_index.reload();
        self.readiness.reset();
        self.readiness.spawn_preload(self.vector_index.clone());
    }
}

fn pick_latest(mut laws: Vec<Law>) -> Option<Law> {
    laws.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
    laws.into_iter().next()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = chars[..max_chars].iter().collect();
        format!("{truncated}...")
    }
}

fn render_structure(nodes: &[splitter::StructureNode], depth: usize, out: &mut String) {
    for node in nodes {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("- {}\n", node.title));
        render_structure(&node.children, depth + 1, out);
    }
}

fn extract_keywords(text: &str) -> Vec<String> {
    let tokens = fts::tokenize(text);
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for token in tokens {
        if token.chars().count() < 2 || STOPWORDS.contains(&token.as_str()) {
            continue;
        }
        if !counts.contains_key(&token) {
            order.push(token.clone());
        }
        *counts.entry(token).or_insert(0) += 1;
    }
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(MAX_CITATION_KEYWORDS);
    order
}

/// Leading connective characters the bare-citation regex can accidentally
/// swallow (e.g. "和合同法" in "...147条和合同法第52条...").
const LEADING_FILLERS: &[char] = &['和', '与', '及', '、', '的', '并', '且'];

fn strip_leading_fillers(raw: &str) -> String {
    let mut s = raw;
    while let Some(c) = s.chars().next() {
        if LEADING_FILLERS.contains(&c) && s.chars().count() > 2 {
            s = &s[c.len_utf8()..];
        } else {
            break;
        }
    }
    s.to_string()
}

fn push_citation(
    out: &mut Vec<(String, String)>,
    seen: &mut std::collections::HashSet<(String, String)>,
    caps: &regex::Captures,
) {
    let law_name = strip_leading_fillers(&caps[1]);
    let base = &caps[2];
    let article_number = match caps.get(4) {
        Some(suffix) => format!("第{base}条之{}", suffix.as_str()),
        None => format!("第{base}条"),
    };
    let key = (law_name.clone(), article_number.clone());
    if seen.insert(key.clone()) {
        out.push(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheSizes, StorageConfig, VectorConfig};
    use crate::{Alias, AliasType, Article};
    use async_trait::async_trait;

    fn test_config() -> Arc<Config> {
        let mut config = Config::default();
        config.vector.preload_timeout_ms = 2_000;
        config.vector.search_timeout_ms = 2_000;
        config.vector.dimension = 4;
        Arc::new(config)
    }

    fn storage() -> Arc<StorageManager> {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("orchestrator_test.db");
        std::mem::forget(dir);
        Arc::new(
            StorageManager::new(StorageConfig {
                db_path,
                pool_size: 2,
                enable_compression: false,
                cache_sizes: CacheSizes { alias: 100, law: 100, concept: 100 },
            })
            .unwrap(),
        )
    }

    struct NoopEmbedder;

    #[async_trait]
    impl crate::Embedder for NoopEmbedder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 4])
        }
    }

    fn orchestrator(storage: Arc<StorageManager>) -> Orchestrator {
        let config = test_config();
        let vector_index = Arc::new(VectorIndex::new(
            vector_config(),
            storage.clone(),
            Some(Arc::new(NoopEmbedder)),
        ));
        let readiness = Arc::new(ReadinessController::new(vector_config()));
        readiness.spawn_preload(vector_index.clone());
        Orchestrator::new(config, storage, vector_index, readiness)
    }

    fn vector_config() -> VectorConfig {
        VectorConfig {
            model_name: "test-model".to_string(),
            dimension: 4,
            preload_timeout_ms: 2_000,
            search_timeout_ms: 2_000,
            core_law_titles: vec!["民法典".to_string()],
            core_law_boost: 1.15,
            short_article_threshold: 50,
            very_short_article_threshold: 20,
        }
    }

    fn seed_civil_code(storage: &StorageManager) {
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
                content: "第一千零二十三条 自然人享有声音权益，参照肖像权保护的有关规定处理。".to_string(),
                chapter_path: "第一编 总则 > 第五章 民事权利".to_string(),
            })
            .unwrap();
        storage
            .put_article(&Article {
                id: 11,
                law_id: 1,
                number_int: 1022,
                number_str: "1022".to_string(),
                content: "第一千零二十二条 肖像许可使用合同。".to_string(),
                chapter_path: "第一编 总则 > 第五章 民事权利".to_string(),
            })
            .unwrap();
        storage
            .put_alias(&Alias::new("民法典", 1, AliasType::ShortName, 1.0))
            .unwrap();
    }

    #[tokio::test]
    async fn get_article_reports_status_siblings_and_content() {
        let storage = storage();
        seed_civil_code(&storage);
        let orch = orchestrator(storage);

        let text = orch.get_article("民法典", "第1023条").await.unwrap();
        assert!(text.contains("声音"));
        assert!(text.contains("✅"));
        assert!(text.contains("1022"));
    }

    #[tokio::test]
    async fn get_article_reports_not_found_for_unknown_law() {
        let storage = storage();
        let orch = orchestrator(storage);
        let text = orch.get_article("不存在的法律", "第1条").await.unwrap();
        assert!(text.starts_with("❌"));
    }

    #[test]
    fn check_law_validity_suggests_successor_for_repealed_law() {
        let storage = storage();
        storage
            .put_law(&Law {
                id: 1,
                title: "中华人民共和国合同法".to_string(),
                publish_date: "1999-03-15".to_string(),
                category: "法律".to_string(),
                status: LawStatus::Repealed,
                content: String::new(),
            })
            .unwrap();
        storage
            .put_law(&Law {
                id: 2,
                title: "中华人民共和国民法典".to_string(),
                publish_date: "2020-05-28".to_string(),
                category: "法律".to_string(),
                status: LawStatus::InForce,
                content: String::new(),
            })
            .unwrap();
        let orch = orchestrator(storage);

        let text = orch.check_law_validity("中华人民共和国合同法").unwrap();
        assert!(text.contains("已废止"));
        assert!(text.contains("民法典"));
    }

    #[test]
    fn get_law_structure_renders_nested_hierarchy() {
        let storage = storage();
        storage
            .put_law(&Law {
                id: 1,
                title: "中华人民共和国民法典".to_string(),
                publish_date: "2020-05-28".to_string(),
                category: "法律".to_string(),
                status: LawStatus::InForce,
                content: "第一编 总则\n第一章 基本规定\n第一条 内容。".to_string(),
            })
            .unwrap();
        let orch = orchestrator(storage);

        let text = orch.get_law_structure("中华人民共和国民法典").unwrap();
        assert!(text.contains("第一编 总则"));
        assert!(text.contains("第一章 基本规定"));
    }

    #[tokio::test]
    async fn batch_verify_citations_reports_valid_and_repealed() {
        let storage = storage();
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
                id: 1,
                law_id: 1,
                number_int: 147,
                number_str: "147".to_string(),
                content: "第一百四十七条 ...".to_string(),
                chapter_path: String::new(),
            })
            .unwrap();
        storage
            .put_law(&Law {
                id: 2,
                title: "中华人民共和国合同法".to_string(),
                publish_date: "1999-03-15".to_string(),
                category: "法律".to_string(),
                status: LawStatus::Repealed,
                content: String::new(),
            })
            .unwrap();
        let orch = orchestrator(storage);

        let text = orch
            .batch_verify_citations("依据《民法典》第147条和合同法第52条的规定，该合同无效。")
            .await
            .unwrap();
        assert!(text.contains("✅ 《民法典》第147条: 有效"));
        assert!(text.contains("❌ 《合同法》第52条: 已废止"));
    }

    #[test]
    fn extract_keywords_drops_stopwords_and_short_tokens() {
        let tokens = extract_keywords("甲与乙签订了买卖合同，但是乙未按照约定交付货物");
        assert!(!tokens.is_empty());
        assert!(tokens.iter().all(|t| t.chars().count() >= 2));
        assert!(!tokens.contains(&"的".to_string()));
    }
}
