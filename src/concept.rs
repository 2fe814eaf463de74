//! # Concept Resolver
//!
//! ## Purpose
//! Maps a free-text legal concept (e.g. `债权人撤销权`) to the law and
//! article-range hints that discuss it. Chinese text carries no token
//! boundaries, so candidates are generated over character substrings rather
//! than whitespace-delimited words.

use crate::storage::{ConceptHit, StorageManager};

const FUZZY_LIMIT: usize = 10;

/// Resolve `query` into an ordered list of concept hits.
///
/// Builds candidates from the full query, then every contiguous multi-character
/// substring from longest to shortest, then individual characters. The first
/// candidate that yields an exact or synonym-expanded hit wins; if none do, a
/// fuzzy substring match over topic text is attempted as a last resort.
pub fn resolve(storage: &StorageManager, query: &str) -> Vec<ConceptHit> {
    if let Some(cached) = storage.concept_cache_get(query) {
        return cached;
    }

    let resolved = resolve_uncached(storage, query);
    storage.concept_cache_put(query.to_string(), resolved.clone());
    resolved
}

fn candidates(query: &str) -> Vec<String> {
    let chars: Vec<char> = query.chars().collect();
    let mut out = vec![query.to_string()];

    for len in (2..chars.len()).rev() {
        for start in 0..=(chars.len() - len) {
            let candidate: String = chars[start..start + len].iter().collect();
            if candidate != query {
                out.push(candidate);
            }
        }
    }
    for ch in &chars {
        out.push(ch.to_string());
    }
    out
}

fn lookup_candidate(storage: &StorageManager, candidate: &str) -> crate::Result<Vec<ConceptHit>> {
    let exact = storage.topics_exact(candidate)?;
    if !exact.is_empty() {
        return Ok(exact);
    }

    let mut hits = Vec::new();
    if let Some(canonical) = storage.concept_synonym_forward(candidate)? {
        hits.extend(storage.topics_exact(&canonical)?);
    }
    for term in storage.concept_synonym_reverse(candidate)? {
        hits.extend(storage.topics_exact(&term)?);
    }
    Ok(hits)
}

fn resolve_uncached(storage: &StorageManager, query: &str) -> Vec<ConceptHit> {
    for candidate in candidates(query) {
        match lookup_candidate(storage, &candidate) {
            Ok(hits) if !hits.is_empty() => {
                let mut hits = hits;
                sort_by_relevance(&mut hits);
                return hits;
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(candidate, error = %e, "concept candidate lookup failed");
                continue;
            }
        }
    }

    match storage.topics_substring(query, FUZZY_LIMIT) {
        Ok(mut hits) => {
            sort_by_relevance(&mut hits);
            hits
        }
        Err(e) => {
            tracing::warn!(query, error = %e, "concept fuzzy lookup failed");
            Vec::new()
        }
    }
}

/// Parse an `article_hints` string (e.g. `"535,537-539"`) into the set of
/// article numbers it names. Tolerates both ASCII and fullwidth commas and
/// surrounding whitespace.
pub fn parse_article_hints(hints: &str) -> Vec<i64> {
    let mut out = Vec::new();
    for atom in hints.split(|c| c == ',' || c == '，') {
        let atom = atom.trim();
        if atom.is_empty() {
            continue;
        }
        if let Some((start, end)) = atom.split_once('-') {
            if let (Ok(start), Ok(end)) = (start.trim().parse::<i64>(), end.trim().parse::<i64>()) {
                if start <= end {
                    out.extend(start..=end);
                    continue;
                }
            }
        }
        if let Ok(n) = atom.parse::<i64>() {
            out.push(n);
        }
    }
    out
}

fn sort_by_relevance(hits: &mut [ConceptHit]) {
    hits.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheSizes, StorageConfig};
    use crate::{Law, LawStatus, Topic};

    fn storage() -> StorageManager {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("concept_test.db");
        std::mem::forget(dir);
        StorageManager::new(StorageConfig {
            db_path,
            pool_size: 2,
            enable_compression: false,
            cache_sizes: CacheSizes { alias: 100, law: 100, concept: 100 },
        })
        .unwrap()
    }

    fn seed_law(storage: &StorageManager, id: i64, title: &str) {
        storage
            .put_law(&Law {
                id,
                title: title.to_string(),
                publish_date: "2020-05-28".to_string(),
                category: "法律".to_string(),
                status: LawStatus::InForce,
                content: String::new(),
            })
            .unwrap();
    }

    #[test]
    fn exact_topic_match_wins_immediately() {
        let storage = storage();
        seed_law(&storage, 1, "中华人民共和国民法典");
        storage
            .put_topic(&Topic {
                topic: "债权人撤销权".to_string(),
                law_id: 1,
                article_hints: "538-539".to_string(),
                relevance: 0.95,
            })
            .unwrap();

        let hits = resolve(&storage, "债权人撤销权");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].law_title, "中华人民共和国民法典");
    }

    #[test]
    fn synonym_expansion_finds_topic_under_canonical_term() {
        let storage = storage();
        seed_law(&storage, 1, "中华人民共和国劳动合同法");
        storage
            .put_topic(&Topic {
                topic: "经济补偿金".to_string(),
                law_id: 1,
                article_hints: "46-47".to_string(),
                relevance: 0.9,
            })
            .unwrap();
        storage
            .put_concept_synonym("补偿金", "经济补偿金")
            .unwrap();

        let hits = resolve(&storage, "补偿金");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].topic, "经济补偿金");
    }

    #[test]
    fn falls_back_to_fuzzy_match_when_no_exact_or_synonym_hit() {
        let storage = storage();
        seed_law(&storage, 1, "中华人民共和国公司法");
        storage
            .put_topic(&Topic {
                topic: "股东知情权纠纷".to_string(),
                law_id: 1,
                article_hints: "33".to_string(),
                relevance: 0.8,
            })
            .unwrap();

        let hits = resolve(&storage, "知情权");
        assert!(!hits.is_empty());
        assert_eq!(hits[0].topic, "股东知情权纠纷");
    }

    #[test]
    fn unknown_concept_returns_empty() {
        let storage = storage();
        assert!(resolve(&storage, "完全不存在的概念xyz").is_empty());
    }

    #[test]
    fn article_hints_parse_mixed_atoms_and_ranges() {
        assert_eq!(parse_article_hints("535,537-539"), vec![535, 537, 538, 539]);
        assert_eq!(parse_article_hints("538 ， 539"), vec![538, 539]);
        assert_eq!(parse_article_hints(""), Vec::<i64>::new());
    }
}
