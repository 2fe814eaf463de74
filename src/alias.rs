//! # Alias Resolver
//!
//! ## Purpose
//! Resolves a short or colloquial name (e.g. `民法典`) to the law it refers to,
//! restricted to laws currently in force. Never throws: any storage failure is
//! logged and treated as a miss, matching the engine's swallow-and-degrade
//! error policy for lookup paths.

use crate::storage::{AliasResolution, StorageManager};
use crate::LawStatus;

/// Resolve `query` against the alias table, returning the best candidate.
///
/// Lookup order:
/// 1. Exact match on `alias`, restricted to `status = in_force`, best by
///    `confidence DESC, publish_date DESC`.
/// 2. Substring match, with confidence scaled by `0.9`.
pub fn resolve(storage: &StorageManager, query: &str) -> Option<AliasResolution> {
    if let Some(cached) = storage.alias_cache_get(query) {
        return cached;
    }

    let resolved = resolve_uncached(storage, query);
    storage.alias_cache_put(query.to_string(), resolved.clone());
    resolved
}

fn resolve_uncached(storage: &StorageManager, query: &str) -> Option<AliasResolution> {
    match resolve_exact(storage, query) {
        Ok(Some(hit)) => return Some(hit),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(query, error = %e, "alias exact lookup failed");
        }
    }

    match resolve_substring(storage, query) {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(query, error = %e, "alias substring lookup failed");
            None
        }
    }
}

fn resolve_exact(
    storage: &StorageManager,
    query: &str,
) -> crate::Result<Option<AliasResolution>> {
    let mut candidates = Vec::new();
    for alias in storage.aliases_exact(query)? {
        if let Some(law) = storage.get_law(alias.law_id)? {
            if law.status == LawStatus::InForce {
                candidates.push((alias.confidence, law.publish_date.clone(), law.id, law.title));
            }
        }
    }
    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.1.cmp(&a.1))
    });
    Ok(candidates
        .into_iter()
        .next()
        .map(|(confidence, _, law_id, title)| (law_id, title, confidence)))
}

fn resolve_substring(
    storage: &StorageManager,
    query: &str,
) -> crate::Result<Option<AliasResolution>> {
    let mut candidates = Vec::new();
    for alias in storage.aliases_substring(query)? {
        if let Some(law) = storage.get_law(alias.law_id)? {
            if law.status == LawStatus::InForce {
                candidates.push((
                    alias.confidence * 0.9,
                    law.publish_date.clone(),
                    law.id,
                    law.title,
                ));
            }
        }
    }
    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.1.cmp(&a.1))
    });
    Ok(candidates
        .into_iter()
        .next()
        .map(|(confidence, _, law_id, title)| (law_id, title, confidence)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSizes;
    use crate::{Alias, AliasType, Law};

    fn storage() -> StorageManager {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("alias_test.db");
        std::mem::forget(dir);
        StorageManager::new(crate::config::StorageConfig {
            db_path,
            pool_size: 2,
            enable_compression: false,
            cache_sizes: CacheSizes { alias: 100, law: 100, concept: 100 },
        })
        .unwrap()
    }

    fn law(id: i64, title: &str, date: &str, status: LawStatus) -> Law {
        Law {
            id,
            title: title.to_string(),
            publish_date: date.to_string(),
            category: "法律".to_string(),
            status,
            content: String::new(),
        }
    }

    #[test]
    fn resolves_known_alias_to_canonical_title() {
        let storage = storage();
        storage
            .put_law(&law(1, "中华人民共和国民法典", "2020-05-28", LawStatus::InForce))
            .unwrap();
        storage
            .put_alias(&Alias::new("民法典", 1, AliasType::ShortName, 1.0))
            .unwrap();

        let resolved = resolve(&storage, "民法典").unwrap();
        assert_eq!(resolved.1, "中华人民共和国民法典");
    }

    #[test]
    fn unknown_alias_resolves_to_none() {
        let storage = storage();
        assert!(resolve(&storage, "不存在的法律").is_none());
    }

    #[test]
    fn later_publish_date_wins_among_equal_confidence_candidates() {
        let storage = storage();
        storage
            .put_law(&law(1, "旧版民法通则", "1986-04-12", LawStatus::InForce))
            .unwrap();
        storage
            .put_law(&law(2, "新版民法通则", "2017-03-15", LawStatus::InForce))
            .unwrap();
        storage
            .put_alias(&Alias::new("民法通则", 1, AliasType::ShortName, 1.0))
            .unwrap();
        storage
            .put_alias(&Alias::new("民法通则", 2, AliasType::ShortName, 1.0))
            .unwrap();

        let resolved = resolve(&storage, "民法通则").unwrap();
        assert_eq!(resolved.0, 2);
    }

    #[test]
    fn repealed_laws_are_excluded_from_alias_resolution() {
        let storage = storage();
        storage
            .put_law(&law(1, "中华人民共和国合同法", "1999-03-15", LawStatus::Repealed))
            .unwrap();
        storage
            .put_alias(&Alias::new("合同法", 1, AliasType::ShortName, 1.0))
            .unwrap();

        assert!(resolve(&storage, "合同法").is_none());
    }
}
