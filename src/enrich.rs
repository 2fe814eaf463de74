//! # Article Enricher
//!
//! ## Purpose
//! Given a resolved `(law_id, article_int)`, produces the two adornments the
//! tool surface attaches to an article payload: nearby sibling articles from
//! the same chapter, and cross-references into interpretation articles.

use crate::storage::StorageManager;
use crate::{Article, Result};

const MAX_SIBLINGS: usize = 10;
const PREVIEW_CHARS: usize = 100;

/// Up to 10 articles sharing `chapter_path` with the target, closest first by
/// absolute distance, then re-sorted ascending by article number for display.
pub fn siblings(
    storage: &StorageManager,
    law_id: i64,
    chapter_path: &str,
    article_int: i64,
) -> Result<Vec<Article>> {
    let mut candidates: Vec<Article> = storage
        .articles_for_law(law_id)?
        .into_iter()
        .filter(|a| a.chapter_path == chapter_path && a.number_int != article_int)
        .collect();

    candidates.sort_by_key(|a| (a.number_int - article_int).abs());
    candidates.truncate(MAX_SIBLINGS);
    candidates.sort_by_key(|a| a.number_int);
    Ok(candidates)
}

/// Rendered `target law title · 第N条 · preview` lines for every
/// cross-reference originating at `(law_id, article_int)`.
pub fn cross_reference_lines(storage: &StorageManager, law_id: i64, article_int: i64) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for xref in storage.cross_references_for(law_id, article_int)? {
        let target_title = storage
            .get_law(xref.target_law_id)?
            .map(|l| l.title)
            .unwrap_or_default();
        let target_content = storage
            .articles_by_number(xref.target_law_id, xref.target_article_int)?
            .into_iter()
            .next()
            .map(|a| a.content)
            .unwrap_or_default();

        lines.push(format!(
            "{} · 第{}条 · {}",
            target_title,
            xref.target_article_int,
            preview(&target_content, PREVIEW_CHARS)
        ));
    }
    Ok(lines)
}

fn preview(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = chars[..max_chars].iter().collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheSizes, StorageConfig};
    use crate::{CrossReference, Law, LawStatus, RefType};

    fn storage() -> StorageManager {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("enrich_test.db");
        std::mem::forget(dir);
        StorageManager::new(StorageConfig {
            db_path,
            pool_size: 2,
            enable_compression: false,
            cache_sizes: CacheSizes { alias: 10, law: 10, concept: 10 },
        })
        .unwrap()
    }

    fn article(id: i64, law_id: i64, number_int: i64, chapter_path: &str) -> Article {
        Article {
            id,
            law_id,
            number_int,
            number_str: number_int.to_string(),
            content: format!("第{number_int}条 示例内容。"),
            chapter_path: chapter_path.to_string(),
        }
    }

    #[test]
    fn siblings_are_closest_by_distance_then_sorted_ascending() {
        let storage = storage();
        let chapter = "第一编 总则 > 第六章 民事法律行为";
        for (id, n) in [(1, 140), (2, 141), (3, 150), (4, 200), (5, 145)] {
            storage.put_article(&article(id, 1, n, chapter)).unwrap();
        }

        let result = siblings(&storage, 1, chapter, 141).unwrap();
        let numbers: Vec<i64> = result.iter().map(|a| a.number_int).collect();
        assert!(numbers.contains(&140));
        assert!(numbers.contains(&145));
        assert!(!numbers.contains(&141));
        assert_eq!(numbers, {
            let mut sorted = numbers.clone();
            sorted.sort();
            sorted
        });
    }

    #[test]
    fn cross_reference_lines_render_target_title_and_preview() {
        let storage = storage();
        storage
            .put_law(&Law {
                id: 2,
                title: "最高人民法院关于适用合同编通则若干问题的解释".to_string(),
                publish_date: "2023-12-05".to_string(),
                category: "司法解释".to_string(),
                status: LawStatus::InForce,
                content: String::new(),
            })
            .unwrap();
        storage
            .put_article(&article(20, 2, 44, ""))
            .unwrap();
        storage
            .put_cross_reference(&CrossReference {
                source_law_id: 1,
                source_article_int: 538,
                target_law_id: 2,
                target_article_int: 44,
                ref_type: RefType::Interpretation,
            })
            .unwrap();

        let lines = cross_reference_lines(&storage, 1, 538).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("第44条"));
        assert!(lines[0].contains("合同编通则"));
    }

    #[test]
    fn empty_when_no_cross_references_exist() {
        let storage = storage();
        assert!(cross_reference_lines(&storage, 1, 999).unwrap().is_empty());
    }
}
