//! # Full-Text Search Query Planner
//!
//! ## Purpose
//! Runs a ladder of search strategies, from an exact phrase match down to a
//! tolerant substring fallback, each modeled as a strategy object sharing a
//! common `try` contract. The planner returns the first rung that yields a
//! non-empty result set. Ranking within a rung uses a BM25 score computed
//! over the in-memory corpus scanned for that call.

use crate::storage::StorageManager;
use crate::{Article, Law, LawStatus};

const K1: f64 = 1.5;
const B: f64 = 0.75;

/// Filters shared by both law-level and article-level search.
#[derive(Debug, Clone, Default)]
pub struct FtsFilters {
    pub category: Option<String>,
    pub status: Option<LawStatus>,
}

/// A single scored hit at the law level.
#[derive(Debug, Clone)]
pub struct LawHit {
    pub law: Law,
    pub score: f32,
}

/// A single scored hit at the article level.
#[derive(Debug, Clone)]
pub struct ArticleHit {
    pub article: Article,
    pub score: f32,
}

/// Tokenize a query: Chinese-only queries with no whitespace are split into
/// overlapping bigrams (the closest approximation to a segmenter available
/// without an external dependency); everything else splits on whitespace.
pub fn tokenize(query: &str) -> Vec<String> {
    let trimmed = query.trim();
    if trimmed.contains(char::is_whitespace) {
        return trimmed
            .split_whitespace()
            .map(|s| s.to_string())
            .collect();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.iter().all(|c| is_chinese(*c)) && chars.len() >= 2 {
        let mut tokens: Vec<String> = chars
            .windows(2)
            .map(|w| w.iter().collect::<String>())
            .collect();
        tokens.dedup();
        return tokens;
    }

    vec![trimmed.to_string()]
}

fn is_chinese(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

fn bm25(tf: f64, df: usize, n_docs: usize, doc_len: f64, avg_len: f64) -> f64 {
    if tf <= 0.0 || n_docs == 0 {
        return 0.0;
    }
    let idf = ((n_docs as f64 - df as f64 + 0.5) / (df as f64 + 0.5) + 1.0).ln();
    idf * (tf * (K1 + 1.0)) / (tf + K1 * (1.0 - B + B * (doc_len / avg_len.max(1.0))))
}

fn token_count(haystack: &str, token: &str) -> usize {
    if token.is_empty() {
        return 0;
    }
    haystack.matches(token).count()
}

/// Score and rank laws against a set of tokens that must ALL appear (AND).
fn rank_laws(laws: &[Law], tokens: &[String], filters: &FtsFilters, limit: usize) -> Vec<LawHit> {
    let candidates: Vec<&Law> = laws
        .iter()
        .filter(|l| passes_filters(l, filters))
        .collect();

    if candidates.is_empty() || tokens.is_empty() {
        return Vec::new();
    }

    let n_docs = candidates.len();
    let avg_len = candidates.iter().map(|l| l.content.chars().count() as f64).sum::<f64>()
        / n_docs as f64;

    let dfs: Vec<usize> = tokens
        .iter()
        .map(|t| candidates.iter().filter(|l| l.content.contains(t.as_str()) || l.title.contains(t.as_str())).count())
        .collect();

    let mut hits = Vec::new();
    for law in &candidates {
        let haystack = format!("{}\n{}", law.title, law.content);
        let all_present = tokens.iter().all(|t| haystack.contains(t.as_str()));
        if !all_present {
            continue;
        }
        let doc_len = law.content.chars().count() as f64;
        let score: f64 = tokens
            .iter()
            .zip(dfs.iter())
            .map(|(t, df)| bm25(token_count(&haystack, t) as f64, *df, n_docs, doc_len, avg_len))
            .sum();
        hits.push(LawHit {
            law: (*law).clone(),
            score: score as f32,
        });
    }

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    hits
}

fn passes_filters(law: &Law, filters: &FtsFilters) -> bool {
    if let Some(category) = &filters.category {
        if &law.category != category {
            return false;
        }
    }
    if let Some(status) = filters.status {
        if law.status != status {
            return false;
        }
    }
    true
}

/// Expand each token to its synonym group, requiring ANY member of each
/// token's group to appear (per-token OR) while ANDing across tokens.
fn expand_groups(storage: &StorageManager, tokens: &[String]) -> Vec<Vec<String>> {
    tokens
        .iter()
        .map(|t| storage.search_synonym_group_for(t).unwrap_or_else(|_| vec![t.clone()]))
        .collect()
}

fn article_matches_groups(content: &str, groups: &[Vec<String>]) -> bool {
    groups
        .iter()
        .all(|group| group.iter().any(|member| content.contains(member.as_str())))
}

fn rank_articles_with_tokens(
    articles: &[Article],
    effective_tokens: &[Vec<String>],
    flat_tokens: &[String],
    limit: usize,
) -> Vec<ArticleHit> {
    if articles.is_empty() || effective_tokens.is_empty() {
        return Vec::new();
    }

    let n_docs = articles.len();
    let avg_len = articles.iter().map(|a| a.content.chars().count() as f64).sum::<f64>() / n_docs as f64;
    let dfs: Vec<usize> = flat_tokens
        .iter()
        .map(|t| articles.iter().filter(|a| a.content.contains(t.as_str())).count())
        .collect();

    let mut hits = Vec::new();
    for article in articles {
        if !article_matches_groups(&article.content, effective_tokens) {
            continue;
        }
        let doc_len = article.content.chars().count() as f64;
        let score: f64 = flat_tokens
            .iter()
            .zip(dfs.iter())
            .map(|(t, df)| bm25(token_count(&article.content, t) as f64, *df, n_docs, doc_len, avg_len))
            .sum();
        hits.push(ArticleHit {
            article: article.clone(),
            score: score as f32,
        });
    }

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    hits
}

/// Search laws through the rung ladder: exact phrase, AND of tokens, OR of
/// tokens, then a LIKE-style fallback that prefers titles containing the
/// corpus's most consulted codes.
pub fn search_laws_fts(
    storage: &StorageManager,
    query: &str,
    filters: &FtsFilters,
    limit: usize,
) -> crate::Result<Vec<LawHit>> {
    let laws = storage.all_laws()?;
    let tokens = tokenize(query);

    // Rung 1: exact phrase.
    let exact = rank_laws(&laws, &[query.trim().to_string()], filters, limit);
    if !exact.is_empty() {
        return Ok(exact);
    }

    // Rung 4: AND across tokens (laws have no per-article synonym grouping).
    let and_hits = rank_laws(&laws, &tokens, filters, limit);
    if !and_hits.is_empty() {
        return Ok(and_hits);
    }

    // Rung 5: OR of tokens — keep any law matching at least one token.
    let or_hits = rank_laws_any(&laws, &tokens, filters, limit);
    if !or_hits.is_empty() {
        return Ok(or_hits);
    }

    // Rung 6: LIKE fallback preferring the corpus's flagship codes.
    Ok(rank_laws_like_fallback(&laws, &tokens, filters, limit))
}

fn rank_laws_any(laws: &[Law], tokens: &[String], filters: &FtsFilters, limit: usize) -> Vec<LawHit> {
    let candidates: Vec<&Law> = laws.iter().filter(|l| passes_filters(l, filters)).collect();
    if candidates.is_empty() || tokens.is_empty() {
        return Vec::new();
    }
    let n_docs = candidates.len();
    let avg_len = candidates.iter().map(|l| l.content.chars().count() as f64).sum::<f64>() / n_docs as f64;
    let dfs: Vec<usize> = tokens
        .iter()
        .map(|t| candidates.iter().filter(|l| l.content.contains(t.as_str()) || l.title.contains(t.as_str())).count())
        .collect();

    let mut hits = Vec::new();
    for law in &candidates {
        let haystack = format!("{}\n{}", law.title, law.content);
        let any_present = tokens.iter().any(|t| haystack.contains(t.as_str()));
        if !any_present {
            continue;
        }
        let doc_len = law.content.chars().count() as f64;
        let score: f64 = tokens
            .iter()
            .zip(dfs.iter())
            .map(|(t, df)| bm25(token_count(&haystack, t) as f64, *df, n_docs, doc_len, avg_len))
            .sum();
        hits.push(LawHit { law: (*law).clone(), score: score as f32 });
    }
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    hits
}

const PREFERRED_TITLES: [&str; 2] = ["民法典", "刑法"];

fn rank_laws_like_fallback(laws: &[Law], tokens: &[String], filters: &FtsFilters, limit: usize) -> Vec<LawHit> {
    let long_tokens: Vec<&String> = tokens.iter().filter(|t| t.chars().count() >= 2).collect();
    if long_tokens.is_empty() {
        return Vec::new();
    }
    let mut hits: Vec<LawHit> = laws
        .iter()
        .filter(|l| passes_filters(l, filters))
        .filter(|l| long_tokens.iter().all(|t| l.content.contains(t.as_str()) || l.title.contains(t.as_str())))
        .map(|l| LawHit { law: l.clone(), score: 1.0 })
        .collect();

    hits.sort_by_key(|h| {
        PREFERRED_TITLES
            .iter()
            .position(|p| h.law.title.contains(p))
            .unwrap_or(PREFERRED_TITLES.len())
    });
    hits.truncate(limit);
    hits
}

/// Search articles through the rung ladder: exact phrase, AND-with-synonyms,
/// AND-without-synonyms, OR-of-synonym-expanded-tokens, then LIKE fallback.
pub fn search_articles_fts(
    storage: &StorageManager,
    query: &str,
    limit: usize,
) -> crate::Result<Vec<ArticleHit>> {
    let articles = storage.all_articles()?;
    let tokens = tokenize(query);

    let phrase = vec![query.trim().to_string()];
    let phrase_groups: Vec<Vec<String>> = phrase.iter().map(|t| vec![t.clone()]).collect();
    let exact = rank_articles_with_tokens(&articles, &phrase_groups, &phrase, limit);
    if !exact.is_empty() {
        return Ok(exact);
    }

    let synonym_groups = expand_groups(storage, &tokens);
    let flat_expanded: Vec<String> = synonym_groups.iter().flatten().cloned().collect();
    let and_with_synonyms = rank_articles_with_tokens(&articles, &synonym_groups, &flat_expanded, limit);
    if !and_with_synonyms.is_empty() {
        return Ok(and_with_synonyms);
    }

    let bare_groups: Vec<Vec<String>> = tokens.iter().map(|t| vec![t.clone()]).collect();
    let and_without_synonyms = rank_articles_with_tokens(&articles, &bare_groups, &tokens, limit);
    if !and_without_synonyms.is_empty() {
        return Ok(and_without_synonyms);
    }

    let or_hits = rank_articles_any(&articles, &flat_expanded, limit);
    if !or_hits.is_empty() {
        return Ok(or_hits);
    }

    Ok(rank_articles_like_fallback(&articles, &tokens, limit))
}

fn rank_articles_any(articles: &[Article], tokens: &[String], limit: usize) -> Vec<ArticleHit> {
    if articles.is_empty() || tokens.is_empty() {
        return Vec::new();
    }
    let n_docs = articles.len();
    let avg_len = articles.iter().map(|a| a.content.chars().count() as f64).sum::<f64>() / n_docs as f64;
    let dfs: Vec<usize> = tokens.iter().map(|t| articles.iter().filter(|a| a.content.contains(t.as_str())).count()).collect();

    let mut hits = Vec::new();
    for article in articles {
        if !tokens.iter().any(|t| article.content.contains(t.as_str())) {
            continue;
        }
        let doc_len = article.content.chars().count() as f64;
        let score: f64 = tokens
            .iter()
            .zip(dfs.iter())
            .map(|(t, df)| bm25(token_count(&article.content, t) as f64, *df, n_docs, doc_len, avg_len))
            .sum();
        hits.push(ArticleHit { article: article.clone(), score: score as f32 });
    }
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    hits
}

fn rank_articles_like_fallback(articles: &[Article], tokens: &[String], limit: usize) -> Vec<ArticleHit> {
    let long_tokens: Vec<&String> = tokens.iter().filter(|t| t.chars().count() >= 2).collect();
    if long_tokens.is_empty() {
        return Vec::new();
    }
    let mut hits: Vec<ArticleHit> = articles
        .iter()
        .filter(|a| long_tokens.iter().all(|t| a.content.contains(t.as_str())))
        .map(|a| ArticleHit { article: a.clone(), score: 1.0 })
        .collect();
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheSizes, StorageConfig};
    use crate::Article;

    fn storage() -> StorageManager {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("fts_test.db");
        std::mem::forget(dir);
        StorageManager::new(StorageConfig {
            db_path,
            pool_size: 2,
            enable_compression: false,
            cache_sizes: CacheSizes { alias: 100, law: 100, concept: 100 },
        })
        .unwrap()
    }

    #[test]
    fn tokenizes_pure_chinese_query_into_bigrams() {
        let tokens = tokenize("债权人");
        assert_eq!(tokens, vec!["债权", "权人"]);
    }

    #[test]
    fn tokenizes_whitespace_separated_query_by_word() {
        let tokens = tokenize("民法典 第538条");
        assert_eq!(tokens, vec!["民法典", "第538条"]);
    }

    #[test]
    fn exact_phrase_rung_wins_when_title_matches_verbatim() {
        let storage = storage();
        storage
            .put_law(&Law {
                id: 1,
                title: "中华人民共和国民法典".to_string(),
                publish_date: "2020-05-28".to_string(),
                category: "法律".to_string(),
                status: LawStatus::InForce,
                content: "第一条 为了保护民事主体的合法权益。".to_string(),
            })
            .unwrap();

        let hits = search_laws_fts(&storage, "民法典", &FtsFilters::default(), 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].law.id, 1);
    }

    #[test]
    fn article_search_finds_content_by_and_of_tokens() {
        let storage = storage();
        storage
            .put_article(&Article {
                id: 1,
                law_id: 1,
                number_int: 538,
                number_str: "538".to_string(),
                content: "第五百三十八条 债权人行使撤销权。".to_string(),
                chapter_path: String::new(),
            })
            .unwrap();
        storage
            .put_article(&Article {
                id: 2,
                law_id: 1,
                number_int: 12,
                number_str: "12".to_string(),
                content: "第十二条 与撤销权无关的条款。".to_string(),
                chapter_path: String::new(),
            })
            .unwrap();

        let hits = search_articles_fts(&storage, "债权人撤销权", 10).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].article.id, 1);
    }

    #[test]
    fn law_like_fallback_requires_all_long_tokens_present() {
        let laws = vec![
            Law {
                id: 1,
                title: "中华人民共和国民法典".to_string(),
                publish_date: "2020-05-28".to_string(),
                category: "法律".to_string(),
                status: LawStatus::InForce,
                content: "债权人享有撤销权，可以请求法院撤销债务人的行为。".to_string(),
            },
            Law {
                id: 2,
                title: "中华人民共和国合同法".to_string(),
                publish_date: "1999-03-15".to_string(),
                category: "法律".to_string(),
                status: LawStatus::Repealed,
                content: "债权人可以主张违约责任。".to_string(),
            },
        ];
        let tokens = vec!["债权人".to_string(), "撤销权".to_string()];

        let hits = rank_laws_like_fallback(&laws, &tokens, &FtsFilters::default(), 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].law.id, 1);
    }

    #[test]
    fn article_like_fallback_requires_all_long_tokens_present() {
        let articles = vec![
            Article {
                id: 1,
                law_id: 1,
                number_int: 538,
                number_str: "538".to_string(),
                content: "债权人行使撤销权，请求法院撤销债务人的行为。".to_string(),
                chapter_path: String::new(),
            },
            Article {
                id: 2,
                law_id: 1,
                number_int: 12,
                number_str: "12".to_string(),
                content: "债权人主张违约责任，与撤销权无关。".to_string(),
                chapter_path: String::new(),
            },
        ];
        let tokens = vec!["撤销权".to_string(), "行使".to_string()];

        let hits = rank_articles_like_fallback(&articles, &tokens, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].article.id, 1);
    }
}
