//! # Fusion Ranker
//!
//! ## Purpose
//! Combines per-retrieval-path ranked lists into a single ordered result list
//! via Reciprocal Rank Fusion: `score(key) = Σ_paths w_p / (K + rank_p + 1)`.
//! Exclusion of keys already emitted by higher-priority segments (alias-exact,
//! concept matches) is the orchestrator's responsibility — this module only
//! fuses whatever lists it is handed.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// One retrieval path's ranked output, carrying its fusion weight.
pub struct WeightedList<K> {
    pub items: Vec<K>,
    pub weight: f32,
}

impl<K> WeightedList<K> {
    pub fn new(items: Vec<K>, weight: f32) -> Self {
        Self { items, weight }
    }
}

/// Fuse `lists` via RRF with constant `k`, returning at most `limit` keys in
/// descending score order. Ties are broken by `tie_break`, descending (e.g.
/// `publish_date DESC`). Each list is de-duplicated internally before scoring.
pub fn fuse<K, T, F>(lists: &[WeightedList<K>], k: u32, limit: usize, tie_break: F) -> Vec<K>
where
    K: Eq + Hash + Clone,
    T: Ord,
    F: Fn(&K) -> T,
{
    let mut scores: HashMap<K, f32> = HashMap::new();
    let mut order: Vec<K> = Vec::new();

    for list in lists {
        let mut seen_in_list: HashSet<K> = HashSet::new();
        for (rank, item) in list.items.iter().enumerate() {
            if !seen_in_list.insert(item.clone()) {
                continue;
            }
            let increment = list.weight / (k as f32 + rank as f32 + 1.0);
            if let Some(existing) = scores.get_mut(item) {
                *existing += increment;
            } else {
                scores.insert(item.clone(), increment);
                order.push(item.clone());
            }
        }
    }

    order.sort_by(|a, b| {
        let score_a = scores[a];
        let score_b = scores[b];
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| tie_break(b).cmp(&tie_break(a)))
    });
    order.truncate(limit);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_rrf_score_per_literal_example() {
        let lists = vec![
            WeightedList::new(vec!["a1", "a2"], 1.0),
            WeightedList::new(vec!["b1"], 0.8),
        ];
        let fused = fuse(&lists, 60, 10, |_| 0i64);
        assert_eq!(fused, vec!["a1", "b1", "a2"]);
    }

    #[test]
    fn deduplicates_repeats_within_a_single_list() {
        let lists = vec![WeightedList::new(vec!["a", "a", "b"], 1.0)];
        let fused = fuse(&lists, 60, 10, |_| 0i64);
        assert_eq!(fused, vec!["a", "b"]);
    }

    #[test]
    fn ties_break_by_descending_secondary_key() {
        let lists = vec![
            WeightedList::new(vec!["old", "new"], 1.0),
            WeightedList::new(vec!["new", "old"], 1.0),
        ];
        let priority = |k: &&str| if *k == "new" { 1i64 } else { 0i64 };
        let fused = fuse(&lists, 60, 10, priority);
        assert_eq!(fused, vec!["new", "old"]);
    }

    #[test]
    fn truncates_to_limit() {
        let lists = vec![WeightedList::new(vec!["a", "b", "c"], 1.0)];
        let fused = fuse(&lists, 60, 2, |_| 0i64);
        assert_eq!(fused, vec!["a", "b"]);
    }
}
