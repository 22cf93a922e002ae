//! Reciprocal Rank Fusion.
//!
//! Vector distances and full-text relevance scores live on unrelated scales,
//! so the two lists are merged by rank only:
//! `score(d) = Σ 1 / (k + rank_i(d) + 1)` with zero-based ranks and `k = 60`.

use std::collections::HashMap;

/// RRF smoothing constant.
pub const RRF_K: f32 = 60.0;

/// Anything carrying a stable identifier shared by both candidate lists.
pub trait Ranked {
    fn id(&self) -> &str;
}

impl Ranked for String {
    fn id(&self) -> &str {
        self
    }
}

impl Ranked for &str {
    fn id(&self) -> &str {
        self
    }
}

/// A candidate after fusion.
///
/// `item` is the row first seen for the id (vector list first); a text
/// occurrence only contributes its score and rank. Within the vector list a
/// repeated id overwrites the earlier row, its score and its rank, keeping
/// the original position for tie breaks.
#[derive(Debug, Clone, PartialEq)]
pub struct Fused<T> {
    pub item: T,
    pub score: f32,
    pub vector_rank: Option<usize>,
    pub text_rank: Option<usize>,
}

/// Partial score of a row at zero-based `rank`.
pub fn rrf_contribution(rank: usize) -> f32 {
    1.0 / (RRF_K + rank as f32 + 1.0)
}

#[derive(Clone, Copy)]
enum Side {
    Vector,
    Text,
}

/// Fuse two best-first lists into one list of at most `limit` candidates,
/// ordered by descending score. Equal scores keep first-encounter order.
pub fn reciprocal_rank_fusion<T: Ranked>(vector: Vec<T>, text: Vec<T>, limit: usize) -> Vec<Fused<T>> {
    let mut fused: Vec<Fused<T>> = Vec::with_capacity(vector.len() + text.len());
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(vector.len() + text.len());

    for (rank, item) in vector.into_iter().enumerate() {
        accumulate(&mut fused, &mut slots, item, rank, Side::Vector);
    }
    for (rank, item) in text.into_iter().enumerate() {
        accumulate(&mut fused, &mut slots, item, rank, Side::Text);
    }

    // `sort_by` is stable, which gives the encounter-order tie break.
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused.truncate(limit);
    fused
}

fn accumulate<T: Ranked>(
    fused: &mut Vec<Fused<T>>,
    slots: &mut HashMap<String, usize>,
    item: T,
    rank: usize,
    side: Side,
) {
    let score = rrf_contribution(rank);
    if let Some(&slot) = slots.get(item.id()) {
        let entry = &mut fused[slot];
        match side {
            // A repeated vector row replaces the earlier one in place.
            Side::Vector => {
                entry.item = item;
                entry.score = score;
                entry.vector_rank = Some(rank);
            }
            Side::Text => {
                entry.score += score;
                entry.text_rank.get_or_insert(rank);
            }
        }
        return;
    }

    slots.insert(item.id().to_string(), fused.len());
    let (vector_rank, text_rank) = match side {
        Side::Vector => (Some(rank), None),
        Side::Text => (None, Some(rank)),
    };
    fused.push(Fused { item, score, vector_rank, text_rank });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<T: Ranked>(results: &[Fused<T>]) -> Vec<&str> {
        results.iter().map(|f| f.item.id()).collect()
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: &'static str,
        payload: &'static str,
    }

    impl Ranked for Row {
        fn id(&self) -> &str {
            self.id
        }
    }

    #[test]
    fn shared_id_scores_add() {
        let results = reciprocal_rank_fusion(vec!["x", "a", "b"], vec!["c", "d", "x"], 10);
        let x = results.iter().find(|f| f.item == "x").expect("x present");
        let expected = 1.0 / 61.0 + 1.0 / 63.0;
        assert!((x.score - expected).abs() < 1e-6, "score={} expected={}", x.score, expected);
        assert_eq!(x.vector_rank, Some(0));
        assert_eq!(x.text_rank, Some(2));
        assert_eq!(results[0].item, "x", "shared id outranks single-list ids");
    }

    #[test]
    fn both_empty_is_empty() {
        let results = reciprocal_rank_fusion(Vec::<&str>::new(), Vec::new(), 5);
        assert!(results.is_empty());
    }

    #[test]
    fn one_side_empty_keeps_original_order() {
        let only_vector = reciprocal_rank_fusion(vec!["a", "b", "c"], Vec::new(), 10);
        assert_eq!(ids(&only_vector), vec!["a", "b", "c"]);
        let only_text = reciprocal_rank_fusion(Vec::new(), vec!["c", "b", "a"], 10);
        assert_eq!(ids(&only_text), vec!["c", "b", "a"]);
        assert!(only_text.windows(2).all(|w| w[0].score > w[1].score));
        assert!(only_text.iter().all(|f| f.vector_rank.is_none()));
    }

    #[test]
    fn ties_keep_encounter_order() {
        // a and c both sit at rank 0 of one list; a is seen first.
        let results = reciprocal_rank_fusion(vec!["a"], vec!["c"], 10);
        assert_eq!(ids(&results), vec!["a", "c"]);
        assert_eq!(results[0].score, results[1].score);
    }

    #[test]
    fn truncates_to_limit() {
        let results = reciprocal_rank_fusion(vec!["a", "b", "c"], vec!["d", "e"], 2);
        assert_eq!(ids(&results), vec!["a", "d"]);
        assert!(reciprocal_rank_fusion(vec!["a"], vec!["b"], 0).is_empty());
    }

    #[test]
    fn first_occurrence_payload_wins() {
        let vector = vec![Row { id: "b", payload: "from-vector" }];
        let text = vec![Row { id: "b", payload: "from-text" }];
        let results = reciprocal_rank_fusion(vector, text, 1);
        assert_eq!(results[0].item.payload, "from-vector");
    }

    #[test]
    fn duplicate_in_vector_list_overwrites() {
        let vector = vec![Row { id: "a", payload: "first" }, Row { id: "b", payload: "b" }, Row { id: "a", payload: "second" }];
        let results = reciprocal_rank_fusion(vector, Vec::new(), 10);
        assert_eq!(results.len(), 2);
        let a = results.iter().find(|f| f.item.id == "a").expect("a present");
        assert_eq!(a.item.payload, "second");
        assert_eq!(a.vector_rank, Some(2));
        assert!((a.score - 1.0 / 63.0).abs() < 1e-6, "score is replaced, not summed");
        assert_eq!(ids(&results), vec!["b", "a"]);
    }

    #[test]
    fn duplicate_in_text_list_accumulates() {
        let results = reciprocal_rank_fusion(Vec::new(), vec!["a", "a"], 10);
        assert_eq!(results.len(), 1);
        assert!((results[0].score - (1.0 / 61.0 + 1.0 / 62.0)).abs() < 1e-6);
        assert_eq!(results[0].text_rank, Some(0));
    }
}
