use std::collections::HashSet;

use ctxdb_core::types::{HybridSearchOptions, SearchRequest};
use ctxdb_hybrid::{reciprocal_rank_fusion, HybridPlan};

fn ranked(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}{i}")).collect()
}

#[test]
fn disjoint_lists_return_every_id_once() {
    for (m, n) in [(0, 0), (1, 0), (0, 4), (3, 5), (12, 7)] {
        let vector = ranked("v", m);
        let text = ranked("t", n);
        let results = reciprocal_rank_fusion(vector.clone(), text.clone(), m + n);

        assert_eq!(results.len(), m + n, "m={m} n={n}");
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score), "non-increasing scores");
        let seen: HashSet<&str> = results.iter().map(|f| f.item.as_str()).collect();
        assert_eq!(seen.len(), m + n, "no duplicates");
        assert!(vector.iter().chain(text.iter()).all(|id| seen.contains(id.as_str())));
    }
}

#[test]
fn oversized_limit_returns_all_candidates() {
    let results = reciprocal_rank_fusion(ranked("v", 2), ranked("t", 2), 100);
    assert_eq!(results.len(), 4);
}

#[test]
fn hybrid_scenario_ranks_shared_hit_first() {
    let plan = HybridPlan::from_requests(
        &[SearchRequest::vector(vec![0.1, 0.2, 0.3]), SearchRequest::text("hello world")],
        &HybridSearchOptions::limit(5),
    );
    assert_eq!(plan.fetch, 10);

    let vector_hits = vec!["a".to_string(), "b".to_string()];
    let text_hits = vec!["b".to_string(), "c".to_string()];
    let results = reciprocal_rank_fusion(vector_hits, text_hits, plan.limit);

    let ids: HashSet<&str> = results.iter().map(|f| f.item.as_str()).collect();
    assert_eq!(ids, HashSet::from(["a", "b", "c"]));
    assert_eq!(results[0].item, "b");
    assert_eq!((results[0].vector_rank, results[0].text_rank), (Some(1), Some(0)));
}
