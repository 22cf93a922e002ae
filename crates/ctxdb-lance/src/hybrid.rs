use lancedb::Table;
use tracing::{debug, warn};

use ctxdb_core::{HybridSearchOptions, HybridSearchResult, Result, SearchRequest};
use ctxdb_hybrid::{reciprocal_rank_fusion, HybridPlan};

use crate::schema::DocumentHit;
use crate::search::{full_text_search, vector_search};
use crate::table::ensure_fts_index;

/// Run both legs of a hybrid search and fuse them with RRF.
///
/// A failing leg is logged and contributes no candidates; only the index
/// check can fail the whole call.
pub async fn hybrid_search(
    table: &Table,
    name: &str,
    requests: &[SearchRequest],
    options: &HybridSearchOptions,
) -> Result<Vec<HybridSearchResult>> {
    ensure_fts_index(table, name).await?;

    let plan = HybridPlan::from_requests(requests, options);
    if plan.is_empty() {
        debug!(collection = name, "hybrid search without requests");
        return Ok(Vec::new());
    }
    let filter = plan.filter.as_deref();

    let vector_leg = async {
        match plan.vector.as_deref() {
            Some(vector) => vector_search(table, name, vector, plan.fetch, filter).await,
            None => Ok(Vec::new()),
        }
    };
    let text_leg = async {
        match plan.text.as_deref() {
            Some(text) => full_text_search(table, name, text, plan.fetch, filter).await,
            None => Ok(Vec::new()),
        }
    };
    let (vector_hits, text_hits) = tokio::join!(vector_leg, text_leg);
    let vector_hits = tolerate(vector_hits, name, "vector");
    let text_hits = tolerate(text_hits, name, "full-text");

    debug!(
        collection = name,
        vector = vector_hits.len(),
        text = text_hits.len(),
        limit = plan.limit,
        "fusing hybrid candidates"
    );
    let fused = reciprocal_rank_fusion(vector_hits, text_hits, plan.limit);
    Ok(fused
        .into_iter()
        .map(|f| HybridSearchResult {
            document: f.item.document,
            rrf_score: f.score,
            vector_rank: f.vector_rank,
            text_rank: f.text_rank,
        })
        .collect())
}

fn tolerate(hits: Result<Vec<DocumentHit>>, name: &str, leg: &str) -> Vec<DocumentHit> {
    hits.unwrap_or_else(|e| {
        warn!(collection = name, leg, error = %e, "hybrid sub-search failed; continuing without it");
        Vec::new()
    })
}
