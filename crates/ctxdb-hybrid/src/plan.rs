use ctxdb_core::types::{HybridSearchOptions, SearchRequest, DEFAULT_HYBRID_LIMIT};
use tracing::debug;

/// Each sub-search fetches this many times the final limit before fusion.
pub const OVERFETCH_FACTOR: usize = 2;

/// What a hybrid search will ask the engine for.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridPlan {
    pub vector: Option<Vec<f32>>,
    pub text: Option<String>,
    /// Size of the fused output.
    pub limit: usize,
    /// Candidates requested from each sub-search.
    pub fetch: usize,
    pub filter: Option<String>,
}

impl HybridPlan {
    /// Later requests of the same kind replace earlier ones. The limit comes
    /// from `options`, then the vector request, then the default.
    pub fn from_requests(requests: &[SearchRequest], options: &HybridSearchOptions) -> Self {
        let mut vector: Option<(&[f32], Option<usize>)> = None;
        let mut text: Option<&str> = None;
        for request in requests {
            match request {
                SearchRequest::Vector { vector: v, limit } => vector = Some((v.as_slice(), *limit)),
                SearchRequest::Text { query, .. } => text = Some(query.as_str()),
            }
        }

        // Zero counts as unset at every step of the fallback.
        let limit = options
            .limit
            .filter(|l| *l > 0)
            .or_else(|| vector.and_then(|(_, l)| l).filter(|l| *l > 0))
            .unwrap_or(DEFAULT_HYBRID_LIMIT);
        let plan = Self {
            vector: vector.map(|(v, _)| v.to_vec()),
            text: text.map(str::to_string),
            limit,
            fetch: limit.saturating_mul(OVERFETCH_FACTOR),
            filter: options.filter().map(str::to_string),
        };
        debug!(
            has_vector = plan.vector.is_some(),
            has_text = plan.text.is_some(),
            limit = plan.limit,
            fetch = plan.fetch,
            "planned hybrid search"
        );
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_none() && self.text.is_none()
    }
}
