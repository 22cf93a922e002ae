//! ctxdb-hybrid
//!
//! Engine-independent pieces of hybrid search: turning a list of
//! `SearchRequest`s into a fetch plan (`plan`) and merging the two ranked
//! candidate lists with Reciprocal Rank Fusion (`rrf`).

pub mod plan;
pub mod rrf;

pub use plan::{HybridPlan, OVERFETCH_FACTOR};
pub use rrf::{reciprocal_rank_fusion, Fused, Ranked, RRF_K};
