use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    HybridSearchOptions, HybridSearchResult, Row, SearchOptions, SearchRequest, SearchResult,
    VectorDocument,
};

/// The capability set every vector store backend exposes.
///
/// Filter expressions are opaque SQL-like predicates handed to the engine
/// verbatim (e.g. `fileExtension = '.go'`). Callers are responsible for
/// quoting any untrusted values they splice into them.
#[async_trait]
pub trait VectorDatabase: Send + Sync {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()>;
    /// Like `create_collection`, additionally provisioning a full-text index on `content`.
    async fn create_hybrid_collection(&self, name: &str, dimension: usize) -> Result<()>;
    async fn drop_collection(&self, name: &str) -> Result<()>;
    async fn has_collection(&self, name: &str) -> Result<bool>;
    async fn list_collections(&self) -> Result<Vec<String>>;

    async fn insert(&self, name: &str, documents: &[VectorDocument]) -> Result<()>;
    async fn insert_hybrid(&self, name: &str, documents: &[VectorDocument]) -> Result<()> {
        self.insert(name, documents).await
    }

    async fn search(
        &self,
        name: &str,
        query_vector: &[f32],
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>>;
    async fn hybrid_search(
        &self,
        name: &str,
        requests: &[SearchRequest],
        options: &HybridSearchOptions,
    ) -> Result<Vec<HybridSearchResult>>;

    async fn delete(&self, name: &str, ids: &[String]) -> Result<()>;
    async fn query(
        &self,
        name: &str,
        filter: &str,
        output_fields: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<Row>>;
}
