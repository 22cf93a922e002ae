#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! LanceDB implementation of `VectorDatabase`.
//!
//! A `LanceDbVectorDatabase` is usable as soon as it is constructed: every
//! operation first waits for the shared connection gate, then resolves its
//! table through the handle cache.

pub mod cache;
pub mod gate;
pub mod hybrid;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

use async_trait::async_trait;
use lancedb::{Connection, Table};

use ctxdb_core::config::LanceDbConfig;
use ctxdb_core::types::non_blank;
use ctxdb_core::{
    HybridSearchOptions, HybridSearchResult, Result, Row, SearchOptions, SearchRequest, SearchResult,
    VectorDatabase, VectorDocument,
};

pub use cache::TableCache;
pub use gate::ConnectionGate;
pub use schema::DocumentHit;

pub struct LanceDbVectorDatabase {
    config: LanceDbConfig,
    gate: ConnectionGate,
    tables: TableCache,
}

impl LanceDbVectorDatabase {
    /// Build the adapter and start connecting. Operations wait for the
    /// connection; use `open` to surface a connection failure up front.
    pub fn new(config: LanceDbConfig) -> Self {
        let gate = ConnectionGate::new(config.resolved_path(), config.read_consistency_interval());
        Self { config, gate, tables: TableCache::new() }
    }

    pub async fn open(config: LanceDbConfig) -> Result<Self> {
        let db = Self::new(config);
        db.ready().await?;
        Ok(db)
    }

    pub async fn ready(&self) -> Result<Connection> {
        self.gate.ready().await
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// The connection if it is already established, `Uninitialized` otherwise.
    pub fn connection(&self) -> Result<Connection> {
        self.gate.connection()
    }

    pub fn config(&self) -> &LanceDbConfig {
        &self.config
    }

    pub fn uri(&self) -> &str {
        self.gate.uri()
    }

    /// Number of rows in a collection, optionally filtered.
    pub async fn count(&self, name: &str, filter: Option<&str>) -> Result<usize> {
        let table = self.table(name).await?;
        search::count(&table, name, non_blank(filter)).await
    }

    async fn table(&self, name: &str) -> Result<Table> {
        let conn = self.ready().await?;
        self.tables.get_or_open(&conn, name).await
    }
}

#[async_trait]
impl VectorDatabase for LanceDbVectorDatabase {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        let conn = self.ready().await?;
        table::create_collection(&conn, &self.tables, name, dimension).await
    }

    async fn create_hybrid_collection(&self, name: &str, dimension: usize) -> Result<()> {
        let conn = self.ready().await?;
        table::create_hybrid_collection(&conn, &self.tables, name, dimension).await
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        let conn = self.ready().await?;
        table::drop_collection(&conn, &self.tables, name).await
    }

    async fn has_collection(&self, name: &str) -> Result<bool> {
        let conn = self.ready().await?;
        table::table_exists(&conn, name).await
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let conn = self.ready().await?;
        table::table_names(&conn).await
    }

    async fn insert(&self, name: &str, documents: &[VectorDocument]) -> Result<()> {
        let table = self.table(name).await?;
        writer::upsert(&table, name, documents).await
    }

    async fn search(&self, name: &str, query_vector: &[f32], options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let table = self.table(name).await?;
        let hits = search::vector_search(&table, name, query_vector, options.effective_top_k(), options.filter()).await?;
        Ok(hits
            .into_iter()
            .map(|hit| SearchResult { distance: hit.distance.unwrap_or_default(), document: hit.document })
            .collect())
    }

    async fn hybrid_search(
        &self,
        name: &str,
        requests: &[SearchRequest],
        options: &HybridSearchOptions,
    ) -> Result<Vec<HybridSearchResult>> {
        let table = self.table(name).await?;
        hybrid::hybrid_search(&table, name, requests, options).await
    }

    async fn delete(&self, name: &str, ids: &[String]) -> Result<()> {
        let table = self.table(name).await?;
        writer::delete(&table, name, ids).await
    }

    async fn query(&self, name: &str, filter: &str, output_fields: &[String], limit: Option<usize>) -> Result<Vec<Row>> {
        let table = self.table(name).await?;
        search::query_rows(&table, name, non_blank(Some(filter)), output_fields, limit).await
    }
}
