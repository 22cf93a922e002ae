use arrow_array::RecordBatch;
use futures::{Stream, StreamExt};
use lancedb::index::scalar::FullTextSearchQuery;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{DistanceType, Table};
use tracing::debug;

use ctxdb_core::error::BoxError;
use ctxdb_core::{Error, Result, Row};

use crate::schema::{batch_to_hits, batch_to_rows, DocumentHit, SchemaResult};

/// Collect every batch of a result stream through `convert`.
async fn drain<S, E, T>(
    mut stream: S,
    op: &'static str,
    name: &str,
    convert: fn(&RecordBatch) -> SchemaResult<Vec<T>>,
) -> Result<Vec<T>>
where
    S: Stream<Item = std::result::Result<RecordBatch, E>> + Unpin,
    E: Into<BoxError>,
{
    let mut out = Vec::new();
    while let Some(batch) = stream.next().await {
        let batch = batch.map_err(|e| Error::operation(op, name, e))?;
        out.extend(convert(&batch).map_err(|e| Error::operation(op, name, e))?);
    }
    Ok(out)
}

/// Cosine nearest neighbours of `vector`, closest first.
pub async fn vector_search(
    table: &Table,
    name: &str,
    vector: &[f32],
    limit: usize,
    filter: Option<&str>,
) -> Result<Vec<DocumentHit>> {
    let mut query = table
        .vector_search(vector.to_vec())
        .map_err(|e| Error::operation("search", name, e))?
        .distance_type(DistanceType::Cosine)
        .limit(limit);
    if let Some(filter) = filter {
        query = query.only_if(filter);
    }
    let stream = query.execute().await.map_err(|e| Error::operation("search", name, e))?;
    let hits = drain(stream, "search", name, batch_to_hits).await?;
    debug!(collection = name, limit, count = hits.len(), "vector search");
    Ok(hits)
}

/// BM25 search over `content`, most relevant first.
pub async fn full_text_search(
    table: &Table,
    name: &str,
    text: &str,
    limit: usize,
    filter: Option<&str>,
) -> Result<Vec<DocumentHit>> {
    let mut query = table
        .query()
        .full_text_search(FullTextSearchQuery::new(text.to_string()))
        .limit(limit);
    if let Some(filter) = filter {
        query = query.only_if(filter);
    }
    let stream = query.execute().await.map_err(|e| Error::operation("full-text search", name, e))?;
    let hits = drain(stream, "full-text search", name, batch_to_hits).await?;
    debug!(collection = name, limit, count = hits.len(), "full-text search");
    Ok(hits)
}

/// Filtered scan. An empty `fields` list returns every column.
pub async fn query_rows(
    table: &Table,
    name: &str,
    filter: Option<&str>,
    fields: &[String],
    limit: Option<usize>,
) -> Result<Vec<Row>> {
    let mut query = table.query();
    if let Some(filter) = filter {
        query = query.only_if(filter);
    }
    if !fields.is_empty() {
        query = query.select(Select::Columns(fields.to_vec()));
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let stream = query.execute().await.map_err(|e| Error::operation("query", name, e))?;
    let rows = drain(stream, "query", name, batch_to_rows).await?;
    debug!(collection = name, count = rows.len(), "query");
    Ok(rows)
}

pub async fn count(table: &Table, name: &str, filter: Option<&str>) -> Result<usize> {
    table
        .count_rows(filter.map(str::to_string))
        .await
        .map_err(|e| Error::operation("count", name, e))
}
