use arrow_array::RecordBatchIterator;
use lancedb::index::{Index, IndexType};
use lancedb::{Connection, Table};
use tracing::{debug, error, info};

use ctxdb_core::{Error, Result};

use crate::cache::TableCache;
use crate::schema::{
    build_arrow_schema, documents_to_batch, placeholder_document, CONTENT_COLUMN, PLACEHOLDER_ID,
};

pub async fn table_names(conn: &Connection) -> Result<Vec<String>> {
    conn.table_names()
        .execute()
        .await
        .map_err(|e| Error::operation("list collections", "*", e))
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(table_names(conn).await?.iter().any(|t| t == name))
}

/// Distinct from the engine's default `<column>_idx` so a scalar index on
/// `content` does not block it.
pub const FTS_INDEX_NAME: &str = "content_fts";

fn full_text_index(table: &Table) -> lancedb::index::IndexBuilder {
    table
        .create_index(&[CONTENT_COLUMN], Index::FTS(Default::default()))
        .name(FTS_INDEX_NAME.to_string())
}

fn fixed_size(name: &str, dimension: usize) -> Result<i32> {
    i32::try_from(dimension)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| Error::operation("create collection", name, format!("invalid dimension {dimension}")))
}

/// Create an empty collection. An existing one is left untouched.
pub async fn create_collection(conn: &Connection, cache: &TableCache, name: &str, dimension: usize) -> Result<()> {
    if table_exists(conn, name).await? {
        info!(collection = name, "collection already exists");
        return Ok(());
    }
    let schema = build_arrow_schema(fixed_size(name, dimension)?);
    let table = conn
        .create_empty_table(name, schema)
        .execute()
        .await
        .map_err(|e| Error::operation("create collection", name, e))?;
    cache.insert(name, table);
    info!(collection = name, dimension, "created collection");
    Ok(())
}

/// Create a collection with a full-text index on `content`. The index needs
/// data to build over, so a placeholder row is written first and removed
/// once the index exists.
pub async fn create_hybrid_collection(
    conn: &Connection,
    cache: &TableCache,
    name: &str,
    dimension: usize,
) -> Result<()> {
    if table_exists(conn, name).await? {
        info!(collection = name, "hybrid collection already exists");
        return Ok(());
    }
    let schema = build_arrow_schema(fixed_size(name, dimension)?);
    let placeholder = placeholder_document(dimension);
    let batch = documents_to_batch(&[&placeholder], schema.clone())
        .map_err(|e| Error::operation("create collection", name, e))?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
    let table = conn
        .create_table(name, reader)
        .execute()
        .await
        .map_err(|e| Error::operation("create collection", name, e))?;

    if let Err(e) = full_text_index(&table).execute().await {
        error!(collection = name, error = %e, "full-text index creation failed");
        return Err(Error::index_creation(name, e));
    }
    table
        .delete(&format!("id = '{PLACEHOLDER_ID}'"))
        .await
        .map_err(|e| Error::operation("create collection", name, e))?;

    cache.insert(name, table);
    info!(collection = name, dimension, "created hybrid collection with full-text index");
    Ok(())
}

pub async fn drop_collection(conn: &Connection, cache: &TableCache, name: &str) -> Result<()> {
    cache.invalidate(name);
    conn.drop_table(name, &[]).await.map_err(|e| match e {
        lancedb::Error::TableNotFound { .. } => Error::collection_not_found(name, e),
        other => Error::operation("drop collection", name, other),
    })?;
    info!(collection = name, "dropped collection");
    Ok(())
}

/// Only a full-text index on `content` serves text queries; scalar indices
/// on the same column do not.
fn is_content_fts(index_type: &IndexType, columns: &[String]) -> bool {
    matches!(index_type, IndexType::FTS) && columns.iter().any(|c| c == CONTENT_COLUMN)
}

/// Make sure `content` carries a full-text index, building one if missing.
/// Losing a creation race to another writer is not an error.
pub async fn ensure_fts_index(table: &Table, name: &str) -> Result<()> {
    let indices = table
        .list_indices()
        .await
        .map_err(|e| Error::operation("list indices", name, e))?;
    if indices.iter().any(|idx| is_content_fts(&idx.index_type, &idx.columns)) {
        return Ok(());
    }

    debug!(collection = name, "building missing full-text index");
    let built = full_text_index(table).replace(false).execute().await;
    match built {
        Ok(()) => {
            info!(collection = name, "created full-text index on content");
            Ok(())
        }
        Err(e) if e.to_string().contains("already exists") => {
            debug!(collection = name, "full-text index already exists");
            Ok(())
        }
        Err(e) => {
            error!(collection = name, error = %e, "full-text index creation failed");
            Err(Error::index_creation(name, e))
        }
    }
}
