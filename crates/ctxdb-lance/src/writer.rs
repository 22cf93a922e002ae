use arrow_array::RecordBatchIterator;
use lancedb::Table;
use tracing::{debug, warn};

use ctxdb_core::{Error, Result, VectorDocument};

use crate::schema::{documents_to_batch, last_per_id, ID_COLUMN};

/// Insert documents, replacing rows whose id already exists. Within one
/// call the last document for an id wins.
pub async fn upsert(table: &Table, name: &str, docs: &[VectorDocument]) -> Result<()> {
    if docs.is_empty() {
        return Ok(());
    }
    let unique = last_per_id(docs);
    if unique.len() < docs.len() {
        debug!(collection = name, dropped = docs.len() - unique.len(), "collapsed duplicate ids in batch");
    }

    let schema = table.schema().await.map_err(|e| Error::operation("insert", name, e))?;
    let batch = documents_to_batch(&unique, schema.clone()).map_err(|e| Error::operation("insert", name, e))?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));

    let mut mi = table.merge_insert(&[ID_COLUMN]);
    mi.when_matched_update_all(None).when_not_matched_insert_all();
    mi.execute(reader).await.map_err(|e| Error::operation("insert", name, e))?;
    debug!(collection = name, count = unique.len(), "upserted documents");
    Ok(())
}

/// `id IN ('a', 'b')`. Ids are spliced in as given.
pub fn id_in_predicate(ids: &[String]) -> String {
    let quoted: Vec<String> = ids.iter().map(|id| format!("'{id}'")).collect();
    format!("{ID_COLUMN} IN ({})", quoted.join(", "))
}

pub async fn delete(table: &Table, name: &str, ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    if let Some(id) = ids.iter().find(|id| id.contains('\'')) {
        warn!(collection = name, id = %id, "id contains a quote; delete predicate is not escaped");
    }
    table
        .delete(&id_in_predicate(ids))
        .await
        .map_err(|e| Error::operation("delete", name, e))?;
    debug!(collection = name, count = ids.len(), "deleted documents");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_lists_every_id() {
        let ids = vec!["a".to_string(), "b".to_string()];
        assert_eq!(id_in_predicate(&ids), "id IN ('a', 'b')");
        assert_eq!(id_in_predicate(&ids[..1]), "id IN ('a')");
    }
}
