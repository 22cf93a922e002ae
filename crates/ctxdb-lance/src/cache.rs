//! Open-table handle cache keyed by collection name.
//!
//! The lock is never held across an await. Two tasks missing the cache at
//! the same time may both open the table; the later insert wins and both
//! handles stay valid.

use lancedb::{Connection, Table};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use ctxdb_core::{Error, Result};

#[derive(Default)]
pub struct TableCache {
    tables: Mutex<HashMap<String, Table>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Table>> {
        // A poisoned map is still a valid map of handles.
        self.tables.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn get(&self, name: &str) -> Option<Table> {
        self.lock().get(name).cloned()
    }

    /// Cached handle, or open the table and remember it. Any open failure
    /// maps to `CollectionNotFound`.
    pub async fn get_or_open(&self, conn: &Connection, name: &str) -> Result<Table> {
        if let Some(table) = self.get(name) {
            return Ok(table);
        }
        let table = conn
            .open_table(name)
            .execute()
            .await
            .map_err(|e| Error::collection_not_found(name, e))?;
        debug!(collection = name, "opened table");
        self.insert(name, table.clone());
        Ok(table)
    }

    pub fn insert(&self, name: &str, table: Table) {
        self.lock().insert(name.to_string(), table);
    }

    pub fn invalidate(&self, name: &str) {
        if self.lock().remove(name).is_some() {
            debug!(collection = name, "evicted cached table");
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
