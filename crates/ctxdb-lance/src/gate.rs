//! One-shot connection initialization.
//!
//! The gate is built synchronously and owns a single shared future that
//! creates the storage directory and opens the database. Every operation
//! awaits that same future, so initialization runs at most once and a
//! failure is reported identically to every caller, now and later.

use futures::future::{BoxFuture, FutureExt, Shared};
use lancedb::{connect, Connection};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use ctxdb_core::{Error, Result};

type SharedCause = Arc<dyn StdError + Send + Sync + 'static>;
type InitFuture = Shared<BoxFuture<'static, std::result::Result<Connection, SharedCause>>>;

pub struct ConnectionGate {
    uri: String,
    init: InitFuture,
}

impl ConnectionGate {
    /// Start connecting to `path`. When called inside a Tokio runtime the
    /// connection is driven in the background right away; otherwise it
    /// starts on the first `ready()`.
    pub fn new(path: PathBuf, read_consistency: Option<Duration>) -> Self {
        let uri = path.to_string_lossy().into_owned();
        let init = initialize(path, read_consistency).boxed().shared();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(init.clone());
        }
        Self { uri, init }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Wait for initialization and return the connection or its failure.
    pub async fn ready(&self) -> Result<Connection> {
        self.init.clone().await.map_err(|source| self.connection_error(source))
    }

    /// The connection if initialization has already settled, without waiting.
    pub fn connection(&self) -> Result<Connection> {
        match self.init.peek() {
            Some(Ok(conn)) => Ok(conn.clone()),
            Some(Err(source)) => Err(self.connection_error(source.clone())),
            None => Err(Error::Uninitialized),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.init.peek(), Some(Ok(_)))
    }

    fn connection_error(&self, source: SharedCause) -> Error {
        Error::Connection { uri: self.uri.clone(), source }
    }
}

async fn initialize(
    path: PathBuf,
    read_consistency: Option<Duration>,
) -> std::result::Result<Connection, SharedCause> {
    let uri = path.to_string_lossy().into_owned();
    debug!(%uri, "initializing LanceDB connection");

    if let Err(e) = tokio::fs::create_dir_all(&path).await {
        error!(%uri, error = %e, "failed to create database directory");
        return Err(Arc::new(e));
    }

    let mut builder = connect(&uri);
    if let Some(interval) = read_consistency {
        builder = builder.read_consistency_interval(interval);
    }
    match builder.execute().await {
        Ok(conn) => {
            info!(%uri, "LanceDB connection ready");
            Ok(conn)
        }
        Err(e) => {
            error!(%uri, error = %e, "failed to open LanceDB");
            Err(Arc::new(e))
        }
    }
}
