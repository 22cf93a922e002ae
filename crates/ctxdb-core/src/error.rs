use std::sync::Arc;

use thiserror::Error;

/// Boxed cause carried by engine-facing variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// Opening the database failed. The cause is shared so that every caller
    /// waiting on the same initialization sees the same failure.
    #[error("Connection to '{uri}' failed: {source}")]
    Connection {
        uri: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Database connection is not initialized")]
    Uninitialized,

    #[error("Collection '{name}' does not exist")]
    CollectionNotFound {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("Full-text index creation failed on '{name}': {source}")]
    IndexCreation {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("{op} on '{collection}' failed: {source}")]
    Operation {
        op: &'static str,
        collection: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn operation<E>(op: &'static str, collection: &str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Operation { op, collection: collection.to_string(), source: source.into() }
    }

    pub fn collection_not_found<E>(name: &str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::CollectionNotFound { name: name.to_string(), source: source.into() }
    }

    pub fn index_creation<E>(name: &str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::IndexCreation { name: name.to_string(), source: source.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn operation_error_keeps_cause() {
        let err = Error::operation("insert", "docs", "disk full");
        assert_eq!(err.to_string(), "insert on 'docs' failed: disk full");
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("disk full"));
    }

    #[test]
    fn connection_error_cause_is_shared() {
        let cause: Arc<dyn std::error::Error + Send + Sync> =
            Arc::new(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        let a = Error::Connection { uri: "/db".into(), source: cause.clone() };
        let b = Error::Connection { uri: "/db".into(), source: cause.clone() };
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(Arc::strong_count(&cause), 3);
    }
}
