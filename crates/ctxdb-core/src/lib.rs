#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Engine-independent building blocks shared by every ctxdb crate: the
//! document model, the error type, the `VectorDatabase` capability set and
//! configuration loading.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::VectorDatabase;
pub use types::{
    HybridSearchOptions, HybridSearchResult, Metadata, Row, SearchOptions, SearchRequest,
    SearchResult, VectorDocument,
};
