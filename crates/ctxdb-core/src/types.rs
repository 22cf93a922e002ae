//! Domain types shared by the LanceDB adapter, the fusion engine and the CLI.

use serde::{Deserialize, Serialize};

/// Free-form per-document metadata. Persisted as a JSON string column.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A projected row returned by `VectorDatabase::query`.
pub type Row = serde_json::Map<String, serde_json::Value>;

pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_HYBRID_LIMIT: usize = 10;

/// A chunk of source code with its embedding.
///
/// - `id`: unique within a collection; inserting an existing id replaces the row
/// - `relative_path`/`start_line`/`end_line`: location of the chunk in its file
/// - `metadata`: stored as a JSON string, read back as an object (empty if absent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorDocument {
    pub id: String,
    #[serde(default)]
    pub vector: Vec<f32>,
    pub content: String,
    pub relative_path: String,
    pub start_line: i64,
    pub end_line: i64,
    pub file_extension: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Parse a stored metadata column value. Absent or blank input yields an
/// empty map.
pub fn parse_metadata(raw: Option<&str>) -> serde_json::Result<Metadata> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Metadata::new()),
        Some(s) => serde_json::from_str(s),
    }
}

/// Result of a plain nearest-neighbour search.
///
/// `distance` is the engine's cosine distance: lower is more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: VectorDocument,
    pub distance: f32,
}

/// Result of a hybrid search.
///
/// `rrf_score` is the Reciprocal Rank Fusion score: higher is more relevant.
/// The ranks record where the document appeared in each sub-search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridSearchResult {
    pub document: VectorDocument,
    pub rrf_score: f32,
    pub vector_rank: Option<usize>,
    pub text_rank: Option<usize>,
}

/// One leg of a hybrid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchRequest {
    /// Dense nearest-neighbour search over the `vector` column.
    Vector {
        vector: Vec<f32>,
        #[serde(default)]
        limit: Option<usize>,
    },
    /// Full-text search over the `content` column.
    Text {
        query: String,
        #[serde(default)]
        limit: Option<usize>,
    },
}

impl SearchRequest {
    pub fn vector(vector: impl Into<Vec<f32>>) -> Self {
        Self::Vector { vector: vector.into(), limit: None }
    }

    pub fn text(query: impl Into<String>) -> Self {
        Self::Text { query: query.into(), limit: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub top_k: Option<usize>,
    pub filter_expr: Option<String>,
}

impl SearchOptions {
    pub fn top_k(top_k: usize) -> Self {
        Self { top_k: Some(top_k), filter_expr: None }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_expr = Some(filter.into());
        self
    }

    pub fn effective_top_k(&self) -> usize {
        self.top_k.filter(|k| *k > 0).unwrap_or(DEFAULT_TOP_K)
    }

    pub fn filter(&self) -> Option<&str> {
        non_blank(self.filter_expr.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HybridSearchOptions {
    pub limit: Option<usize>,
    pub filter_expr: Option<String>,
}

impl HybridSearchOptions {
    pub fn limit(limit: usize) -> Self {
        Self { limit: Some(limit), filter_expr: None }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_expr = Some(filter.into());
        self
    }

    pub fn filter(&self) -> Option<&str> {
        non_blank(self.filter_expr.as_deref())
    }
}

/// Filters are passed through verbatim; only blank ones are dropped.
pub fn non_blank(expr: Option<&str>) -> Option<&str> {
    expr.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_uses_column_names_in_json() {
        let doc: VectorDocument = serde_json::from_value(json!({
            "id": "a",
            "vector": [1.0, 0.0],
            "content": "fn main() {}",
            "relativePath": "src/main.rs",
            "startLine": 1,
            "endLine": 3,
            "fileExtension": ".rs"
        }))
        .expect("document");
        assert_eq!(doc.relative_path, "src/main.rs");
        assert!(doc.metadata.is_empty(), "metadata defaults to an empty map");

        let back = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(back["fileExtension"], ".rs");
    }

    #[test]
    fn parse_metadata_defaults_to_empty() {
        assert!(parse_metadata(None).expect("none").is_empty());
        assert!(parse_metadata(Some("")).expect("empty").is_empty());
        assert!(parse_metadata(Some("  ")).expect("blank").is_empty());
        let m = parse_metadata(Some(r#"{"lang":"go"}"#)).expect("object");
        assert_eq!(m.get("lang"), Some(&json!("go")));
        assert!(parse_metadata(Some("[1,2]")).is_err(), "non-object metadata is rejected");
    }

    #[test]
    fn search_request_is_explicitly_tagged() {
        let reqs: Vec<SearchRequest> = serde_json::from_value(json!([
            {"kind": "vector", "vector": [0.1, 0.2, 0.3]},
            {"kind": "text", "query": "hello world", "limit": 4}
        ]))
        .expect("requests");
        assert_eq!(reqs[0], SearchRequest::vector(vec![0.1, 0.2, 0.3]));
        assert_eq!(reqs[1], SearchRequest::Text { query: "hello world".into(), limit: Some(4) });
        assert!(serde_json::from_value::<SearchRequest>(json!({"vector": [1.0]})).is_err());
    }

    #[test]
    fn blank_filters_are_ignored() {
        assert_eq!(SearchOptions::default().filter(), None);
        assert_eq!(SearchOptions::top_k(3).with_filter("   ").filter(), None);
        assert_eq!(
            HybridSearchOptions::limit(5).with_filter("fileExtension = '.go'").filter(),
            Some("fileExtension = '.go'")
        );
        assert_eq!(SearchOptions::top_k(0).effective_top_k(), DEFAULT_TOP_K);
    }
}
