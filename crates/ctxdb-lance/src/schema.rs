//! Arrow layout of a collection and conversions between `VectorDocument`s
//! and record batches.

use arrow_array::cast::AsArray;
use arrow_array::types::{Float32Type, Float64Type, Int32Type, Int64Type, UInt32Type, UInt64Type};
use arrow_array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray,
};
use arrow_schema::{ArrowError, DataType, Field, FieldRef, Schema, SchemaRef};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use ctxdb_core::types::{parse_metadata, Row, VectorDocument};
use ctxdb_hybrid::Ranked;

pub const ID_COLUMN: &str = "id";
pub const VECTOR_COLUMN: &str = "vector";
pub const CONTENT_COLUMN: &str = "content";
pub const METADATA_COLUMN: &str = "metadata";
pub const DISTANCE_COLUMN: &str = "_distance";

/// Row written when a hybrid collection is created so the full-text index
/// has data to build over. Deleted right after.
pub const PLACEHOLDER_ID: &str = "__sample__";

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error("missing or mistyped column '{0}'")]
    MissingColumn(&'static str),

    #[error("table has no fixed-size 'vector' column")]
    NoVectorColumn,

    #[error("document '{id}' has a {actual}-dimensional vector, collection expects {expected}")]
    Dimension { id: String, expected: usize, actual: usize },

    #[error("invalid metadata JSON: {0}")]
    Metadata(#[from] serde_json::Error),
}

pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

pub fn build_arrow_schema(dimension: i32) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ID_COLUMN, DataType::Utf8, false),
        Field::new(
            VECTOR_COLUMN,
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension),
            true,
        ),
        Field::new(CONTENT_COLUMN, DataType::Utf8, false),
        Field::new("relativePath", DataType::Utf8, false),
        Field::new("startLine", DataType::Int64, false),
        Field::new("endLine", DataType::Int64, false),
        Field::new("fileExtension", DataType::Utf8, false),
        Field::new(METADATA_COLUMN, DataType::Utf8, true),
    ]))
}

/// Item field and list size of the `vector` column.
pub fn vector_layout(schema: &Schema) -> SchemaResult<(FieldRef, i32)> {
    match schema.field_with_name(VECTOR_COLUMN).map(Field::data_type) {
        Ok(DataType::FixedSizeList(item, size)) => Ok((item.clone(), *size)),
        _ => Err(SchemaError::NoVectorColumn),
    }
}

pub fn placeholder_document(dimension: usize) -> VectorDocument {
    VectorDocument {
        id: PLACEHOLDER_ID.to_string(),
        vector: vec![0.0; dimension],
        content: "Sample content for schema initialization".to_string(),
        relative_path: String::new(),
        start_line: 0,
        end_line: 0,
        file_extension: String::new(),
        metadata: Default::default(),
    }
}

/// Keep only the last occurrence of every id, in the order those last
/// occurrences appear. Upserts reject sources with repeated keys.
pub fn last_per_id(docs: &[VectorDocument]) -> Vec<&VectorDocument> {
    let mut seen = HashSet::with_capacity(docs.len());
    let mut kept: Vec<&VectorDocument> = docs.iter().rev().filter(|d| seen.insert(d.id.as_str())).collect();
    kept.reverse();
    kept
}

pub fn documents_to_batch(docs: &[&VectorDocument], schema: SchemaRef) -> SchemaResult<RecordBatch> {
    let (item, dimension) = vector_layout(&schema)?;
    let expected = usize::try_from(dimension).map_err(|_| SchemaError::NoVectorColumn)?;

    let mut flat = Vec::with_capacity(docs.len() * expected);
    let mut metadata = Vec::with_capacity(docs.len());
    for doc in docs {
        if doc.vector.len() != expected {
            return Err(SchemaError::Dimension { id: doc.id.clone(), expected, actual: doc.vector.len() });
        }
        flat.extend_from_slice(&doc.vector);
        metadata.push(serde_json::to_string(&doc.metadata)?);
    }
    let vectors = FixedSizeListArray::try_new(item, dimension, Arc::new(Float32Array::from(flat)), None)?;

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(docs.iter().map(|d| d.id.as_str()))),
        Arc::new(vectors),
        Arc::new(StringArray::from_iter_values(docs.iter().map(|d| d.content.as_str()))),
        Arc::new(StringArray::from_iter_values(docs.iter().map(|d| d.relative_path.as_str()))),
        Arc::new(Int64Array::from_iter_values(docs.iter().map(|d| d.start_line))),
        Arc::new(Int64Array::from_iter_values(docs.iter().map(|d| d.end_line))),
        Arc::new(StringArray::from_iter_values(docs.iter().map(|d| d.file_extension.as_str()))),
        Arc::new(StringArray::from(metadata)),
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}

/// A document read back from a search, with whichever engine signal the
/// query produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHit {
    pub document: VectorDocument,
    /// Cosine distance; absent for full-text hits.
    pub distance: Option<f32>,
}

impl Ranked for DocumentHit {
    fn id(&self) -> &str {
        &self.document.id
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &'static str) -> SchemaResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or(SchemaError::MissingColumn(name))
}

fn int_column<'a>(batch: &'a RecordBatch, name: &'static str) -> SchemaResult<&'a Int64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or(SchemaError::MissingColumn(name))
}

fn f32_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a Float32Array> {
    batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<Float32Array>())
}

fn vector_at(vectors: Option<&FixedSizeListArray>, i: usize) -> Vec<f32> {
    match vectors {
        Some(fsl) if fsl.is_valid(i) => fsl.value(i).as_primitive::<Float32Type>().values().to_vec(),
        _ => Vec::new(),
    }
}

pub fn batch_to_hits(batch: &RecordBatch) -> SchemaResult<Vec<DocumentHit>> {
    let ids = string_column(batch, ID_COLUMN)?;
    let contents = string_column(batch, CONTENT_COLUMN)?;
    let paths = string_column(batch, "relativePath")?;
    let starts = int_column(batch, "startLine")?;
    let ends = int_column(batch, "endLine")?;
    let extensions = string_column(batch, "fileExtension")?;
    let metadata = string_column(batch, METADATA_COLUMN).ok();
    let vectors = batch
        .column_by_name(VECTOR_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>());
    let distances = f32_column(batch, DISTANCE_COLUMN);

    let mut hits = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let raw_meta = metadata.filter(|m| m.is_valid(i)).map(|m| m.value(i));
        hits.push(DocumentHit {
            document: VectorDocument {
                id: ids.value(i).to_string(),
                vector: vector_at(vectors, i),
                content: contents.value(i).to_string(),
                relative_path: paths.value(i).to_string(),
                start_line: starts.value(i),
                end_line: ends.value(i),
                file_extension: extensions.value(i).to_string(),
                metadata: parse_metadata(raw_meta)?,
            },
            distance: distances.filter(|d| d.is_valid(i)).map(|d| d.value(i)),
        });
    }
    Ok(hits)
}

/// Convert a projected batch into JSON rows. `metadata` strings are parsed
/// back into objects; column types outside the collection layout become null.
pub fn batch_to_rows(batch: &RecordBatch) -> SchemaResult<Vec<Row>> {
    let schema = batch.schema();
    let mut rows = vec![Row::new(); batch.num_rows()];
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let is_metadata = field.name() == METADATA_COLUMN;
        for (i, row) in rows.iter_mut().enumerate() {
            let value = if is_metadata && column.data_type() == &DataType::Utf8 && column.is_valid(i) {
                Value::Object(parse_metadata(Some(column.as_string::<i32>().value(i)))?)
            } else {
                cell_to_json(column, i)
            };
            row.insert(field.name().clone(), value);
        }
    }
    Ok(rows)
}

fn float_to_json(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn cell_to_json(column: &ArrayRef, i: usize) -> Value {
    if column.is_null(i) {
        return Value::Null;
    }
    match column.data_type() {
        DataType::Utf8 => Value::from(column.as_string::<i32>().value(i)),
        DataType::LargeUtf8 => Value::from(column.as_string::<i64>().value(i)),
        DataType::Boolean => Value::from(column.as_boolean().value(i)),
        DataType::Int32 => Value::from(column.as_primitive::<Int32Type>().value(i)),
        DataType::Int64 => Value::from(column.as_primitive::<Int64Type>().value(i)),
        DataType::UInt32 => Value::from(column.as_primitive::<UInt32Type>().value(i)),
        DataType::UInt64 => Value::from(column.as_primitive::<UInt64Type>().value(i)),
        DataType::Float32 => float_to_json(f64::from(column.as_primitive::<Float32Type>().value(i))),
        DataType::Float64 => float_to_json(column.as_primitive::<Float64Type>().value(i)),
        DataType::FixedSizeList(_, _) => {
            let inner = column.as_fixed_size_list().value(i);
            list_to_json(&inner)
        }
        DataType::List(_) => {
            let inner = column.as_list::<i32>().value(i);
            list_to_json(&inner)
        }
        _ => Value::Null,
    }
}

fn list_to_json(values: &ArrayRef) -> Value {
    Value::Array((0..values.len()).map(|j| cell_to_json(values, j)).collect())
}
