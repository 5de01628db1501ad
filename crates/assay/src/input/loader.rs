//! JSON extraction-result loader.
//!
//! Accepts either an array of `{document_id: [record, ...]}` objects or a
//! single such object. Record keys become columns in first-seen order and a
//! document id column is appended.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value as Json;
use sha2::{Digest, Sha256};

use crate::error::{AssayError, Result};
use crate::table::{Table, Value};

use super::source::SourceMetadata;

/// Default name of the appended document id column.
pub const DOCUMENT_ID_COLUMN: &str = "document_id";

/// Loads extraction results into a [`Table`].
#[derive(Debug, Clone)]
pub struct JsonLoader {
    document_id_column: String,
}

impl Default for JsonLoader {
    fn default() -> Self {
        Self {
            document_id_column: DOCUMENT_ID_COLUMN.to_string(),
        }
    }
}

impl JsonLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the appended document id column.
    pub fn with_document_id_column(mut self, column: impl Into<String>) -> Self {
        self.document_id_column = column.into();
        self
    }

    /// Load a file and return the table and metadata.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(Table, SourceMetadata)> {
        let path = path.as_ref();
        let io_err = |e| AssayError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let size_bytes = file.metadata().map_err(io_err)?.len();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(io_err)?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let json: Json = serde_json::from_slice(&contents)?;
        let (table, document_count) = self.parse_value(json)?;

        tracing::info!(
            path = %path.display(),
            documents = document_count,
            rows = table.row_count(),
            columns = table.column_count(),
            "Loaded JSON extraction results"
        );
        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            document_count,
            table.row_count(),
            table.column_count(),
        );
        Ok((table, metadata))
    }

    /// Parse a JSON document held in memory.
    pub fn parse_str(&self, json: &str) -> Result<Table> {
        let value: Json = serde_json::from_str(json)?;
        Ok(self.parse_value(value)?.0)
    }

    fn parse_value(&self, json: Json) -> Result<(Table, usize)> {
        let documents = match json {
            Json::Array(items) => items,
            obj @ Json::Object(_) => vec![obj],
            other => {
                return Err(AssayError::Schema(format!(
                    "expected an array of documents or a single document object, found {}",
                    json_type(&other)
                )));
            }
        };

        let mut columns: IndexMap<String, Vec<Value>> = IndexMap::new();
        let mut doc_ids: Vec<Value> = Vec::new();
        let mut document_count = 0;

        for (position, document) in documents.into_iter().enumerate() {
            let Json::Object(entries) = document else {
                return Err(AssayError::Schema(format!(
                    "document {} is {}, expected an object",
                    position,
                    json_type(&document)
                )));
            };
            for (doc_id, records) in entries {
                document_count += 1;
                let Json::Array(records) = records else {
                    return Err(AssayError::Schema(format!(
                        "records of document '{}' must be an array, found {}",
                        doc_id,
                        json_type(&records)
                    )));
                };
                for (index, record) in records.into_iter().enumerate() {
                    let Json::Object(fields) = record else {
                        return Err(AssayError::Schema(format!(
                            "record {} of document '{}' is {}, expected an object",
                            index,
                            doc_id,
                            json_type(&record)
                        )));
                    };
                    let row = doc_ids.len();
                    for (key, value) in fields {
                        let cells = columns.entry(key).or_insert_with(|| vec![Value::Null; row]);
                        cells.push(to_cell(value));
                    }
                    // Keys absent from this record stay missing.
                    for cells in columns.values_mut() {
                        if cells.len() == row {
                            cells.push(Value::Null);
                        }
                    }
                    doc_ids.push(Value::Str(doc_id.clone()));
                }
            }
        }

        if doc_ids.is_empty() {
            return Err(AssayError::EmptyData(
                "the document contains no records to load".to_string(),
            ));
        }
        if columns.contains_key(&self.document_id_column) {
            tracing::warn!(
                column = %self.document_id_column,
                "Records already carry a document id column; it is replaced"
            );
            columns.shift_remove(&self.document_id_column);
        }

        let mut table = Table::from_columns(columns)?;
        table.insert_column(self.document_id_column.clone(), doc_ids)?;
        Ok((table, document_count))
    }
}

fn to_cell(value: Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        Json::String(s) => Value::Str(s),
        Json::Array(items) => Value::List(items.into_iter().map(to_cell).collect()),
        obj @ Json::Object(_) => Value::Str(obj.to_string()),
    }
}

fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
