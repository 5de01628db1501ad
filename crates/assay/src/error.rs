//! Error types for the assay library.

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`AssayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid stage signature, invalid operator arguments, missing column.
    Configuration,
    /// Wrong cell type, non-list where a list is expected.
    Schema,
    /// Missing data, negative or non-positive values, empty strings, regex violations.
    Integrity,
    /// Embedding/clustering failure, non-table stage output.
    Runtime,
    /// Reading or writing files.
    Io,
}

/// Main error type for assay operations.
#[derive(Debug, Error)]
pub enum AssayError {
    /// Invalid operator or pipeline configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A column required by an operator is not in the table.
    #[error("Column '{column}' not found in the table. {context}")]
    MissingColumn { column: String, context: String },

    /// A regular expression failed validation.
    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A stage declared a signature that cannot run in a pipeline.
    #[error("Stage '{stage}' {message}")]
    InvalidSignature { stage: String, message: String },

    /// Cells of the wrong type.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Data that violates an integrity rule.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// A table with zero rows reached something that needs rows.
    #[error("Table must contain at least one row (i.e., not be empty): {0}")]
    EmptyTable(String),

    /// Empty input document or no records to load.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A stage produced something other than a table.
    #[error("Stage '{stage}' returned type '{actual}', but expected 'Table'.")]
    StageOutput { stage: String, actual: String },

    /// Embedding model could not be loaded.
    #[error("Embedding model '{model}' could not be loaded: {message}")]
    ModelLoad { model: String, message: String },

    /// Embedding or clustering failed while deduplicating.
    #[error("Embedding model '{model}' failed: {message}")]
    Embedding { model: String, message: String },

    /// Any other failure while executing a stage.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AssayError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssayError::Config(_)
            | AssayError::MissingColumn { .. }
            | AssayError::InvalidPattern { .. }
            | AssayError::InvalidSignature { .. }
            | AssayError::ModelLoad { .. } => ErrorKind::Configuration,
            AssayError::Schema(_) => ErrorKind::Schema,
            AssayError::Integrity(_) | AssayError::EmptyTable(_) | AssayError::EmptyData(_) => {
                ErrorKind::Integrity
            }
            AssayError::StageOutput { .. }
            | AssayError::Embedding { .. }
            | AssayError::Runtime(_) => ErrorKind::Runtime,
            AssayError::Io { .. } | AssayError::Json(_) | AssayError::Csv(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn missing_column(column: &str, context: &str) -> Self {
        AssayError::MissingColumn {
            column: column.to_string(),
            context: context.to_string(),
        }
    }
}

/// Result type alias for assay operations.
pub type Result<T> = std::result::Result<T, AssayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(AssayError::Config("x".into()).kind(), ErrorKind::Configuration);
        assert_eq!(AssayError::missing_column("a", "").kind(), ErrorKind::Configuration);
        assert_eq!(AssayError::Schema("x".into()).kind(), ErrorKind::Schema);
        assert_eq!(AssayError::EmptyTable("x".into()).kind(), ErrorKind::Integrity);
        assert_eq!(
            AssayError::ModelLoad { model: "m".into(), message: "x".into() }.kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            AssayError::StageOutput {
                stage: "s".into(),
                actual: "usize".into()
            }
            .kind(),
            ErrorKind::Runtime
        );
    }

    #[test]
    fn test_stage_output_message() {
        let err = AssayError::StageOutput {
            stage: "to_count".into(),
            actual: "usize".into(),
        };
        assert_eq!(
            err.to_string(),
            "Stage 'to_count' returned type 'usize', but expected 'Table'."
        );
    }
}
