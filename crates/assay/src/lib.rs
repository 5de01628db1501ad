//! Assay: contract-checked cleaning pipeline for extracted tabular records.
//!
//! Records produced by an upstream extraction step are loaded into a
//! [`Table`] and threaded through an ordered list of operators. Every operator
//! declares its signature, which the pipeline checks before it accepts the
//! operator, and every operator fails fast on the first violation it finds.
//!
//! # Core Principles
//!
//! - **Checked at construction**: stages that cannot take and return a table never enter a pipeline
//! - **Fail-fast**: the first violation stops the run and is returned unchanged
//! - **Owned data**: each stage takes the table by value and hands a new one on
//!
//! # Example
//!
//! ```no_run
//! use assay::{JsonLoader, Pipeline};
//! use assay::transform::DropRowsWithNonPositiveValues;
//! use assay::validation::VerifyNoMissingData;
//!
//! let (table, _meta) = JsonLoader::new().load("money_result.json").unwrap();
//! let pipeline = Pipeline::builder()
//!     .operator(VerifyNoMissingData)
//!     .operator(DropRowsWithNonPositiveValues::new(["value"]).unwrap())
//!     .build()
//!     .unwrap();
//!
//! let cleaned = pipeline.run(table).unwrap();
//! println!("Rows: {}", cleaned.row_count());
//! ```

pub mod args;
pub mod dedup;
pub mod embedding;
pub mod error;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod table;
pub mod transform;
pub mod validation;

pub use args::{ColumnList, RegexPattern};
pub use dedup::{DedupConfig, RemoveSemanticDuplicates, TieBreak};
pub use embedding::{Embedder, EmbedderLoader, MockEmbedder, MockLoader, OllamaEmbedder, OllamaLoader};
pub use error::{AssayError, ErrorKind, Result};
pub use input::{JsonLoader, SourceMetadata};
pub use output::{to_csv_string, write_csv};
pub use pipeline::{
    FnStage, Operator, OperatorStage, Pipeline, PipelineSpec, RunReport, Signature, Stage, StageSpec,
};
pub use table::{NonEmptyTable, Table, Value};
