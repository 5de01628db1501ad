//! Loading extraction results.

mod loader;
mod source;

pub use loader::{DOCUMENT_ID_COLUMN, JsonLoader};
pub use source::SourceMetadata;
