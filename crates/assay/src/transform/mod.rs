//! Transformation operators: filters and restructurers.

mod operations;

pub use operations::{
    DropRowsIfNoColumnMatchesRegex, DropRowsNotSatisfyingRegex, DropRowsWithNonPositiveValues,
    GroupByDocumentAndStackTypes, ReduceListIntsToUnique,
};
