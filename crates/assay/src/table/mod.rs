//! Tabular data model.

mod frame;
mod group;
mod value;

pub use frame::{NonEmptyTable, Table};
pub use group::{GroupKey, Partitions, partition};
pub use value::{Value, column};
