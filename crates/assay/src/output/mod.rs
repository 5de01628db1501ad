//! Writing pipeline results.

mod writer;

pub use writer::{to_csv_string, write_csv};
