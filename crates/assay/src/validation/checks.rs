//! Column checks shared by the operators.
//!
//! Each check logs the violation at `error` level and returns it.

use crate::error::{AssayError, Result};
use crate::table::{Table, Value};

/// Number of offending values quoted in schema errors.
pub(crate) const SAMPLE_SIZE: usize = 5;

pub(crate) fn fail(err: AssayError) -> AssayError {
    tracing::error!("{}", err);
    err
}

/// The column, or a missing-column error.
pub(crate) fn present<'a>(table: &'a Table, column: &str, operator: &str) -> Result<&'a [Value]> {
    table
        .require_column(
            column,
            &format!("Operator '{}' cannot check it.", operator),
        )
        .map_err(fail)
}

pub(crate) fn non_empty(cells: &[Value], column: &str) -> Result<()> {
    if cells.is_empty() {
        return Err(fail(AssayError::Integrity(format!(
            "Column '{}' is empty.",
            column
        ))));
    }
    Ok(())
}

/// Index labels of the rows where `pred` holds.
pub(crate) fn labels_where(table: &Table, column: &str, pred: impl Fn(&Value) -> bool) -> Vec<usize> {
    table
        .labelled(column)
        .map(|cells| cells.filter(|(_, v)| pred(v)).map(|(l, _)| l).collect())
        .unwrap_or_default()
}

pub(crate) fn no_missing(table: &Table, column: &str) -> Result<()> {
    let missing = labels_where(table, column, Value::is_missing);
    if !missing.is_empty() {
        return Err(fail(AssayError::Integrity(format!(
            "Found missing values in column '{}' at rows {:?}.",
            column, missing
        ))));
    }
    Ok(())
}

pub(crate) fn all_strings(table: &Table, column: &str) -> Result<()> {
    let bad = labels_where(table, column, |v| v.as_str().is_none());
    if !bad.is_empty() {
        return Err(fail(AssayError::Schema(format!(
            "Column '{}' contains non-string values at rows {:?}.",
            column, bad
        ))));
    }
    Ok(())
}

/// Presence, non-empty, no missing, all strings: the common prelude of the
/// string and regex operators.
pub(crate) fn string_column<'a>(table: &'a Table, column: &str, operator: &str) -> Result<&'a [Value]> {
    let cells = present(table, column, operator)?;
    non_empty(cells, column)?;
    no_missing(table, column)?;
    all_strings(table, column)?;
    Ok(cells)
}

/// A column counts as numeric when every non-missing cell is a number and
/// there is at least one.
pub(crate) fn is_numeric_column(cells: &[Value]) -> bool {
    let mut seen = false;
    for cell in cells.iter().filter(|c| !c.is_missing()) {
        if !cell.is_numeric() {
            return false;
        }
        seen = true;
    }
    seen
}
