//! Pass-through validation operators.
//!
//! Every validator returns its input unchanged on success and fails on the
//! first violation it finds, naming the column and the offending row labels.

use crate::args::{ColumnList, RegexPattern};
use crate::error::{AssayError, Result};
use crate::pipeline::{Operator, ParamKind, Signature};
use crate::table::{NonEmptyTable, Table, Value};

use super::checks::{self, SAMPLE_SIZE, fail, labels_where};

fn columns_param() -> ParamKind {
    ParamKind::other("ColumnList")
}

/// Fails when any column holds a missing cell.
#[derive(Debug, Clone, Default)]
pub struct VerifyNoMissingData;

impl Operator for VerifyNoMissingData {
    fn signature(&self) -> Signature {
        Signature::operator("verify_no_missing_data")
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        tracing::info!("Verifying table for missing data");
        for name in input.column_names() {
            checks::no_missing(&input, name)?;
        }
        tracing::info!("No missing data found");
        Ok(input.into_inner())
    }
}

/// Fails when a numeric column holds a negative value. Missing cells are ignored.
#[derive(Debug, Clone, Default)]
pub struct VerifyNoNegatives;

impl Operator for VerifyNoNegatives {
    fn signature(&self) -> Signature {
        Signature::operator("verify_no_negatives")
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        tracing::info!("Verifying numeric columns for negative values");
        for (name, cells) in input.columns() {
            if !checks::is_numeric_column(cells) {
                continue;
            }
            let negative = labels_where(&input, name, |v| v.as_f64().is_some_and(|x| x < 0.0));
            if !negative.is_empty() {
                return Err(fail(AssayError::Integrity(format!(
                    "Found negative values in numeric column '{}' at rows {:?}.",
                    name, negative
                ))));
            }
        }
        tracing::info!("No negative values found");
        Ok(input.into_inner())
    }
}

/// Fails when any string cell is `""`.
#[derive(Debug, Clone, Default)]
pub struct VerifyNoEmptyStrings;

impl Operator for VerifyNoEmptyStrings {
    fn signature(&self) -> Signature {
        Signature::operator("verify_no_empty_strings")
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        for name in input.column_names() {
            let empty = labels_where(&input, name, |v| v.as_str() == Some(""));
            if !empty.is_empty() {
                return Err(fail(AssayError::Integrity(format!(
                    "Column '{}' contains empty strings at rows {:?}.",
                    name, empty
                ))));
            }
        }
        tracing::info!("No empty strings found");
        Ok(input.into_inner())
    }
}

/// Checks that the listed columns hold numbers only.
#[derive(Debug, Clone)]
pub struct CheckNumericColumns {
    columns: ColumnList,
}

impl CheckNumericColumns {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            columns: ColumnList::new(columns)?,
        })
    }
}

impl Operator for CheckNumericColumns {
    fn signature(&self) -> Signature {
        Signature::operator("check_numeric_columns").bind("columns_to_check", columns_param())
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        tracing::info!(columns = %self.columns, "Checking numeric columns");
        for column in self.columns.iter() {
            let cells = checks::present(&input, column, "check_numeric_columns")?;
            checks::non_empty(cells, column)?;
            checks::no_missing(&input, column)?;

            let sample: Vec<String> = cells
                .iter()
                .filter(|v| !v.is_numeric())
                .take(SAMPLE_SIZE)
                .map(Value::to_string)
                .collect();
            if !sample.is_empty() {
                return Err(fail(AssayError::Schema(format!(
                    "Column '{}' contains non-numeric data. Sample non-numeric values: [{}].",
                    column,
                    sample.join(", ")
                ))));
            }
        }
        tracing::info!(columns = %self.columns, "All columns are numeric");
        Ok(input.into_inner())
    }
}

/// Checks that the listed columns hold non-missing strings only.
#[derive(Debug, Clone)]
pub struct CheckStringColumns {
    columns: ColumnList,
}

impl CheckStringColumns {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            columns: ColumnList::new(columns)?,
        })
    }
}

impl Operator for CheckStringColumns {
    fn signature(&self) -> Signature {
        Signature::operator("check_string_columns").bind("columns_to_check", columns_param())
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        tracing::info!(columns = %self.columns, "Checking string columns");
        for column in self.columns.iter() {
            checks::string_column(&input, column, "check_string_columns")?;
        }
        tracing::info!(columns = %self.columns, "All columns hold strings");
        Ok(input.into_inner())
    }
}

/// Checks that every value of the listed columns matches a pattern.
#[derive(Debug, Clone)]
pub struct CheckColumnsSatisfyRegex {
    columns: ColumnList,
    pattern: RegexPattern,
}

impl CheckColumnsSatisfyRegex {
    pub fn new<I, S>(columns: I, pattern: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            columns: ColumnList::new(columns)?,
            pattern: RegexPattern::new(pattern)?,
        })
    }
}

impl Operator for CheckColumnsSatisfyRegex {
    fn signature(&self) -> Signature {
        Signature::operator("check_columns_satisfy_regex")
            .bind("columns_to_check", columns_param())
            .bind("regex_pattern", ParamKind::other("RegexPattern"))
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        tracing::info!(columns = %self.columns, pattern = %self.pattern, "Checking columns against regex");
        for column in self.columns.iter() {
            checks::string_column(&input, column, "check_columns_satisfy_regex")?;

            if let Some(cells) = input.labelled(column) {
                for (label, value) in cells {
                    let text = value.as_str().unwrap_or_default();
                    if !self.pattern.is_match(text) {
                        return Err(fail(AssayError::Integrity(format!(
                            "Column '{}', row {}: value '{}' does not satisfy the regex '{}'.",
                            column, label, text, self.pattern
                        ))));
                    }
                }
            }
            tracing::info!(column, "Column satisfies the regex");
        }
        Ok(input.into_inner())
    }
}

/// Checks that the listed columns hold lists of integers only.
#[derive(Debug, Clone)]
pub struct VerifyListColumnContainsOnlyInts {
    columns: ColumnList,
}

impl VerifyListColumnContainsOnlyInts {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            columns: ColumnList::new(columns)?,
        })
    }
}

impl Operator for VerifyListColumnContainsOnlyInts {
    fn signature(&self) -> Signature {
        Signature::operator("verify_list_column_contains_only_ints")
            .bind("columns_to_check", columns_param())
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        tracing::info!(columns = %self.columns, "Verifying columns hold lists of ints");
        for column in self.columns.iter() {
            let cells = checks::present(&input, column, "verify_list_column_contains_only_ints")?;
            if cells.is_empty() {
                tracing::warn!(column, "Column is empty, nothing to verify");
                continue;
            }

            if let Some(cells) = input.labelled(column) {
                for (label, cell) in cells {
                    check_int_list(column, label, cell)?;
                }
            }
            tracing::info!(column, "Column holds lists of ints");
        }
        Ok(input.into_inner())
    }
}

fn check_int_list(column: &str, label: usize, cell: &Value) -> Result<()> {
    if cell.is_missing() {
        return Err(fail(AssayError::Integrity(format!(
            "Column '{}' contains a missing value at row {}. Expected a list.",
            column, label
        ))));
    }
    let items = cell.as_list().ok_or_else(|| {
        fail(AssayError::Schema(format!(
            "Cell at row {} in column '{}' is not a list. Found type: {}.",
            label,
            column,
            cell.type_name()
        )))
    })?;
    for (position, element) in items.iter().enumerate() {
        if !matches!(element, Value::Int(_)) {
            return Err(fail(AssayError::Schema(format!(
                "Element at position {} within the list at row {}, column '{}' is not an integer. \
                 Found value: {} (type: {}).",
                position,
                label,
                column,
                element.repr(),
                element.type_name()
            ))));
        }
    }
    Ok(())
}
