//! Filtering and restructuring operators.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::args::{ColumnList, RegexPattern};
use crate::error::{AssayError, Result};
use crate::pipeline::{Operator, ParamKind, Signature};
use crate::table::{NonEmptyTable, Table, Value, partition};
use crate::validation::checks::{self, fail, labels_where};

/// Drop every row whose value fails the pattern in at least one checked column.
#[derive(Debug, Clone)]
pub struct DropRowsNotSatisfyingRegex {
    columns: ColumnList,
    pattern: RegexPattern,
}

impl DropRowsNotSatisfyingRegex {
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

impl Operator for DropRowsNotSatisfyingRegex {
    fn signature(&self) -> Signature {
        Signature::operator("drop_rows_not_satisfying_regex")
            .bind("columns_to_check", ParamKind::other("ColumnList"))
            .bind("regex_pattern", ParamKind::other("RegexPattern"))
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        tracing::info!(columns = %self.columns, pattern = %self.pattern, "Dropping rows not satisfying regex");
        let mut to_drop: HashSet<usize> = HashSet::new();

        for column in self.columns.iter() {
            checks::string_column(&input, column, "drop_rows_not_satisfying_regex")?;
            let failing = labels_where(&input, column, |v| {
                !v.as_str().is_some_and(|s| self.pattern.is_match(s))
            });
            if !failing.is_empty() {
                tracing::debug!(column, rows = ?failing, "Rows fail the regex");
            }
            to_drop.extend(failing);
        }

        let before = input.row_count();
        let output = input.drop_labels(&to_drop);
        log_dropped(before, output.row_count());
        Ok(output)
    }
}

/// Keep a row when at least one checked column holds a string matching the pattern.
///
/// Missing and non-string cells do not count as matches.
#[derive(Debug, Clone)]
pub struct DropRowsIfNoColumnMatchesRegex {
    columns: ColumnList,
    pattern: RegexPattern,
}

impl DropRowsIfNoColumnMatchesRegex {
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

impl Operator for DropRowsIfNoColumnMatchesRegex {
    fn signature(&self) -> Signature {
        Signature::operator("drop_rows_if_no_column_matches_regex")
            .bind("columns_to_check", ParamKind::other("ColumnList"))
            .bind("regex_pattern", ParamKind::other("RegexPattern"))
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        tracing::info!(columns = %self.columns, pattern = %self.pattern, "Keeping rows where any column matches regex");
        let mut checked: Vec<&[Value]> = Vec::new();
        for column in self.columns.iter() {
            let cells = checks::present(&input, column, "drop_rows_if_no_column_matches_regex")?;
            if cells.is_empty() {
                tracing::warn!(column, "Column is empty, skipping");
                continue;
            }
            checked.push(cells);
        }

        let keep: Vec<usize> = (0..input.row_count())
            .filter(|&row| {
                checked.iter().any(|cells| {
                    cells[row]
                        .as_str()
                        .is_some_and(|s| self.pattern.is_match(s))
                })
            })
            .collect();

        let before = input.row_count();
        let output = input.take_rows(&keep);
        log_dropped(before, output.row_count());
        Ok(output)
    }
}

/// Drop rows holding a value `<= 0` in any checked column.
#[derive(Debug, Clone)]
pub struct DropRowsWithNonPositiveValues {
    columns: ColumnList,
}

impl DropRowsWithNonPositiveValues {
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

impl Operator for DropRowsWithNonPositiveValues {
    fn signature(&self) -> Signature {
        Signature::operator("drop_rows_with_non_positive_values")
            .bind("columns_to_check", ParamKind::other("ColumnList"))
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        tracing::info!(columns = %self.columns, "Dropping rows with non-positive values");
        let mut to_drop: HashSet<usize> = HashSet::new();

        for column in self.columns.iter() {
            let cells = checks::present(&input, column, "drop_rows_with_non_positive_values")?;
            if cells.is_empty() {
                tracing::warn!(column, "Column is empty, skipping");
                continue;
            }
            checks::no_missing(&input, column)?;

            let non_numeric = labels_where(&input, column, |v| !v.is_numeric());
            if !non_numeric.is_empty() {
                return Err(fail(AssayError::Schema(format!(
                    "Column '{}' contains non-numeric values at rows {:?}.",
                    column, non_numeric
                ))));
            }

            let non_positive = labels_where(&input, column, |v| v.as_f64().is_some_and(|x| x <= 0.0));
            if !non_positive.is_empty() {
                tracing::debug!(column, rows = ?non_positive, "Rows hold non-positive values");
            }
            to_drop.extend(non_positive);
        }

        let before = input.row_count();
        let output = input.drop_labels(&to_drop);
        log_dropped(before, output.row_count());
        Ok(output)
    }
}

/// Reduce each list in a column to its unique elements, keeping first occurrences.
#[derive(Debug, Clone)]
pub struct ReduceListIntsToUnique {
    target_column: String,
}

impl ReduceListIntsToUnique {
    pub const DEFAULT_COLUMN: &'static str = "min_entities";

    pub fn new(target_column: impl Into<String>) -> Result<Self> {
        let target_column = target_column.into();
        if target_column.trim().is_empty() {
            return Err(AssayError::Config(
                "target_column must be a non-empty string".to_string(),
            ));
        }
        Ok(Self { target_column })
    }
}

impl Default for ReduceListIntsToUnique {
    fn default() -> Self {
        Self {
            target_column: Self::DEFAULT_COLUMN.to_string(),
        }
    }
}

impl Operator for ReduceListIntsToUnique {
    fn signature(&self) -> Signature {
        Signature::operator("reduce_list_ints_to_unique")
            .bind("target_column", ParamKind::other("String"))
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        let column = self.target_column.as_str();
        tracing::info!(column, "Reducing lists to unique values");
        let cells = checks::present(&input, column, "reduce_list_ints_to_unique")?;

        let reduced = cells
            .iter()
            .map(|cell| match cell {
                c if c.is_missing() => Ok(c.clone()),
                Value::List(items) => Ok(Value::List(unique_in_order(items))),
                other => Err(fail(AssayError::Schema(format!(
                    "Value in column '{}' must be a list or missing. Found: {} (type: {}).",
                    column,
                    other.repr(),
                    other.type_name()
                )))),
            })
            .collect::<Result<Vec<_>>>()?;

        let mut output = input.into_inner();
        output.insert_column(column, reduced)?;
        tracing::info!(column, "Reduction complete");
        Ok(output)
    }
}

fn unique_in_order(items: &[Value]) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.iter().any(|u| u.total_cmp(item) == Ordering::Equal) {
            unique.push(item.clone());
        }
    }
    unique
}

/// Collapse rows to one per document, stacking the target values into a list.
#[derive(Debug, Clone)]
pub struct GroupByDocumentAndStackTypes {
    target_column: String,
    document_id_column: String,
    min_entities_column: String,
}

impl GroupByDocumentAndStackTypes {
    pub const DEFAULT_DOCUMENT_ID: &'static str = "document_id";
    pub const DEFAULT_MIN_ENTITIES: &'static str = "min_entities";

    pub fn new(target_column: impl Into<String>) -> Result<Self> {
        let target_column = target_column.into();
        if target_column.trim().is_empty() {
            return Err(AssayError::Config(
                "target_column must be a non-empty string".to_string(),
            ));
        }
        Ok(Self {
            target_column,
            document_id_column: Self::DEFAULT_DOCUMENT_ID.to_string(),
            min_entities_column: Self::DEFAULT_MIN_ENTITIES.to_string(),
        })
    }

    pub fn with_document_id_column(mut self, column: impl Into<String>) -> Self {
        self.document_id_column = column.into();
        self
    }

    pub fn with_min_entities_column(mut self, column: impl Into<String>) -> Self {
        self.min_entities_column = column.into();
        self
    }
}

impl Operator for GroupByDocumentAndStackTypes {
    fn signature(&self) -> Signature {
        Signature::operator("group_by_document_and_stack_types")
            .bind("target_column", ParamKind::other("String"))
            .bind("document_id_column", ParamKind::other("String"))
            .bind("min_entities_column", ParamKind::other("String"))
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        let doc_col = self.document_id_column.as_str();
        let target_col = self.target_column.as_str();
        let min_col = self.min_entities_column.as_str();
        tracing::info!(
            document = doc_col,
            target = target_col,
            min_entities = min_col,
            "Grouping by document and stacking values"
        );

        let mut required = Vec::with_capacity(3);
        for column in [doc_col, target_col, min_col] {
            required.push(checks::present(&input, column, "group_by_document_and_stack_types")?);
        }
        let (targets, mins) = (required[1], required[2]);

        let parts = partition(&input, &[doc_col]);
        if !parts.dropped.is_empty() {
            tracing::warn!(
                rows = parts.dropped.len(),
                "Dropping rows with a missing document id"
            );
        }

        let mut doc_ids = Vec::with_capacity(parts.groups.len());
        let mut stacked = Vec::with_capacity(parts.groups.len());
        let mut min_entities = Vec::with_capacity(parts.groups.len());
        for (key, rows) in parts.groups {
            let mut values: Vec<String> = Vec::new();
            for &row in &rows {
                let text = targets[row].to_string();
                if !values.contains(&text) {
                    values.push(text);
                }
            }
            let first_min = rows
                .iter()
                .map(|&row| &mins[row])
                .find(|v| !v.is_missing())
                .cloned()
                .unwrap_or(Value::Null);

            doc_ids.push(key.0.into_iter().next().unwrap_or(Value::Null));
            stacked.push(Value::from(values));
            min_entities.push(first_min);
        }

        let output = Table::from_columns(vec![
            (doc_col, doc_ids),
            (target_col, stacked),
            (min_col, min_entities),
        ])?;
        tracing::info!(
            before = input.row_count(),
            after = output.row_count(),
            "Grouping complete"
        );
        Ok(output)
    }
}

fn log_dropped(before: usize, after: usize) {
    if before == after {
        tracing::info!(rows = after, "No rows dropped");
    } else {
        tracing::info!(dropped = before - after, rows = after, "Dropped rows");
    }
}
