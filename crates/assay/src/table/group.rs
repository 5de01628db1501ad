//! Row partitioning by grouping key.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::frame::Table;
use super::value::Value;

/// Projection of one or more column values for a row.
///
/// Ordered with [`Value::total_cmp`], so `Int(2)` and `Float(2.0)` fall into
/// the same group.
#[derive(Debug, Clone)]
pub struct GroupKey(pub Vec<Value>);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let ord = a.total_cmp(b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Value::repr).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Rows grouped by key.
#[derive(Debug, Clone)]
pub struct Partitions {
    /// Groups in ascending key order, each holding row positions in table order.
    pub groups: Vec<(GroupKey, Vec<usize>)>,
    /// Row positions whose key contained a missing cell.
    pub dropped: Vec<usize>,
}

/// Partition rows by the values of `columns`.
///
/// Every column must exist; callers check presence first. Rows whose key has a
/// missing cell are set aside in `dropped`.
pub fn partition(table: &Table, columns: &[&str]) -> Partitions {
    let cells: Vec<&[Value]> = columns.iter().filter_map(|c| table.column(c)).collect();
    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    let mut dropped = Vec::new();

    for row in 0..table.row_count() {
        let key: Vec<Value> = cells.iter().map(|col| col[row].clone()).collect();
        if key.iter().any(Value::is_missing) {
            dropped.push(row);
            continue;
        }
        groups.entry(GroupKey(key)).or_default().push(row);
    }

    Partitions {
        groups: groups.into_iter().collect(),
        dropped,
    }
}
