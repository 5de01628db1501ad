//! Property-based tests for the cleaning operators.
//!
//! These tests use proptest to generate random tables and check that the
//! operators keep their invariants for every input.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p assay --test property_tests
//!
//! # More cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p assay --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use assay::dedup::{AverageLinkage, Clusterer, cosine_distances};
use assay::embedding::MockEmbedder;
use assay::transform::{
    DropRowsIfNoColumnMatchesRegex, DropRowsNotSatisfyingRegex, DropRowsWithNonPositiveValues,
    ReduceListIntsToUnique,
};
use assay::{DedupConfig, NonEmptyTable, Operator, Pipeline, RemoveSemanticDuplicates, Table, Value};

// =============================================================================
// Test Strategies
// =============================================================================

/// Lowercase words, sometimes containing the letter `a`.
fn word() -> impl Strategy<Value = String> {
    "[a-e]{1,6}"
}

/// List cells, some of them missing.
fn int_lists() -> impl Strategy<Value = Vec<Option<Vec<i64>>>> {
    prop::collection::vec(prop::option::of(prop::collection::vec(-3i64..4, 0..6)), 1..20)
}

fn non_empty(columns: Vec<(&str, Vec<Value>)>) -> NonEmptyTable {
    NonEmptyTable::new(Table::from_columns(columns).unwrap()).unwrap()
}

// =============================================================================
// Pipeline
// =============================================================================

proptest! {
    /// An empty pipeline hands its input back unchanged.
    #[test]
    fn empty_pipeline_is_identity(values in prop::collection::vec(-100i64..100, 1..30)) {
        let table = Table::from_columns(vec![("v", values.into_iter().map(Value::Int).collect())]).unwrap();
        let pipeline = Pipeline::new(Vec::new()).unwrap();
        prop_assert_eq!(pipeline.run(table.clone()).unwrap(), table);
    }
}

// =============================================================================
// Row filters
// =============================================================================

proptest! {
    /// Exactly the rows with a positive value survive, with their labels.
    #[test]
    fn non_positive_filter_is_exact(values in prop::collection::vec(-50i64..50, 1..40)) {
        let input = non_empty(vec![("v", values.iter().copied().map(Value::Int).collect())]);
        let out = DropRowsWithNonPositiveValues::new(["v"]).unwrap().transform(input).unwrap();

        let expected: Vec<usize> = (0..values.len()).filter(|&i| values[i] > 0).collect();
        prop_assert_eq!(out.index(), expected.as_slice());
        for cell in out.column("v").unwrap() {
            prop_assert!(cell.as_f64().unwrap() > 0.0);
        }
    }

    /// AND keeps rows where both columns match; OR keeps rows where either does.
    #[test]
    fn regex_and_or_semantics(rows in prop::collection::vec((word(), word()), 1..30)) {
        let left: Vec<Value> = rows.iter().map(|(l, _)| Value::from(l.as_str())).collect();
        let right: Vec<Value> = rows.iter().map(|(_, r)| Value::from(r.as_str())).collect();
        let input = non_empty(vec![("l", left), ("r", right)]);

        let all = DropRowsNotSatisfyingRegex::new(["l", "r"], "a").unwrap()
            .transform(input.clone()).unwrap();
        let any = DropRowsIfNoColumnMatchesRegex::new(["l", "r"], "A").unwrap()
            .transform(input).unwrap();

        let both: Vec<usize> = (0..rows.len())
            .filter(|&i| rows[i].0.contains('a') && rows[i].1.contains('a'))
            .collect();
        let either: Vec<usize> = (0..rows.len())
            .filter(|&i| rows[i].0.contains('a') || rows[i].1.contains('a'))
            .collect();
        prop_assert_eq!(all.index(), both.as_slice());
        prop_assert_eq!(any.index(), either.as_slice());
    }
}

// =============================================================================
// List reduction
// =============================================================================

proptest! {
    /// Reducing twice gives the same table as reducing once.
    #[test]
    fn reduce_is_idempotent(lists in int_lists()) {
        let cells: Vec<Value> = lists.into_iter().map(Value::from).collect();
        let input = non_empty(vec![("min_entities", cells)]);
        let op = ReduceListIntsToUnique::default();

        let once = op.transform(input).unwrap();
        let twice = op.transform(NonEmptyTable::new(once.clone()).unwrap()).unwrap();
        prop_assert_eq!(&once, &twice);

        for cell in once.column("min_entities").unwrap() {
            let Some(items) = cell.as_list() else {
                prop_assert!(cell.is_missing());
                continue;
            };
            let distinct: HashSet<String> = items.iter().map(Value::to_string).collect();
            prop_assert_eq!(distinct.len(), items.len());
        }
    }
}

// =============================================================================
// Deduplication
// =============================================================================

proptest! {
    /// Clustering labels are dense and every item gets one.
    #[test]
    fn cluster_labels_are_dense(
        texts in prop::collection::vec("[a-d]{1,4}( [a-d]{1,4}){0,3}", 1..12),
        threshold in 0.0f64..1.5,
    ) {
        let embedder = MockEmbedder::default();
        let vectors: Vec<Vec<f32>> = texts.iter().map(|t| assay::Embedder::embed(&embedder, t).unwrap()).collect();
        let distances = cosine_distances(&vectors).unwrap();
        let labels = AverageLinkage.cluster(&distances, threshold).unwrap();

        prop_assert_eq!(labels.len(), texts.len());
        let distinct: HashSet<usize> = labels.iter().copied().collect();
        let max = labels.iter().copied().max().unwrap();
        prop_assert_eq!(distinct.len(), max + 1);
    }

    /// Deduplication never adds rows and keeps at least one row per group.
    #[test]
    fn dedup_shrinks_within_bounds(
        rows in prop::collection::vec((0i64..3, "[a-d]{1,4}( [a-d]{1,4}){0,2}"), 1..20),
        threshold in 0.0f64..1.5,
    ) {
        let groups: Vec<Value> = rows.iter().map(|(g, _)| Value::Int(*g)).collect();
        let texts: Vec<Value> = rows.iter().map(|(_, t)| Value::from(t.as_str())).collect();
        let input = non_empty(vec![("g", groups), ("s", texts)]);

        let config = DedupConfig::new()
            .with_groupby_columns(["g"])
            .with_target_column("s")
            .with_threshold(threshold);
        let out = RemoveSemanticDuplicates::new(config, Box::new(MockEmbedder::default()))
            .unwrap()
            .transform(input)
            .unwrap();

        let group_count = rows.iter().map(|(g, _)| *g).collect::<HashSet<_>>().len();
        prop_assert!(out.row_count() <= rows.len());
        prop_assert!(out.row_count() >= group_count);
        let expected: Vec<usize> = (0..out.row_count()).collect();
        prop_assert_eq!(out.index(), expected.as_slice());
    }
}
