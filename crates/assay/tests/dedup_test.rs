//! Integration tests for semantic deduplication.

use assay::dedup::{AverageLinkage, Clusterer, DistanceMatrix};
use assay::embedding::{Embedder, MockEmbedder};
use assay::table::column;
use assay::{
    AssayError, DedupConfig, ErrorKind, MockLoader, NonEmptyTable, Operator, Pipeline, PipelineSpec,
    RemoveSemanticDuplicates, Result, Table, TieBreak, Value,
};

fn money_rows() -> Table {
    Table::from_columns(vec![
        ("document_id", column(["P1", "P1", "P1", "P2", "P2"])),
        ("value", column([5000, 5000, 5000, 5000, 70])),
        (
            "context",
            column([
                "total budget of the call",
                "the total budget of the call is",
                "grant per project",
                "total budget of the call",
                "total budget of the call",
            ]),
        ),
    ])
    .unwrap()
}

fn operator(threshold: f64) -> RemoveSemanticDuplicates {
    let config = DedupConfig::new()
        .with_groupby_columns(["document_id", "value"])
        .with_target_column("context")
        .with_threshold(threshold);
    RemoveSemanticDuplicates::new(config, Box::new(MockEmbedder::default())).unwrap()
}

#[test]
fn test_near_duplicates_collapse_to_longest() {
    let out = operator(0.5)
        .transform(NonEmptyTable::new(money_rows()).unwrap())
        .unwrap();

    // P1/5000 keeps the long budget sentence and the grant sentence; P2 groups stay apart.
    assert_eq!(out.row_count(), 4);
    assert_eq!(out.index(), &[0, 1, 2, 3]);
    assert_eq!(
        out.column("context").unwrap(),
        column([
            "the total budget of the call is",
            "grant per project",
            "total budget of the call",
            "total budget of the call",
        ])
        .as_slice()
    );
    assert_eq!(out.column("value").unwrap(), column([5000, 5000, 70, 5000]).as_slice());
}

#[test]
fn test_groups_never_merge_across_keys() {
    let out = operator(2.0)
        .transform(NonEmptyTable::new(money_rows()).unwrap())
        .unwrap();
    // Even the loosest threshold only collapses within (document_id, value).
    assert_eq!(out.row_count(), 3);
}

#[test]
fn test_zero_threshold_never_merges() {
    let out = operator(0.0)
        .transform(NonEmptyTable::new(money_rows()).unwrap())
        .unwrap();
    assert_eq!(out.row_count(), 5);
}

#[test]
fn test_identical_texts_keep_distinct_rows_without_merging() {
    let input = Table::from_columns(vec![
        ("g", column([1, 1])),
        ("s", column(["same text", "same text"])),
        ("n", column([1, 2])),
    ])
    .unwrap();
    let config = DedupConfig::new()
        .with_groupby_columns(["g"])
        .with_target_column("s")
        .with_threshold(0.0);
    let out = RemoveSemanticDuplicates::new(config, Box::new(MockEmbedder::default()))
        .unwrap()
        .transform(NonEmptyTable::new(input).unwrap())
        .unwrap();
    assert_eq!(out.column("n").unwrap(), column([1, 2]).as_slice());
}

#[test]
fn test_missing_group_keys_are_dropped() {
    let input = Table::from_columns(vec![
        ("g", vec![Value::from("a"), Value::Null]),
        ("s", column(["one", "two"])),
    ])
    .unwrap();
    let config = DedupConfig::new().with_groupby_columns(["g"]).with_target_column("s");
    let out = RemoveSemanticDuplicates::new(config, Box::new(MockEmbedder::default()))
        .unwrap()
        .transform(NonEmptyTable::new(input).unwrap())
        .unwrap();
    assert_eq!(out.column("s").unwrap(), column(["one"]).as_slice());
}

#[test]
fn test_non_string_target_is_schema_error() {
    let input = Table::from_columns(vec![("g", column([1, 1])), ("s", column([1, 2]))]).unwrap();
    let config = DedupConfig::new().with_groupby_columns(["g"]).with_target_column("s");
    let err = RemoveSemanticDuplicates::new(config, Box::new(MockEmbedder::default()))
        .unwrap()
        .transform(NonEmptyTable::new(input).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

/// Clusterer that always fails, to check error surfacing.
struct BrokenClusterer;

impl Clusterer for BrokenClusterer {
    fn cluster(&self, _distances: &DistanceMatrix, _threshold: f64) -> Result<Vec<usize>> {
        Err(AssayError::Runtime("linkage exploded".to_string()))
    }
}

#[test]
fn test_clustering_failure_is_runtime_error_naming_model() {
    let err = operator(0.5)
        .with_clusterer(BrokenClusterer)
        .transform(NonEmptyTable::new(money_rows()).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    let message = err.to_string();
    assert!(message.contains("all-mpnet-base-v2"));
    assert!(message.contains("linkage exploded"));
}

#[test]
fn test_tie_break_last() {
    let input = Table::from_columns(vec![
        ("g", column(["x", "x", "x"])),
        ("s", column(["red apple", "apple red", "green pear"])),
    ])
    .unwrap();
    let config = DedupConfig::new()
        .with_groupby_columns(["g"])
        .with_target_column("s")
        .with_tie_break(TieBreak::Last);
    let out = RemoveSemanticDuplicates::new(config, Box::new(MockEmbedder::default()))
        .unwrap()
        .transform(NonEmptyTable::new(input).unwrap())
        .unwrap();
    assert_eq!(out.column("s").unwrap(), column(["apple red", "green pear"]).as_slice());
}

#[test]
fn test_average_linkage_with_mock_embeddings() {
    let embedder = MockEmbedder::default();
    let texts: Vec<String> = ["budget call", "call budget", "partner list"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let vectors = embedder.embed_batch(&texts).unwrap();
    let distances = assay::dedup::cosine_distances(&vectors).unwrap();
    let labels = AverageLinkage.cluster(&distances, 0.5).unwrap();
    assert_eq!(labels[0], labels[1]);
    assert_ne!(labels[0], labels[2]);
}

#[test]
fn test_money_preset_end_to_end_with_mock_embeddings() {
    let input = Table::from_columns(vec![
        ("value", column([5000.0, 5000.0, 0.0, 300.0])),
        ("currency", column(["EUR", "eur", "EUR", "USD"])),
        (
            "context",
            column([
                "budget of the call",
                "the budget of the call",
                "budget of the call",
                "grant amount",
            ]),
        ),
        (
            "original_sentence",
            column([
                "The call budget is 5000 EUR",
                "The budget of the call is EUR 5000",
                "0 EUR",
                "300 USD grant",
            ]),
        ),
        ("document_id", column(["P1", "P1", "P1", "P1"])),
    ])
    .unwrap();

    let pipeline: Pipeline = PipelineSpec::money().build(&MockLoader::new()).unwrap();
    let out = pipeline.run(input).unwrap();
    assert_eq!(out.row_count(), 1);
    assert_eq!(out.get(0, "context"), Some(&Value::from("the budget of the call")));
}

#[test]
fn test_unavailable_model_fails_pipeline_build_as_configuration() {
    let loader = MockLoader::new().with_missing(assay::embedding::DEFAULT_MODEL);
    let err = PipelineSpec::money().build(&loader).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(matches!(err, AssayError::ModelLoad { .. }));
    assert!(err.to_string().contains("all-mpnet-base-v2"));
}
