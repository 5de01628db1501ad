//! Semantic deduplication benchmarks.
//!
//! Measures cosine distance computation, average-linkage clustering, and the
//! full operator over mock embeddings.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use assay::dedup::{AverageLinkage, Clusterer, cosine_distances};
use assay::embedding::MockEmbedder;
use assay::table::column;
use assay::{DedupConfig, NonEmptyTable, Operator, RemoveSemanticDuplicates, Table};

const DIMENSIONS: usize = 384;

const WORDS: &[&str] = &[
    "budget", "call", "grant", "project", "total", "euro", "amount", "funding", "partner",
    "consortium", "per", "the", "of", "for", "maximum", "minimum",
];

fn random_vectors(rng: &mut StdRng, count: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|_| (0..DIMENSIONS).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
        .collect()
}

fn random_sentence(rng: &mut StdRng) -> String {
    let len = rng.gen_range(3..10);
    (0..len)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_distances(c: &mut Criterion) {
    let mut group = c.benchmark_group("cosine_distances");
    let mut rng = StdRng::seed_from_u64(7);

    for size in [10, 50, 200] {
        let vectors = random_vectors(&mut rng, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &vectors, |b, v| {
            b.iter(|| cosine_distances(black_box(v)))
        });
    }
    group.finish();
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("average_linkage");
    let mut rng = StdRng::seed_from_u64(11);

    for size in [10, 50, 200] {
        let distances = cosine_distances(&random_vectors(&mut rng, size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &distances, |b, d| {
            b.iter(|| AverageLinkage.cluster(black_box(d), 0.8))
        });
    }
    group.finish();
}

fn bench_operator(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_semantic_duplicates");
    let mut rng = StdRng::seed_from_u64(13);

    for rows in [100, 500] {
        let docs: Vec<String> = (0..rows).map(|i| format!("P{}", i % 10)).collect();
        let values: Vec<i64> = (0..rows).map(|_| rng.gen_range(1..4) * 1000).collect();
        let texts: Vec<String> = (0..rows).map(|_| random_sentence(&mut rng)).collect();
        let table = NonEmptyTable::new(
            Table::from_columns(vec![
                ("document_id", column(docs)),
                ("value", column(values)),
                ("context", column(texts)),
            ])
            .unwrap(),
        )
        .unwrap();

        let config = DedupConfig::new()
            .with_groupby_columns(["document_id", "value"])
            .with_target_column("context")
            .with_threshold(0.5);
        let op = RemoveSemanticDuplicates::new(config, Box::new(MockEmbedder::default())).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, t| {
            b.iter(|| op.transform(black_box(t.clone())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_distances, bench_clustering, bench_operator);
criterion_main!(benches);
