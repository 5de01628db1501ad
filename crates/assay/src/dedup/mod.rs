//! Semantic deduplication: group, embed, cluster, keep the longest text.

mod cluster;
mod engine;

pub use cluster::{AverageLinkage, Clusterer, DistanceMatrix, cosine_distances};
pub use engine::{DedupConfig, RemoveSemanticDuplicates, TieBreak};
