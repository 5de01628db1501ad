//! Distance matrices and agglomerative clustering.

use crate::error::{AssayError, Result};

/// Symmetric pairwise distance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// An all-zero `size x size` matrix.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.size + j]
    }

    /// Set both `(i, j)` and `(j, i)`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.size + j] = value;
        self.data[j * self.size + i] = value;
    }
}

/// Pairwise cosine distances (`1 - cos`).
///
/// A zero vector is at distance 1 from everything, itself included.
pub fn cosine_distances(embeddings: &[Vec<f32>]) -> Result<DistanceMatrix> {
    let n = embeddings.len();
    if let Some(first) = embeddings.first() {
        if let Some(bad) = embeddings.iter().position(|e| e.len() != first.len()) {
            return Err(AssayError::Runtime(format!(
                "embedding {} has {} dimensions, expected {}",
                bad,
                embeddings[bad].len(),
                first.len()
            )));
        }
    }

    let norms: Vec<f64> = embeddings
        .iter()
        .map(|e| e.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt())
        .collect();

    let mut matrix = DistanceMatrix::zeros(n);
    for i in 0..n {
        for j in i..n {
            let distance = if norms[i] == 0.0 || norms[j] == 0.0 {
                1.0
            } else if i == j {
                0.0
            } else {
                let dot: f64 = embeddings[i]
                    .iter()
                    .zip(&embeddings[j])
                    .map(|(a, b)| f64::from(*a) * f64::from(*b))
                    .sum();
                (1.0 - dot / (norms[i] * norms[j])).max(0.0)
            };
            if !distance.is_finite() {
                return Err(AssayError::Runtime(format!(
                    "non-finite distance between items {} and {}",
                    i, j
                )));
            }
            matrix.set(i, j, distance);
        }
    }
    Ok(matrix)
}

/// Assigns a cluster label to each item of a distance matrix.
pub trait Clusterer: Send + Sync {
    /// Labels are dense, `0..k`, numbered by first member in item order.
    fn cluster(&self, distances: &DistanceMatrix, threshold: f64) -> Result<Vec<usize>>;
}

/// Average-linkage agglomerative clustering without a fixed cluster count.
///
/// Repeatedly merges the two clusters with the smallest mean pairwise
/// distance while that distance is strictly below the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageLinkage;

impl Clusterer for AverageLinkage {
    fn cluster(&self, distances: &DistanceMatrix, threshold: f64) -> Result<Vec<usize>> {
        let n = distances.len();
        if threshold.is_nan() {
            return Err(AssayError::Runtime("distance threshold is NaN".to_string()));
        }

        // Active clusters: members plus the current linkage to every other cluster.
        let mut members: Vec<Option<Vec<usize>>> = (0..n).map(|i| Some(vec![i])).collect();
        let mut linkage = distances.clone();

        loop {
            let mut best: Option<(usize, usize, f64)> = None;
            for a in 0..n {
                if members[a].is_none() {
                    continue;
                }
                for b in (a + 1)..n {
                    if members[b].is_none() {
                        continue;
                    }
                    let d = linkage.get(a, b);
                    if best.is_none_or(|(_, _, current)| d < current) {
                        best = Some((a, b, d));
                    }
                }
            }

            let Some((a, b, d)) = best else { break };
            if d >= threshold {
                break;
            }

            let (size_a, size_b) = (
                members[a].as_ref().map_or(0, Vec::len) as f64,
                members[b].as_ref().map_or(0, Vec::len) as f64,
            );
            for k in 0..n {
                if k == a || k == b || members[k].is_none() {
                    continue;
                }
                let merged = (size_a * linkage.get(a, k) + size_b * linkage.get(b, k)) / (size_a + size_b);
                linkage.set(a, k, merged);
            }
            let absorbed = members[b].take().unwrap_or_default();
            if let Some(target) = members[a].as_mut() {
                target.extend(absorbed);
            }
        }

        let mut labels = vec![0usize; n];
        let mut clusters: Vec<Vec<usize>> = members.into_iter().flatten().collect();
        clusters.sort_by_key(|c| c.iter().copied().min().unwrap_or(usize::MAX));
        for (label, cluster) in clusters.iter().enumerate() {
            for &item in cluster {
                labels[item] = label;
            }
        }
        Ok(labels)
    }
}
