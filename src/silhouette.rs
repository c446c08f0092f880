use crate::distance::euclidean;
use crate::error::ClusterError;
use crate::kmeans::{validate_input, Partition};
use ndarray::ArrayView2;
use rayon::prelude::*;

/// Per-item and per-cluster silhouette widths for one partition.
///
/// Widths are keyed by the same item and cluster indices as the partition
/// that was scored.
#[derive(Debug, Clone, PartialEq)]
pub struct SilhouetteReport {
    /// Silhouette width of each item, in [-1, 1]
    pub item_widths: Vec<f64>,

    /// Mean silhouette width of each cluster, indexed by cluster id
    pub cluster_means: Vec<f64>,

    /// Mean silhouette width over all items
    pub mean: f64,
}

/// Score a partition with the classical silhouette over Euclidean distance.
///
/// For item i in cluster c: `a(i)` is the mean distance to the other members
/// of c (0 for a singleton cluster), `b(i)` the smallest mean distance to any
/// other cluster, and `s(i) = (b - a) / max(a, b)` (0 when the denominator
/// is 0). With a single cluster every width is 0, as no other cluster
/// exists to compare against.
///
/// # Errors
///
/// * `InvalidInput` if the data is empty or contains non-finite values
/// * `InvalidPartition` if the partition does not match the data: wrong
///   assignment length, a cluster id outside `[0, k)`, an empty cluster,
///   or centroids of a different dimensionality
pub fn evaluate(
    data: &ArrayView2<f64>,
    partition: &Partition,
) -> Result<SilhouetteReport, ClusterError> {
    validate_input(data)?;

    let n_items = data.nrows();
    let k = partition.k();

    if partition.assignments.len() != n_items {
        return Err(ClusterError::InvalidPartition(format!(
            "partition assigns {} items but the data has {}",
            partition.assignments.len(),
            n_items
        )));
    }
    if k == 0 {
        return Err(ClusterError::InvalidPartition(
            "partition has no clusters".to_string(),
        ));
    }
    if partition.centroids.ncols() != data.ncols() {
        return Err(ClusterError::InvalidPartition(format!(
            "centroids have {} features but the data has {}",
            partition.centroids.ncols(),
            data.ncols()
        )));
    }
    if let Some((i, &c)) = partition
        .assignments
        .iter()
        .enumerate()
        .find(|(_, &c)| c >= k)
    {
        return Err(ClusterError::InvalidPartition(format!(
            "item {} is assigned to cluster {} but k = {}",
            i, c, k
        )));
    }

    let sizes = partition.cluster_sizes();
    if let Some(c) = sizes.iter().position(|&s| s == 0) {
        return Err(ClusterError::InvalidPartition(format!(
            "cluster {} has no members",
            c
        )));
    }

    let assignments = &partition.assignments;
    let item_widths: Vec<f64> = (0..n_items)
        .into_par_iter()
        .map(|i| {
            if k < 2 {
                return 0.0;
            }

            let own = assignments[i];
            let item = data.row(i);

            let mut sums = vec![0.0; k];
            for (j, other) in data.rows().into_iter().enumerate() {
                if j != i {
                    sums[assignments[j]] += euclidean(&item, &other);
                }
            }

            let a = if sizes[own] > 1 {
                sums[own] / (sizes[own] - 1) as f64
            } else {
                0.0
            };
            let b = sums
                .iter()
                .zip(sizes.iter())
                .enumerate()
                .filter(|(c, _)| *c != own)
                .map(|(_, (sum, &size))| sum / size as f64)
                .fold(f64::INFINITY, f64::min);

            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .collect();

    let mut cluster_sums = vec![0.0; k];
    for (&c, &s) in assignments.iter().zip(item_widths.iter()) {
        cluster_sums[c] += s;
    }
    let cluster_means: Vec<f64> = cluster_sums
        .iter()
        .zip(sizes.iter())
        .map(|(sum, &size)| sum / size as f64)
        .collect();

    let mean = item_widths.iter().sum::<f64>() / n_items as f64;

    Ok(SilhouetteReport {
        item_widths,
        cluster_means,
        mean,
    })
}
