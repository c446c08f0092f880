use crate::config::ClusterConfig;
use crate::distance::{compute_wcss, nearest_centroid, squared_euclidean};
use crate::error::ClusterError;
use ndarray::{Array2, ArrayView2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Stream id for fits on the observed data. Reference fits use the
/// 1-based reference index instead, so their RNG streams never collide.
pub(crate) const REAL_DATA: u64 = 0;

/// Result of one k-means fit: an assignment of every item to a cluster id
/// in `[0, k)`, the k centroids, and the achieved WCSS.
///
/// A returned partition is never degenerate: every cluster id in `[0, k)`
/// has at least one member. Empty clusters arising mid-run are reseeded to
/// the item farthest from its own centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Cluster id for each item, in item order
    pub assignments: Vec<usize>,

    /// Cluster centroids, one row per cluster id
    pub centroids: Array2<f64>,

    /// Within-cluster sum of squares achieved by this partition
    pub wcss: f64,

    /// Iterations used by the winning restart
    pub n_iterations: usize,

    /// False if the winning restart hit the iteration cap before its
    /// assignments stabilized. The partition is still the best one found.
    pub converged: bool,
}

impl Partition {
    /// Number of clusters
    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }

    /// Indices of the items assigned to a cluster
    pub fn cluster_members(&self, cluster: usize) -> Vec<usize> {
        self.assignments
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == cluster)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of items assigned to each cluster, indexed by cluster id
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &c in &self.assignments {
            sizes[c] += 1;
        }
        sizes
    }
}

/// Derive an independent RNG seed from the global seed and a stream label.
///
/// Splitmix-style mixing of (k, source, trial) keeps every restart's stream
/// disjoint and makes results identical regardless of execution order or
/// worker count. Trial streams always have `a = k >= 1`; `a = 0` is reserved
/// for reference-dataset generation.
pub(crate) fn derive_seed(seed: u64, a: u64, b: u64, c: u64) -> u64 {
    let mut x = seed ^ 0x9E37_79B9_7F4A_7C15;
    for w in [a, b, c] {
        x = x.wrapping_add(w).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        x ^= x >> 27;
        x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
        x ^= x >> 31;
    }
    x
}

/// Reject empty or non-finite feature matrices at the entry-point boundary
pub(crate) fn validate_input(data: &ArrayView2<f64>) -> Result<(), ClusterError> {
    if data.nrows() == 0 {
        return Err(ClusterError::InvalidInput(
            "feature matrix has no rows".to_string(),
        ));
    }
    if data.ncols() == 0 {
        return Err(ClusterError::InvalidInput(
            "feature matrix has no columns".to_string(),
        ));
    }
    if let Some(((i, j), v)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ClusterError::InvalidInput(format!(
            "non-finite value {} at row {}, column {}",
            v, i, j
        )));
    }
    Ok(())
}

/// Fit a k-means partition with `config.n_starts` random restarts.
///
/// Each restart seeds k centroids by sampling distinct items uniformly at
/// random, then runs Lloyd iteration until no assignment changes or
/// `config.max_iters` is reached. The restart with the lowest WCSS wins,
/// ties broken by the earliest restart index.
///
/// # Errors
///
/// * `InvalidInput` if the data is empty or contains non-finite values
/// * `InvalidK` if `k < 1` or `k > n_items`
pub fn fit(
    data: &ArrayView2<f64>,
    k: usize,
    config: &ClusterConfig,
) -> Result<Partition, ClusterError> {
    validate_input(data)?;

    let n_items = data.nrows();
    if k < 1 || k > n_items {
        return Err(ClusterError::InvalidK { k, n_items });
    }

    Ok(fit_unchecked(data, k, REAL_DATA, config))
}

/// Multi-start fit with validation already done by the caller.
///
/// `source` labels the RNG stream: `REAL_DATA` for the observed data, the
/// 1-based reference index for gap-statistic reference fits.
pub(crate) fn fit_unchecked(
    data: &ArrayView2<f64>,
    k: usize,
    source: u64,
    config: &ClusterConfig,
) -> Partition {
    let n_starts = config.n_starts.max(1);

    let (_, best) = (0..n_starts)
        .into_par_iter()
        .map(|trial| {
            let seed = derive_seed(config.seed, k as u64, source, trial as u64);
            (trial, lloyd_single(data, k, seed, config))
        })
        .reduce_with(|a, b| {
            // lexicographic min over (wcss, trial); commutative, so the
            // merge order across workers never changes the winner
            if b.1.wcss < a.1.wcss || (b.1.wcss == a.1.wcss && b.0 < a.0) {
                b
            } else {
                a
            }
        })
        .expect("at least one restart");

    if config.verbose {
        eprintln!(
            "k = {}: best of {} starts, wcss = {:.6}, {} iterations{}",
            k,
            n_starts,
            best.wcss,
            best.n_iterations,
            if best.converged { "" } else { " (not converged)" }
        );
    }

    best
}

/// One Lloyd run from a seeded random initialization
fn lloyd_single(data: &ArrayView2<f64>, k: usize, seed: u64, config: &ClusterConfig) -> Partition {
    let n_items = data.nrows();
    let n_features = data.ncols();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut centroids = initialize_centroids(data, k, &mut rng);

    // usize::MAX forces every item to register as changed on the first pass
    let mut assignments = vec![usize::MAX; n_items];
    let mut n_iterations = 0;
    let mut converged = false;

    for _ in 0..config.max_iters {
        n_iterations += 1;

        // Assignment step; ties resolve to the lowest cluster id
        let mut changed = false;
        for (i, item) in data.rows().into_iter().enumerate() {
            let (c, _) = nearest_centroid(&item, &centroids.view());
            if assignments[i] != c {
                assignments[i] = c;
                changed = true;
            }
        }

        // Update step: centroid = mean of assigned items
        let mut sums: Array2<f64> = Array2::zeros((k, n_features));
        let mut counts = vec![0usize; k];
        for (item, &c) in data.rows().into_iter().zip(assignments.iter()) {
            counts[c] += 1;
            for (j, v) in item.iter().enumerate() {
                sums[[c, j]] += v;
            }
        }

        let mut empty_clusters = Vec::new();
        for c in 0..k {
            if counts[c] > 0 {
                for j in 0..n_features {
                    centroids[[c, j]] = sums[[c, j]] / counts[c] as f64;
                }
            } else {
                empty_clusters.push(c);
            }
        }

        if !empty_clusters.is_empty() {
            reseed_empty_clusters(
                data,
                &mut assignments,
                &mut counts,
                &mut centroids,
                &empty_clusters,
            );
            changed = true;

            if config.verbose {
                eprintln!("  reseeded {} empty clusters", empty_clusters.len());
            }
        }

        if !changed {
            converged = true;
            break;
        }
    }

    let wcss = compute_wcss(data, &assignments, &centroids.view());

    Partition {
        assignments,
        centroids,
        wcss,
        n_iterations,
        converged,
    }
}

/// Initialize centroids by sampling k distinct items uniformly at random
fn initialize_centroids(data: &ArrayView2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
    let indices: Vec<usize> = (0..data.nrows()).collect();
    let selected: Vec<usize> = indices.choose_multiple(rng, k).cloned().collect();

    let mut centroids = Array2::zeros((k, data.ncols()));
    for (c, &i) in selected.iter().enumerate() {
        centroids.row_mut(c).assign(&data.row(i));
    }

    centroids
}

/// Move each empty cluster's centroid onto the item currently farthest from
/// its own assigned centroid, taking the next-farthest item for each
/// additional empty cluster. Distance ties resolve to the lowest item index.
///
/// The chosen item is reassigned to the reseeded cluster along with the
/// centroid, so a run that stops at the iteration cap right after a reseed
/// still returns a partition where every cluster id has a member. Items
/// that are the sole member of their cluster are skipped as donors, which
/// keeps the donating cluster non-empty too; enough multi-member candidates
/// always exist because n >= k.
fn reseed_empty_clusters(
    data: &ArrayView2<f64>,
    assignments: &mut [usize],
    counts: &mut [usize],
    centroids: &mut Array2<f64>,
    empty_clusters: &[usize],
) {
    let mut by_distance: Vec<(usize, f64)> = data
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, item)| (i, squared_euclidean(&item, &centroids.row(assignments[i]))))
        .collect();
    by_distance
        .sort_by(|a, b| b.1.partial_cmp(&a.1).expect("finite distances").then(a.0.cmp(&b.0)));

    let mut next = 0;
    for &c in empty_clusters {
        while counts[assignments[by_distance[next].0]] < 2 {
            next += 1;
        }
        let i = by_distance[next].0;
        next += 1;

        let item = data.row(i).to_owned();
        centroids.row_mut(c).assign(&item);
        counts[assignments[i]] -= 1;
        assignments[i] = c;
        counts[c] = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    fn four_corners() -> Array2<f64> {
        array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]]
    }

    #[test]
    fn test_initialize_centroids_distinct_items() {
        let data = Array2::random((50, 4), Uniform::new(-1.0, 1.0));
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let centroids = initialize_centroids(&data.view(), 5, &mut rng);
        assert_eq!(centroids.nrows(), 5);
        assert_eq!(centroids.ncols(), 4);
    }

    #[test]
    fn test_fit_two_tight_pairs() {
        let data = four_corners();
        let config = ClusterConfig::new().with_n_starts(5).with_seed(42);

        let partition = fit(&data.view(), 2, &config).unwrap();

        assert_eq!(partition.assignments[0], partition.assignments[1]);
        assert_eq!(partition.assignments[2], partition.assignments[3]);
        assert_ne!(partition.assignments[0], partition.assignments[2]);
        assert_relative_eq!(partition.wcss, 1.0, epsilon = 1e-9);
        assert!(partition.converged);
    }

    #[test]
    fn test_fit_k_one_centroid_is_mean() {
        let data = four_corners();
        let config = ClusterConfig::new().with_seed(1);

        let partition = fit(&data.view(), 1, &config).unwrap();

        assert!(partition.assignments.iter().all(|&c| c == 0));
        assert_relative_eq!(partition.centroids[[0, 0]], 5.0, epsilon = 1e-12);
        assert_relative_eq!(partition.centroids[[0, 1]], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_fit_k_equals_n_is_exact() {
        let data = four_corners();
        let config = ClusterConfig::new().with_n_starts(8).with_seed(3);

        let partition = fit(&data.view(), 4, &config).unwrap();

        assert_relative_eq!(partition.wcss, 0.0, epsilon = 1e-12);
        let mut labels = partition.assignments.clone();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_fit_no_empty_clusters_with_duplicates() {
        // Duplicate points invite coincident centroids; the reseed path must
        // still hand back a partition covering every cluster id
        let data = array![[0.0, 0.0], [0.0, 0.0], [5.0, 5.0], [5.0, 5.0], [9.0, 9.0]];
        let config = ClusterConfig::new().with_n_starts(16).with_seed(7);

        let partition = fit(&data.view(), 3, &config).unwrap();

        let sizes = partition.cluster_sizes();
        assert_eq!(sizes.len(), 3);
        assert!(sizes.iter().all(|&s| s > 0), "sizes: {:?}", sizes);
        assert_relative_eq!(partition.wcss, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fit_deterministic() {
        let data = Array2::random((60, 3), Uniform::new(-2.0, 2.0));
        let config = ClusterConfig::new().with_n_starts(10).with_seed(99);

        let p1 = fit(&data.view(), 4, &config).unwrap();
        let p2 = fit(&data.view(), 4, &config).unwrap();

        assert_eq!(p1, p2);
    }

    #[test]
    fn test_fit_invalid_k() {
        let data = four_corners();
        let config = ClusterConfig::default();

        assert_eq!(
            fit(&data.view(), 0, &config),
            Err(ClusterError::InvalidK { k: 0, n_items: 4 })
        );
        assert_eq!(
            fit(&data.view(), 5, &config),
            Err(ClusterError::InvalidK { k: 5, n_items: 4 })
        );
    }

    #[test]
    fn test_fit_rejects_empty_and_non_finite() {
        let config = ClusterConfig::default();

        let empty = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            fit(&empty.view(), 1, &config),
            Err(ClusterError::InvalidInput(_))
        ));

        let bad = array![[0.0, 1.0], [f64::NAN, 2.0]];
        assert!(matches!(
            fit(&bad.view(), 1, &config),
            Err(ClusterError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_partition_accessors() {
        let data = four_corners();
        let config = ClusterConfig::new().with_n_starts(5).with_seed(42);
        let partition = fit(&data.view(), 2, &config).unwrap();

        assert_eq!(partition.k(), 2);
        let sizes = partition.cluster_sizes();
        assert_eq!(sizes, vec![2, 2]);

        let members: usize = (0..2).map(|c| partition.cluster_members(c).len()).sum();
        assert_eq!(members, 4);
    }

    #[test]
    fn test_derive_seed_streams_are_distinct() {
        let s = derive_seed(42, 2, REAL_DATA, 0);
        assert_ne!(s, derive_seed(42, 2, REAL_DATA, 1));
        assert_ne!(s, derive_seed(42, 3, REAL_DATA, 0));
        assert_ne!(s, derive_seed(42, 2, 1, 0));
        assert_ne!(s, derive_seed(43, 2, REAL_DATA, 0));
        assert_eq!(s, derive_seed(42, 2, REAL_DATA, 0));
    }
}
