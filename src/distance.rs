use ndarray::{ArrayView1, ArrayView2};

/// Compute the squared Euclidean distance between two feature vectors
#[inline]
pub fn squared_euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Compute the Euclidean distance between two feature vectors
#[inline]
pub fn euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Find the nearest centroid to an item by squared Euclidean distance.
///
/// Centroids are scanned in id order with a strict comparison, so ties
/// resolve to the lowest cluster id.
///
/// # Returns
/// * `(cluster_id, squared_distance)` of the nearest centroid
pub fn nearest_centroid(item: &ArrayView1<f64>, centroids: &ArrayView2<f64>) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;

    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = squared_euclidean(item, &centroid);
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }

    (best, best_dist)
}

/// Compute the within-cluster sum of squares (the k-means objective): the
/// sum over items of the squared Euclidean distance to the assigned centroid.
///
/// Accumulation is serial in item order so repeated runs are bit-identical.
pub fn compute_wcss(
    data: &ArrayView2<f64>,
    assignments: &[usize],
    centroids: &ArrayView2<f64>,
) -> f64 {
    data.rows()
        .into_iter()
        .zip(assignments.iter())
        .map(|(item, &c)| squared_euclidean(&item, &centroids.row(c)))
        .sum()
}
