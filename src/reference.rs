use ndarray::{Array2, ArrayView2, Axis};
use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate a "no-structure" reference dataset for the gap statistic.
///
/// The result has the same shape as `data`; each feature is sampled
/// independently and uniformly between the observed minimum and maximum of
/// that feature. This is method (1) of Tibshirani et al. (2001): same
/// marginal ranges, no cluster structure. Deterministic in `(data, seed)`.
///
/// A constant feature is reproduced as that constant.
pub fn generate_reference(data: &ArrayView2<f64>, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (n_items, n_features) = data.dim();
    let mut reference = Array2::zeros((n_items, n_features));

    for (j, feature) in data.axis_iter(Axis(1)).enumerate() {
        let min = feature.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = feature.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        if max > min {
            let dist = Uniform::new(min, max);
            for i in 0..n_items {
                reference[[i, j]] = rng.sample(dist);
            }
        } else {
            for i in 0..n_items {
                reference[[i, j]] = min;
            }
        }
    }

    reference
}
