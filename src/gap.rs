use crate::config::ClusterConfig;
use crate::error::ClusterError;
use crate::kmeans::{derive_seed, fit_unchecked, validate_input, Partition, REAL_DATA};
use crate::reference::generate_reference;
use ndarray::ArrayView2;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// One point of the gap curve
#[derive(Debug, Clone, PartialEq)]
pub struct GapPoint {
    /// Candidate number of clusters
    pub k: usize,

    /// gap(k) = mean_b ln W*_kb - ln W_k
    pub gap: f64,

    /// Standard error of the reference dispersion, with the finite-B
    /// correction sqrt(1 + 1/B)
    pub std_err: f64,

    /// ln WCSS of the fit on the observed data, for knee plots
    pub log_wcss: f64,
}

/// Gap values over k = 1..=k_max, in k order
#[derive(Debug, Clone, PartialEq)]
pub struct GapCurve {
    pub points: Vec<GapPoint>,
}

/// Result of gap-statistic model selection
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The chosen number of clusters
    pub chosen_k: usize,

    /// The gap curve the choice was made from
    pub curve: GapCurve,

    /// The fitted partition of the observed data for every candidate k
    pub partitions: BTreeMap<usize, Partition>,
}

/// Estimate the number of clusters with the gap statistic of Tibshirani,
/// Walther and Hastie (2001).
///
/// For each k in `1..=k_max` the observed data and `n_refs` uniform
/// reference datasets are fitted with the multi-start k-means engine; the
/// gap is the mean log reference dispersion minus the observed one. The
/// chosen k is the smallest k with `gap(k) >= gap(k+1) - std_err(k+1)`
/// (the one-standard-error rule), falling back to `k_max` when no k
/// qualifies.
///
/// Every (k, reference, restart) fit runs on its own derived RNG stream,
/// so the result does not depend on thread count or execution order.
///
/// # Errors
///
/// * `InvalidInput` if the data is empty or contains non-finite values,
///   or if `n_refs == 0`
/// * `InvalidRange` if `k_max < 1` or `k_max > n_items - 1`
pub fn select(
    data: &ArrayView2<f64>,
    k_max: usize,
    n_refs: usize,
    config: &ClusterConfig,
) -> Result<Selection, ClusterError> {
    validate_input(data)?;

    let n_items = data.nrows();
    if k_max < 1 || k_max > n_items.saturating_sub(1) {
        return Err(ClusterError::InvalidRange { k_max, n_items });
    }
    if n_refs == 0 {
        return Err(ClusterError::InvalidInput(
            "n_refs must be at least 1".to_string(),
        ));
    }

    // References are generated once and reused across k; stream label
    // a = 0 is reserved for them (fits always use a = k >= 1)
    let references: Vec<_> = (1..=n_refs)
        .map(|b| generate_reference(data, derive_seed(config.seed, 0, b as u64, 0)))
        .collect();

    let fits: Vec<(Partition, f64, Vec<f64>)> = (1..=k_max)
        .into_par_iter()
        .map(|k| {
            let partition = fit_unchecked(data, k, REAL_DATA, config);
            let log_wcss = ln_wcss(partition.wcss);

            let ref_log_wcss: Vec<f64> = references
                .par_iter()
                .enumerate()
                .map(|(b, reference)| {
                    ln_wcss(fit_unchecked(&reference.view(), k, b as u64 + 1, config).wcss)
                })
                .collect();

            (partition, log_wcss, ref_log_wcss)
        })
        .collect();

    let mut points = Vec::with_capacity(k_max);
    let mut partitions = BTreeMap::new();
    for (i, (partition, log_wcss, ref_log_wcss)) in fits.into_iter().enumerate() {
        let k = i + 1;
        let b = ref_log_wcss.len() as f64;
        let ref_mean = ref_log_wcss.iter().sum::<f64>() / b;
        let variance = ref_log_wcss
            .iter()
            .map(|lw| (lw - ref_mean).powi(2))
            .sum::<f64>()
            / b;
        let std_err = variance.sqrt() * (1.0 + 1.0 / b).sqrt();
        let gap = ref_mean - log_wcss;

        if config.verbose {
            eprintln!(
                "k = {}: gap = {:.4}, std_err = {:.4}, ln wcss = {:.4}",
                k, gap, std_err, log_wcss
            );
        }

        points.push(GapPoint {
            k,
            gap,
            std_err,
            log_wcss,
        });
        partitions.insert(k, partition);
    }

    let chosen_k = choose_k(&points);

    Ok(Selection {
        chosen_k,
        curve: GapCurve { points },
        partitions,
    })
}

/// Smallest k with gap(k) >= gap(k+1) - std_err(k+1); k_max when none
/// qualifies before the end of the explored range
pub(crate) fn choose_k(points: &[GapPoint]) -> usize {
    for pair in points.windows(2) {
        if pair[0].gap >= pair[1].gap - pair[1].std_err {
            return pair[0].k;
        }
    }
    points.last().map(|p| p.k).unwrap_or(0)
}

/// An exact partition has WCSS 0; clamp so the curve stays finite
fn ln_wcss(wcss: f64) -> f64 {
    wcss.max(f64::MIN_POSITIVE).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn point(k: usize, gap: f64, std_err: f64) -> GapPoint {
        GapPoint {
            k,
            gap,
            std_err,
            log_wcss: 0.0,
        }
    }

    #[test]
    fn test_choose_k_one_standard_error_rule() {
        // gap(1) < gap(2) - se(2), gap(2) >= gap(3) - se(3) -> 2
        let points = vec![point(1, -1.0, 0.1), point(2, 2.0, 0.3), point(3, 1.5, 0.3)];
        assert_eq!(choose_k(&points), 2);
    }

    #[test]
    fn test_choose_k_prefers_smallest_qualifying() {
        let points = vec![point(1, 1.0, 0.1), point(2, 0.9, 0.3), point(3, 2.0, 0.1)];
        assert_eq!(choose_k(&points), 1);
    }

    #[test]
    fn test_choose_k_falls_back_to_k_max() {
        // strictly rising gap with tiny errors: nothing qualifies
        let points = vec![point(1, 0.0, 0.0), point(2, 1.0, 0.0), point(3, 2.0, 0.0)];
        assert_eq!(choose_k(&points), 3);
    }

    #[test]
    fn test_choose_k_single_candidate() {
        let points = vec![point(1, 0.5, 0.1)];
        assert_eq!(choose_k(&points), 1);
    }

    #[test]
    fn test_select_invalid_range() {
        let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
        let config = ClusterConfig::default();

        assert_eq!(
            select(&data.view(), 0, 5, &config),
            Err(ClusterError::InvalidRange { k_max: 0, n_items: 4 })
        );
        assert_eq!(
            select(&data.view(), 4, 5, &config),
            Err(ClusterError::InvalidRange { k_max: 4, n_items: 4 })
        );
    }

    #[test]
    fn test_select_requires_references() {
        let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
        let config = ClusterConfig::default();

        assert!(matches!(
            select(&data.view(), 2, 0, &config),
            Err(ClusterError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_select_curve_covers_range() {
        let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
        let config = ClusterConfig::new().with_n_starts(5).with_seed(42);

        let selection = select(&data.view(), 3, 5, &config).unwrap();

        let ks: Vec<usize> = selection.curve.points.iter().map(|p| p.k).collect();
        assert_eq!(ks, vec![1, 2, 3]);
        assert_eq!(
            selection.partitions.keys().cloned().collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(selection
            .curve
            .points
            .iter()
            .all(|p| p.gap.is_finite() && p.std_err >= 0.0));
    }
}
