//! Basic example demonstrating autokmeans-rs usage
//!
//! Run with: cargo run --example basic --release

use autokmeans_rs::{evaluate, select, ClusterConfig};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn main() {
    println!("=== autokmeans-rs example ===\n");

    // Generate synthetic data: 3 clusters in 2D for easy visualization
    let centers = [[-5.0, -5.0], [0.0, 5.0], [5.0, -5.0]];
    let points_per_cluster = 100;
    let n_samples = centers.len() * points_per_cluster;

    println!("Generating {} samples around {} centers...", n_samples, centers.len());

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut data = Array2::<f64>::zeros((n_samples, 2));
    for i in 0..n_samples {
        let center = &centers[i / points_per_cluster];
        data[[i, 0]] = center[0] + rng.gen_range(-1.0..1.0);
        data[[i, 1]] = center[1] + rng.gen_range(-1.0..1.0);
    }

    // Estimate the number of clusters with the gap statistic
    let config = ClusterConfig::new()
        .with_n_starts(10)
        .with_seed(42)
        .with_verbose(false);

    println!("Running gap-statistic selection over k = 1..=6...\n");
    let selection = select(&data.view(), 6, 10, &config).expect("selection failed");

    println!("Gap curve:");
    println!("  {:>3}  {:>10}  {:>10}  {:>10}", "k", "gap", "std_err", "ln(wcss)");
    for point in &selection.curve.points {
        println!(
            "  {:>3}  {:>10.4}  {:>10.4}  {:>10.4}",
            point.k, point.gap, point.std_err, point.log_wcss
        );
    }
    println!("\nChosen k: {}\n", selection.chosen_k);

    let partition = &selection.partitions[&selection.chosen_k];
    println!("Cluster distribution:");
    for (c, count) in partition.cluster_sizes().iter().enumerate() {
        println!(
            "  Cluster {}: {} samples ({:.1}%), centroid ({:.2}, {:.2})",
            c,
            count,
            (*count as f64 / n_samples as f64) * 100.0,
            partition.centroids[[c, 0]],
            partition.centroids[[c, 1]]
        );
    }
    println!("\nWCSS: {:.4}", partition.wcss);

    // Score the chosen partition
    let report = evaluate(&data.view(), partition).expect("evaluation failed");
    println!("\nSilhouette widths:");
    for (c, mean) in report.cluster_means.iter().enumerate() {
        println!("  Cluster {}: {:.4}", c, mean);
    }
    println!("  Overall:   {:.4}", report.mean);

    println!("\n=== Done! ===");
}
