//! # autokmeans-rs
//!
//! K-means clustering with unsupervised model selection and quality
//! diagnostics, for in-memory tables of scaled feature vectors.
//!
//! ## Features
//!
//! - **Multi-start k-means**: every fit runs several independently seeded
//!   Lloyd restarts and keeps the lowest-WCSS partition
//! - **Gap-statistic selection**: the number of clusters is estimated by
//!   comparing the observed dispersion against uniform reference datasets
//!   (Tibshirani, Walther & Hastie, 2001), with the one-standard-error rule
//! - **Silhouette diagnostics**: per-item and per-cluster silhouette widths
//!   for judging how well-separated the chosen partition is
//! - **Reproducible parallelism**: restarts and reference fits run on rayon
//!   worker threads, each on an RNG stream derived from the global seed, so
//!   results are bit-identical regardless of thread count
//!
//! The caller owns ingestion and presentation: data arrives as an already
//! scaled `ndarray` view (one row per item), and all results are plain
//! numeric structures ready for tables or plots.
//!
//! ## Example
//!
//! ```rust
//! use autokmeans_rs::{evaluate, fit, ClusterConfig};
//! use ndarray::array;
//!
//! // Two tight pairs, far apart
//! let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
//! let config = ClusterConfig::new().with_n_starts(5).with_seed(42);
//!
//! let partition = fit(&data.view(), 2, &config).unwrap();
//! assert_eq!(partition.assignments[0], partition.assignments[1]);
//! assert!((partition.wcss - 1.0).abs() < 1e-9);
//!
//! let report = evaluate(&data.view(), &partition).unwrap();
//! assert!(report.mean > 0.85);
//! ```
//!
//! ## Choosing k automatically
//!
//! ```rust
//! use autokmeans_rs::{select, ClusterConfig};
//! use ndarray::array;
//!
//! let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
//! let config = ClusterConfig::new().with_n_starts(5).with_seed(42);
//!
//! let selection = select(&data.view(), 3, 10, &config).unwrap();
//! assert_eq!(selection.chosen_k, 2);
//!
//! // The fitted partition for the chosen k is already available
//! let best = &selection.partitions[&selection.chosen_k];
//! assert_eq!(best.k(), 2);
//! ```

mod config;
mod distance;
mod error;
mod gap;
mod kmeans;
mod reference;
mod silhouette;

pub use config::ClusterConfig;
pub use error::ClusterError;
pub use gap::{select, GapCurve, GapPoint, Selection};
pub use kmeans::{fit, Partition};
pub use reference::generate_reference;
pub use silhouette::{evaluate, SilhouetteReport};
