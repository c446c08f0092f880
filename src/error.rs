use thiserror::Error;

/// Error types for the autokmeans-rs library
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    /// The feature matrix is empty or contains non-finite values
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The number of clusters k is outside [1, n_items]
    #[error("invalid k: {k} (must be in [1, {n_items}] for {n_items} items)")]
    InvalidK { k: usize, n_items: usize },

    /// The candidate range k_max is outside [1, n_items - 1]
    #[error("invalid k_max: {k_max} (must be in [1, {}] for {n_items} items)", .n_items.saturating_sub(1))]
    InvalidRange { k_max: usize, n_items: usize },

    /// A partition passed to evaluation does not match the data
    #[error("invalid partition: {0}")]
    InvalidPartition(String),
}
