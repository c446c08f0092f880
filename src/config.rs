/// Configuration shared by the k-means engine and the gap-statistic selector
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Number of independent random restarts per fit. The partition with the
    /// lowest WCSS across restarts is returned.
    pub n_starts: usize,

    /// Iteration cap for a single Lloyd run. Hitting the cap without a
    /// stable assignment marks the returned partition as not converged.
    pub max_iters: usize,

    /// Global random seed. Every restart derives its own RNG stream from
    /// this seed, so results are reproducible regardless of thread count.
    pub seed: u64,

    /// Print progress to stderr during fitting and selection
    pub verbose: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_starts: 25,
            max_iters: 100,
            seed: 0,
            verbose: false,
        }
    }
}

impl ClusterConfig {
    /// Create a configuration with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of random restarts per fit
    pub fn with_n_starts(mut self, n_starts: usize) -> Self {
        self.n_starts = n_starts;
        self
    }

    /// Set the iteration cap for a single Lloyd run
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the global random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set verbose mode
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
