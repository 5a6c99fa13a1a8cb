use thiserror::Error;

/// An error when fitting with an invalid hyperparameter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KMeansParamsError {
    #[error("n_clusters cannot be 0")]
    NClusters,
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
    #[error("precomputed centroids must have {expected} rows, found {found}")]
    PrecomputedCentroids { expected: usize, found: usize },
}

/// An error when modeling a KMeans algorithm
#[derive(Error, Debug, Clone)]
pub enum KMeansError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] KMeansParamsError),
    /// When there are fewer observations than requested clusters
    #[error("Cannot pick {n_clusters} distinct centroids from {n_samples} observations")]
    NotEnoughSamples { n_clusters: usize, n_samples: usize },
    /// When the centroids and the observations live in different feature spaces
    #[error("Centroids have {expected} features but observations have {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// When a cluster has no observation left after an assignment step
    #[error("Fitting failed: cluster {cluster} is empty after iteration {n_iterations}")]
    EmptyCluster { cluster: usize, n_iterations: u64 },
    /// When the labels are still changing after `max_n_iterations`
    #[error("Fitting failed: Did not converge after {n_iterations} iterations. Try different init parameters or check for degenerate data.")]
    NotConverged { n_iterations: u64 },
    /// When the results of a fit are queried before any successful fit
    #[error("The model has to be fitted before its results can be queried")]
    NotFitted,
}
