use crate::k_means::errors::KMeansParamsError;

use super::init::KMeansInit;
use crate::param_guard::ParamGuard;
use crate::Float;
use rand::Rng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// What to do with a cluster that no observation was assigned to.
///
/// The mean of an empty cluster is undefined, so the update step cannot produce a centroid for
/// it. This is detected on every update step and resolved according to the chosen policy.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyClusterPolicy {
    /// Abort the fit with [`KMeansError::EmptyCluster`](crate::KMeansError::EmptyCluster).
    Fail,
    /// Move the centroid onto the observation farthest from the centroid it is assigned to.
    /// Labels are recomputed on the next iteration, so the fit cannot be declared converged on
    /// an iteration that reseeded a centroid. If every observation sits exactly on its
    /// centroid the fit fails with
    /// [`KMeansError::EmptyCluster`](crate::KMeansError::EmptyCluster) as with `Fail`.
    Reseed,
}

impl Default for EmptyClusterPolicy {
    fn default() -> Self {
        EmptyClusterPolicy::Fail
    }
}

#[derive(Clone, Debug, PartialEq)]
/// The set of hyperparameters that can be specified for the execution of
/// the [K-means algorithm](crate::KMeans).
pub struct KMeansValidParams<F: Float, R: Rng> {
    /// We exit the training loop with an error when the number of training iterations
    /// reaches `max_n_iterations` and the labels are still changing.
    max_n_iterations: u64,
    /// The number of clusters we will be looking for in the training dataset.
    n_clusters: usize,
    /// The initialization strategy used to initialize the centroids.
    init: KMeansInit<F>,
    /// How an empty cluster is handled during the update step.
    empty_cluster: EmptyClusterPolicy,
    /// The random number generator
    rng: R,
}

#[derive(Clone, Debug, PartialEq)]
/// An helper struct used to construct a set of [valid hyperparameters](KMeansValidParams) for
/// the [K-means algorithm](crate::KMeans) (using the builder pattern).
pub struct KMeansParams<F: Float, R: Rng>(pub(crate) KMeansValidParams<F, R>);

impl<F: Float, R: Rng> KMeansParams<F, R> {
    /// `new` lets us configure our training algorithm parameters:
    /// * we will be looking for `n_clusters` in the training dataset;
    /// * the training is considered complete when an assignment step leaves every label
    ///   unchanged;
    /// * we give up after `max_n_iterations` assignment/update iterations if the labels
    ///   are still moving.
    ///
    /// Defaults are provided if optional parameters are not specified:
    /// * `max_n_iterations = 300`
    /// * `init = Random`
    /// * `empty_cluster = Fail`
    pub fn new(n_clusters: usize, rng: R) -> Self {
        Self(KMeansValidParams {
            max_n_iterations: 300,
            n_clusters,
            init: KMeansInit::Random,
            empty_cluster: EmptyClusterPolicy::default(),
            rng,
        })
    }

    /// Change the value of `max_n_iterations`
    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    /// Change the value of `init`
    pub fn init_method(mut self, init: KMeansInit<F>) -> Self {
        self.0.init = init;
        self
    }

    /// Change the empty cluster policy
    pub fn empty_cluster(mut self, policy: EmptyClusterPolicy) -> Self {
        self.0.empty_cluster = policy;
        self
    }
}

impl<F: Float, R: Rng> ParamGuard for KMeansParams<F, R> {
    type Checked = KMeansValidParams<F, R>;
    type Error = KMeansParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.n_clusters == 0 {
            return Err(KMeansParamsError::NClusters);
        }
        if self.0.max_n_iterations == 0 {
            return Err(KMeansParamsError::MaxIterations);
        }
        if let KMeansInit::Precomputed(centroids) = &self.0.init {
            if centroids.nrows() != self.0.n_clusters {
                return Err(KMeansParamsError::PrecomputedCentroids {
                    expected: self.0.n_clusters,
                    found: centroids.nrows(),
                });
            }
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, R: Rng> KMeansValidParams<F, R> {
    /// We exit the training loop with an error when the number of training iterations
    /// reaches `max_n_iterations` and the labels are still changing.
    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    /// The number of clusters we will be looking for in the training dataset.
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Cluster initialization strategy
    pub fn init_method(&self) -> &KMeansInit<F> {
        &self.init
    }

    /// Empty cluster policy
    pub fn empty_cluster(&self) -> EmptyClusterPolicy {
        self.empty_cluster
    }

    /// Returns the random generator
    pub fn rng(&self) -> &R {
        &self.rng
    }
}
