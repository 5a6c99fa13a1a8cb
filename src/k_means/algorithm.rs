use log::{debug, info};
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::distance::L2Dist;
use crate::k_means::errors::KMeansError;
use crate::k_means::hyperparams::{KMeansParams, KMeansValidParams};
use crate::k_means::state::{
    assigned_dists, closest_centroid, update_cluster_memberships, update_min_dists, LloydState,
};
use crate::traits::{Fit, PredictInplace, Transformer};
use crate::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// K-means clustering aims to partition a set of unlabeled observations into clusters,
/// where each observation belongs to the cluster with the nearest mean.
///
/// The mean of the points within a cluster is called *centroid*.
///
/// Given the set of centroids, you can assign an observation to a cluster
/// choosing the nearest centroid.
///
/// We implement the _standard algorithm_, also known as Lloyd's Algorithm.
/// More details on the algorithm can be found in the next section or
/// [here](https://en.wikipedia.org/wiki/K-means_clustering).
///
/// ## The algorithm
///
/// K-means is an iterative algorithm: it progressively refines the choice of centroids.
///
/// Each iteration never increases the inertia, so in practice the labels settle quickly, but a
/// run can end in a local minimum (finding the optimal minimum is NP-hard!). Ties between equal
/// distances can in principle make the labels oscillate: the number of iterations is bounded by
/// `max_n_iterations`.
///
/// There are three steps in the standard algorithm:
/// - initialisation step: pick `n_clusters` distinct observations at random as initial centroids;
/// - assignment step: assign each observation to the nearest cluster
///                    (minimum euclidean distance between the observation and the cluster's
///                    centroid, the lowest cluster index wins a tie);
/// - update step: recompute the centroid of each cluster as the mean of its observations.
///
/// The initialisation step is a one-off, done at the very beginning.
/// Assignment and update are repeated in a loop until an assignment step leaves every
/// label unchanged. If that does not happen within `max_n_iterations` iterations the fit
/// fails with [`KMeansError::NotConverged`].
///
/// A cluster left without observations by the assignment step has no mean. Depending on the
/// [`EmptyClusterPolicy`](crate::EmptyClusterPolicy) the fit either fails or moves the
/// centroid onto the observation farthest from its own centroid. When every observation already
/// sits on its centroid there is nothing to move, and the fit fails under both policies.
///
/// ## Parallelisation
///
/// The work performed by the assignment step does not require any coordination:
/// the closest centroid for each point can be computed independently from the
/// closest centroid for any of the remaining points.
///
/// `fit` parallelises the assignment step thanks to the `rayon` feature in `ndarray`.
/// The update step runs on a single thread.
///
/// ## Tutorial
///
/// ```
/// use lloyd::traits::{Fit, Predict};
/// use lloyd::{EmptyClusterPolicy, KMeans};
/// use lloyd_datasets::generate;
/// use ndarray::{array, Axis};
/// use rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// // Our random number generator, seeded for reproducibility
/// let mut rng = Xoshiro256Plus::seed_from_u64(42);
///
/// // `expected_centroids` has shape `(n_centroids, n_features)`
/// // i.e. three points in the 2-dimensional plane
/// let expected_centroids = array![[0., 1.], [-10., 20.], [-1., 10.]];
/// // Let's generate a synthetic dataset: three blobs of observations
/// // (100 points each) centered around our `expected_centroids`
/// let data = generate::blobs(100, &expected_centroids, &mut rng);
/// let n_clusters = expected_centroids.len_of(Axis(0));
///
/// // Let's configure and run our K-means algorithm
/// // `n_clusters` is the only mandatory parameter.
/// let model = KMeans::params_with_rng(n_clusters, rng)
///     .max_n_iterations(100)
///     .empty_cluster(EmptyClusterPolicy::Reseed)
///     .fit(&data)
///     .expect("KMeans fitted");
///
/// // Every observation received a label
/// assert_eq!(model.labels().len(), data.nrows());
/// assert!(model.residual() > 0.);
///
/// // The training observations are assigned to the clusters they were fitted with
/// assert_eq!(&model.predict(&data), model.labels());
///
/// // Once we found our set of centroids, we can also assign new points to the nearest cluster
/// let new_observation = array![[-9., 20.5]];
/// // Predict returns the **index** of the nearest cluster
/// let labels = model.predict(&new_observation);
/// // We can retrieve the actual centroid of the closest cluster using `.centroids()`
/// let closest_centroid = model.centroids().index_axis(Axis(0), labels[0]);
/// assert_eq!(closest_centroid.len(), 2);
/// ```
pub struct KMeans<F: Float> {
    centroids: Array2<F>,
    labels: Array1<usize>,
    cluster_sizes: Array1<usize>,
    residual: F,
    inertia: F,
    n_iterations: u64,
}

impl<F: Float> KMeans<F> {
    pub fn params(nclusters: usize) -> KMeansParams<F, Xoshiro256Plus> {
        KMeansParams::new(nclusters, Xoshiro256Plus::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(nclusters: usize, rng: R) -> KMeansParams<F, R> {
        KMeansParams::new(nclusters, rng)
    }

    /// Return the set of centroids as a 2-dimensional matrix with shape
    /// `(n_centroids, n_features)`.
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Return the cluster index of every training observation
    pub fn labels(&self) -> &Array1<usize> {
        &self.labels
    }

    /// Return the number of training points belonging to each cluster
    pub fn cluster_sizes(&self) -> &Array1<usize> {
        &self.cluster_sizes
    }

    /// Return the sum of the euclidean distances between each training point and the
    /// centroid of its cluster.
    pub fn residual(&self) -> F {
        self.residual
    }

    /// Return the sum of the squared euclidean distances between each training point and the
    /// centroid of its cluster. This is the quantity Lloyd's algorithm minimises.
    pub fn inertia(&self) -> F {
        self.inertia
    }

    /// Return the number of assignment/update iterations, including the final iteration that
    /// found the labels unchanged.
    pub fn n_iterations(&self) -> u64 {
        self.n_iterations
    }

    /// Sum of the euclidean distances between each observation and its closest centroid.
    ///
    /// On the training observations this recomputes [`residual`](Self::residual).
    pub fn residual_of(&self, observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>) -> F {
        self.transform(observations).sum()
    }

    /// Sum of the squared euclidean distances between each observation and its closest
    /// centroid.
    ///
    /// On the training observations this recomputes [`inertia`](Self::inertia).
    pub fn inertia_of(&self, observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>) -> F {
        let mut dists = Array1::zeros(observations.nrows());
        update_min_dists(&self.centroids, observations, &mut dists);
        dists.sum()
    }
}

impl<F: Float, R: Rng + Clone, DA: Data<Elem = F>> Fit<ArrayBase<DA, Ix2>, KMeansError>
    for KMeansValidParams<F, R>
{
    type Object = KMeans<F>;

    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `fit` identifies `n_clusters` centroids based on the training data distribution.
    ///
    /// The random number generator is cloned from the hyperparameters, so fitting twice on
    /// the same observations gives the same model.
    fn fit(&self, observations: &ArrayBase<DA, Ix2>) -> Result<Self::Object, KMeansError> {
        let mut rng = self.rng().clone();
        let observations = observations.view();

        let centroids = self
            .init_method()
            .run(self.n_clusters(), observations, &mut rng)?;
        let mut state = LloydState::new(centroids);

        let converged = loop {
            state = match state {
                LloydState::Iterating(iteration) if iteration.is_converged() => break iteration,
                state if state.n_iterations() >= self.max_n_iterations() => {
                    return Err(KMeansError::NotConverged {
                        n_iterations: state.n_iterations(),
                    })
                }
                state => {
                    let state = state.step(&observations, self.empty_cluster())?;
                    if let LloydState::Iterating(iteration) = &state {
                        debug!(
                            "KMeans iteration {}: {} labels changed",
                            iteration.n_iterations,
                            iteration.n_changed()
                        );
                    }
                    state
                }
            };
        };

        let dists = assigned_dists(&converged.centroids, &observations, &converged.labels);
        let inertia = dists.sum();
        let residual = dists.mapv(|d| L2Dist.rdist_to_dist(d)).sum();
        let mut cluster_sizes: Array1<usize> = Array1::zeros(self.n_clusters());
        converged
            .labels
            .iter()
            .for_each(|&c| cluster_sizes[c] += 1);

        info!(
            "KMeans converged after {} iterations, residual: {:.3}, inertia: {:.3}",
            converged.n_iterations, residual, inertia
        );

        Ok(KMeans {
            centroids: converged.centroids,
            labels: converged.labels,
            cluster_sizes,
            residual,
            inertia,
            n_iterations: converged.n_iterations,
        })
    }
}

impl<F: Float, DA: Data<Elem = F> + Sync> Transformer<&ArrayBase<DA, Ix2>, Array1<F>>
    for KMeans<F>
{
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `transform` returns, for each observation, its euclidean distance to its closest
    /// centroid.
    fn transform(&self, observations: &ArrayBase<DA, Ix2>) -> Array1<F> {
        let mut dists = Array1::zeros(observations.nrows());
        update_min_dists(&self.centroids, observations, &mut dists);
        dists.mapv_into(|d| L2Dist.rdist_to_dist(d))
    }
}

impl<F: Float, DA: Data<Elem = F> + Sync> PredictInplace<ArrayBase<DA, Ix2>, Array1<usize>>
    for KMeans<F>
{
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `predict` returns, for each observation, the index of the closest cluster/centroid.
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    fn predict_inplace(&self, observations: &ArrayBase<DA, Ix2>, memberships: &mut Array1<usize>) {
        assert_eq!(
            observations.nrows(),
            memberships.len(),
            "The number of data points must match the number of memberships."
        );

        update_cluster_memberships(&self.centroids, observations, memberships);
    }

    fn default_target(&self, x: &ArrayBase<DA, Ix2>) -> Array1<usize> {
        Array1::zeros(x.nrows())
    }
}

impl<F: Float, DA: Data<Elem = F>> PredictInplace<ArrayBase<DA, Ix1>, usize> for KMeans<F> {
    /// Given one input observation, return the index of its closest cluster
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    fn predict_inplace(&self, observation: &ArrayBase<DA, Ix1>, membership: &mut usize) {
        *membership = closest_centroid(&self.centroids, observation).0;
    }

    fn default_target(&self, _x: &ArrayBase<DA, Ix1>) -> usize {
        0
    }
}
