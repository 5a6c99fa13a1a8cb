//! The assignment/update loop of Lloyd's algorithm, one iteration at a time.
//!
//! Every step consumes the previous [`LloydState`] and returns a new one, so each iteration
//! reads the centroid set produced by the previous iteration in full.
use log::warn;
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Data, Ix1, Ix2, Zip};

use crate::distance::L2Dist;
use crate::k_means::errors::KMeansError;
use crate::k_means::hyperparams::EmptyClusterPolicy;
use crate::Float;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum LloydState<F: Float> {
    /// Centroids have been seeded, no observation has been assigned yet.
    Initialized { centroids: Array2<F> },
    /// At least one assignment/update iteration has run.
    Iterating(Iteration<F>),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Iteration<F: Float> {
    pub(crate) centroids: Array2<F>,
    pub(crate) labels: Array1<usize>,
    /// Labels produced by the iteration before this one. `None` after the first iteration and
    /// after an iteration that reseeded an empty cluster.
    pub(crate) previous: Option<Array1<usize>>,
    pub(crate) n_iterations: u64,
}

impl<F: Float> Iteration<F> {
    /// The labels are a fixed point of the assignment step.
    pub(crate) fn is_converged(&self) -> bool {
        self.previous.as_ref() == Some(&self.labels)
    }

    /// Number of observations whose label changed in the last iteration.
    pub(crate) fn n_changed(&self) -> usize {
        match &self.previous {
            Some(previous) => Zip::from(previous)
                .and(&self.labels)
                .fold(0, |acc, a, b| acc + (a != b) as usize),
            None => self.labels.len(),
        }
    }
}

impl<F: Float> LloydState<F> {
    pub(crate) fn new(centroids: Array2<F>) -> Self {
        LloydState::Initialized { centroids }
    }

    pub(crate) fn n_iterations(&self) -> u64 {
        match self {
            LloydState::Initialized { .. } => 0,
            LloydState::Iterating(iteration) => iteration.n_iterations,
        }
    }

    /// Runs one assignment step followed by one update step.
    pub(crate) fn step(
        self,
        observations: &ArrayView2<F>,
        policy: EmptyClusterPolicy,
    ) -> Result<Self, KMeansError> {
        let (centroids, previous, n_iterations) = match self {
            LloydState::Initialized { centroids } => (centroids, None, 1),
            LloydState::Iterating(Iteration {
                centroids,
                labels,
                n_iterations,
                ..
            }) => (centroids, Some(labels), n_iterations + 1),
        };

        let mut labels = Array1::zeros(observations.nrows());
        update_cluster_memberships(&centroids, observations, &mut labels);

        let (mut centroids, counts) = compute_centroids(centroids.nrows(), observations, &labels);
        let reseeded = fill_empty_clusters(
            &mut centroids,
            &counts,
            observations,
            &labels,
            policy,
            n_iterations,
        )?;

        Ok(LloydState::Iterating(Iteration {
            centroids,
            labels,
            previous: if reseeded { None } else { previous },
            n_iterations,
        }))
    }
}

/// `compute_centroids` returns a 2-dimensional array, where the i-th row is the mean of the
/// observations assigned to the i-th cluster, together with the number of observations in
/// each cluster. Rows of empty clusters are left at zero.
pub(crate) fn compute_centroids<F: Float>(
    n_clusters: usize,
    // (n_observations, n_features)
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_observations,)
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> (Array2<F>, Array1<usize>) {
    let mut counts: Array1<usize> = Array1::zeros(n_clusters);
    let mut centroids = Array2::zeros((n_clusters, observations.ncols()));

    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &cluster_membership| {
            let mut centroid = centroids.row_mut(cluster_membership);
            centroid += &observation;
            counts[cluster_membership] += 1;
        });

    Zip::from(centroids.rows_mut())
        .and(&counts)
        .for_each(|mut centroid, &cnt| {
            if cnt > 0 {
                centroid /= F::cast(cnt);
            }
        });
    (centroids, counts)
}

/// Applies `policy` to every cluster without observations. Returns whether a centroid was
/// reseeded.
///
/// A reseeded centroid is moved onto the observation farthest from the centroid it is
/// assigned to, lowest index first. Once every observation sits on its centroid no reseed can
/// take any point away from another cluster, and the cluster is reported as empty.
fn fill_empty_clusters<F: Float>(
    centroids: &mut Array2<F>,
    counts: &Array1<usize>,
    observations: &ArrayView2<F>,
    cluster_memberships: &Array1<usize>,
    policy: EmptyClusterPolicy,
    n_iterations: u64,
) -> Result<bool, KMeansError> {
    let empty_clusters: Vec<usize> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &cnt)| cnt == 0)
        .map(|(cluster, _)| cluster)
        .collect();
    let first_empty = match empty_clusters.first() {
        Some(&cluster) => cluster,
        None => return Ok(false),
    };
    if policy == EmptyClusterPolicy::Fail {
        return Err(KMeansError::EmptyCluster {
            cluster: first_empty,
            n_iterations,
        });
    }

    let mut dists = assigned_dists(&*centroids, observations, cluster_memberships);
    for cluster in empty_clusters {
        let (farthest, max_dist) = dists.iter().enumerate().fold(
            (0, F::zero()),
            |(best, best_dist), (idx, &dist)| {
                if dist > best_dist {
                    (idx, dist)
                } else {
                    (best, best_dist)
                }
            },
        );
        if max_dist <= F::zero() {
            return Err(KMeansError::EmptyCluster {
                cluster,
                n_iterations,
            });
        }

        warn!(
            "cluster {} is empty after iteration {}, reseeding it from observation {}",
            cluster, n_iterations, farthest
        );
        centroids.row_mut(cluster).assign(&observations.row(farthest));
        dists[farthest] = F::zero();
    }
    Ok(true)
}

/// Updates `cluster_memberships` with the index of the cluster each observation belongs to.
pub(crate) fn update_cluster_memberships<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    cluster_memberships: &mut Array1<usize>,
) {
    Zip::from(observations.rows())
        .and(cluster_memberships)
        .par_for_each(|observation, cluster_membership| {
            *cluster_membership = closest_centroid(centroids, &observation).0
        });
}

/// Updates `dists` with the squared distance of each observation from its closest centroid.
pub(crate) fn update_min_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    dists: &mut Array1<F>,
) {
    Zip::from(observations.rows())
        .and(dists)
        .par_for_each(|observation, dist| {
            *dist = closest_centroid(centroids, &observation).1
        });
}

/// Squared distance of each observation from the centroid of the cluster it is labelled with.
pub(crate) fn assigned_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Array1<F> {
    Zip::from(observations.rows())
        .and(cluster_memberships)
        .map_collect(|observation, &c| L2Dist.rdistance(observation, centroids.row(c)))
}

/// Given a matrix of centroids with shape (n_centroids, n_features) and an observation,
/// return the index of the closest centroid (the index of the corresponding row in `centroids`)
/// and its squared distance. Ties go to the lowest index.
pub(crate) fn closest_centroid<F: Float>(
    // (n_centroids, n_features)
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_features)
    observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (usize, F) {
    let mut closest_index = 0;
    let mut minimum_distance = F::infinity();

    for (centroid_index, centroid) in centroids.rows().into_iter().enumerate() {
        let distance = L2Dist.rdistance(centroid, observation.view());
        if distance < minimum_distance {
            closest_index = centroid_index;
            minimum_distance = distance;
        }
    }
    (closest_index, minimum_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, concatenate, Array, Axis};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    macro_rules! calc_memberships {
        ($centroids:expr, $obs:expr) => {{
            let mut memberships = Array1::zeros($obs.nrows());
            update_cluster_memberships(&$centroids, &$obs, &mut memberships);
            memberships
        }};
    }

    #[test]
    fn test_min_dists() {
        let centroids = array![[0.0, 1.0], [40.0, 10.0]];
        let observations = array![[3.0, 4.0], [1.0, 3.0], [25.0, 15.0]];
        let mut dists = Array1::zeros(observations.nrows());

        update_min_dists(&centroids, &observations, &mut dists);
        assert_abs_diff_eq!(dists, array![18.0, 5.0, 250.0]);
    }

    #[test]
    // An observation is closest to itself.
    fn nothing_is_closer_than_self() {
        let n_centroids = 20;
        let n_features = 5;
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let centroids: Array2<f64> = Array::random_using(
            (n_centroids, n_features),
            Uniform::new(-100., 100.),
            &mut rng,
        );

        let expected_memberships = (0..n_centroids).collect::<Array1<_>>();
        assert_eq!(calc_memberships!(centroids, centroids), expected_memberships);
    }

    #[test]
    fn oracle_test_for_closest_centroid() {
        let centroids = array![[0., 0.], [1., 2.], [20., 0.], [0., 20.],];
        let observations = array![[1., 0.6], [20., 2.], [20., 0.], [7., 20.],];
        assert_eq!(
            calc_memberships!(centroids, observations),
            array![0, 2, 2, 3]
        );
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        // Both centroids are at distance 1 from the origin, the duplicate centroids are
        // at distance 0 from [5, 5]
        let centroids = array![[1., 0.], [-1., 0.], [5., 5.], [5., 5.]];
        let observations = array![[0., 0.], [5., 5.]];
        assert_eq!(calc_memberships!(centroids, observations), array![0, 2]);
    }

    #[test]
    fn compute_centroids_works() {
        let cluster_size = 100;
        let n_features = 4;
        let mut rng = Xoshiro256Plus::seed_from_u64(42);

        // Let's setup a synthetic set of observations, composed of two clusters with known means
        let cluster_1: Array2<f64> = Array::random_using(
            (cluster_size, n_features),
            Uniform::new(-100., 100.),
            &mut rng,
        );
        let memberships_1 = Array1::zeros(cluster_size);
        let expected_centroid_1 = cluster_1.sum_axis(Axis(0)) / cluster_size as f64;

        let cluster_2: Array2<f64> = Array::random_using(
            (cluster_size, n_features),
            Uniform::new(-100., 100.),
            &mut rng,
        );
        let memberships_2 = Array1::ones(cluster_size);
        let expected_centroid_2 = cluster_2.sum_axis(Axis(0)) / cluster_size as f64;

        let observations = concatenate(Axis(0), &[cluster_1.view(), cluster_2.view()]).unwrap();
        let memberships =
            concatenate(Axis(0), &[memberships_1.view(), memberships_2.view()]).unwrap();

        let (centroids, counts) = compute_centroids(2, &observations, &memberships);
        assert_abs_diff_eq!(centroids.row(0), expected_centroid_1, epsilon = 1e-5);
        assert_abs_diff_eq!(centroids.row(1), expected_centroid_2, epsilon = 1e-5);
        assert_eq!(counts, array![cluster_size, cluster_size]);
    }

    #[test]
    fn first_step_is_never_converged() {
        let observations = array![[0., 0.]];
        let state = LloydState::new(array![[0., 0.]]);
        assert_eq!(state.n_iterations(), 0);

        let state = state
            .step(&observations.view(), EmptyClusterPolicy::Fail)
            .unwrap();
        match state {
            LloydState::Iterating(ref iteration) => {
                assert_eq!(iteration.labels, array![0]);
                assert!(iteration.previous.is_none());
                assert!(!iteration.is_converged());
                assert_eq!(iteration.n_changed(), 1);
            }
            LloydState::Initialized { .. } => panic!("step must leave the initialized state"),
        }

        let state = state
            .step(&observations.view(), EmptyClusterPolicy::Fail)
            .unwrap();
        match state {
            LloydState::Iterating(iteration) => {
                assert!(iteration.is_converged());
                assert_eq!(iteration.n_iterations, 2);
                assert_eq!(iteration.n_changed(), 0);
            }
            LloydState::Initialized { .. } => panic!("step must leave the initialized state"),
        }
    }

    #[test]
    fn one_step_moves_centroids_to_the_means() {
        let observations = array![[0., 0.], [0., 1.], [10., 0.], [10., 1.]];
        let state = LloydState::new(array![[0., 0.], [10., 0.]])
            .step(&observations.view(), EmptyClusterPolicy::Fail)
            .unwrap();
        match state {
            LloydState::Iterating(iteration) => {
                assert_eq!(iteration.labels, array![0, 0, 1, 1]);
                assert_abs_diff_eq!(iteration.centroids, array![[0., 0.5], [10., 0.5]]);
            }
            LloydState::Initialized { .. } => panic!("step must leave the initialized state"),
        }
    }

    #[test]
    fn inertia_never_increases() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let observations: Array2<f64> =
            Array::random_using((300, 2), Uniform::new(0., 10.), &mut rng);
        let seeds = observations.select(Axis(0), &[0, 1, 2, 3, 4]);

        let mut state = LloydState::new(seeds);
        let mut previous_inertia = f64::INFINITY;
        for _ in 0..100 {
            state = state
                .step(&observations.view(), EmptyClusterPolicy::Fail)
                .unwrap();
            let iteration = match &state {
                LloydState::Iterating(iteration) => iteration,
                LloydState::Initialized { .. } => panic!("step must leave the initialized state"),
            };
            let inertia =
                assigned_dists(&iteration.centroids, &observations, &iteration.labels).sum();
            assert!(inertia <= previous_inertia + 1e-9);
            previous_inertia = inertia;
            if iteration.is_converged() {
                return;
            }
        }
        panic!("Lloyd's algorithm did not converge");
    }

    #[test]
    fn empty_cluster_fails() {
        // Two identical seeds: the tie-break sends everything to cluster 0
        let observations = array![[0., 0.], [1., 1.], [2., 2.]];
        let err = LloydState::new(array![[1., 1.], [1., 1.]])
            .step(&observations.view(), EmptyClusterPolicy::Fail)
            .unwrap_err();
        assert!(matches!(
            err,
            KMeansError::EmptyCluster {
                cluster: 1,
                n_iterations: 1
            }
        ));
    }

    #[test]
    fn empty_cluster_is_reseeded_from_the_farthest_observation() {
        let observations = array![[0., 0.], [1., 1.], [2., 2.]];
        let state = LloydState::new(array![[1., 1.], [1., 1.]])
            .step(&observations.view(), EmptyClusterPolicy::Reseed)
            .unwrap();
        let iteration = match state {
            LloydState::Iterating(iteration) => iteration,
            LloydState::Initialized { .. } => panic!("step must leave the initialized state"),
        };
        assert_abs_diff_eq!(iteration.centroids.row(0), array![1., 1.]);
        // [0, 0] and [2, 2] are equally far from [1, 1], the lowest index wins
        assert_abs_diff_eq!(iteration.centroids.row(1), array![0., 0.]);
        assert!(iteration.previous.is_none());
    }

    #[test]
    fn reseed_fails_when_no_observation_can_fill_the_cluster() {
        let observations = array![[1., 1.], [1., 1.], [1., 1.], [1., 1.]];
        let err = LloydState::new(array![[1., 1.], [1., 1.]])
            .step(&observations.view(), EmptyClusterPolicy::Reseed)
            .unwrap_err();
        assert!(matches!(
            err,
            KMeansError::EmptyCluster {
                cluster: 1,
                n_iterations: 1
            }
        ));
    }

    #[test]
    fn several_empty_clusters_get_distinct_observations() {
        let observations = array![[0.], [1.], [9.], [10.]];
        let state = LloydState::new(array![[5.], [5.], [5.]])
            .step(&observations.view(), EmptyClusterPolicy::Reseed)
            .unwrap();
        let iteration = match state {
            LloydState::Iterating(iteration) => iteration,
            LloydState::Initialized { .. } => panic!("step must leave the initialized state"),
        };
        assert_abs_diff_eq!(iteration.centroids, array![[5.], [0.], [10.]]);
    }
}
