use crate::k_means::errors::KMeansError;
use crate::Float;
use ndarray::{Array2, ArrayView2, Axis};
use rand::Rng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
/// Specifies centroid initialization algorithm for KMeans.
pub enum KMeansInit<F: Float> {
    /// Pick random points as centroids, uniformly and without replacement.
    Random,
    /// Precomputed list of centroids, represented as an array of (n_centroids, n_features).
    Precomputed(Array2<F>),
}

impl<F: Float> KMeansInit<F> {
    /// Runs the chosen initialization routine
    pub(crate) fn run<R: Rng>(
        &self,
        n_clusters: usize,
        observations: ArrayView2<F>,
        rng: &mut R,
    ) -> Result<Array2<F>, KMeansError> {
        let (n_samples, n_features) = observations.dim();
        if n_clusters > n_samples {
            return Err(KMeansError::NotEnoughSamples {
                n_clusters,
                n_samples,
            });
        }

        match self {
            Self::Random => Ok(random_init(n_clusters, observations, rng)),
            Self::Precomputed(centroids) => {
                if centroids.ncols() != n_features {
                    return Err(KMeansError::DimensionMismatch {
                        expected: centroids.ncols(),
                        found: n_features,
                    });
                }
                Ok(centroids.clone())
            }
        }
    }
}

/// Pick random points from the input matrix as centroids
fn random_init<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, _) = observations.dim();
    let indices = rand::seq::index::sample(rng, n_samples, n_clusters).into_vec();
    observations.select(Axis(0), &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;
    use std::collections::HashSet;

    #[test]
    fn random_init_picks_distinct_observations() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let obs = array![[0., 0.], [1., 1.], [2., 2.], [3., 3.], [4., 4.]];
        for n_clusters in 1..=obs.nrows() {
            let centroids = KMeansInit::Random
                .run(n_clusters, obs.view(), &mut rng)
                .unwrap();
            assert_eq!(centroids.dim(), (n_clusters, 2));
            // Every observation is unique, so the first coordinate identifies the row
            let picked: HashSet<i64> = centroids.column(0).iter().map(|&x| x as i64).collect();
            assert_eq!(picked.len(), n_clusters);
        }
    }

    #[test]
    fn random_init_is_reproducible() {
        let obs = array![[0., 1.], [2., 3.], [4., 5.], [6., 7.], [8., 9.], [10., 11.]];
        let first = KMeansInit::Random
            .run(3, obs.view(), &mut Xoshiro256Plus::seed_from_u64(7))
            .unwrap();
        let second = KMeansInit::Random
            .run(3, obs.view(), &mut Xoshiro256Plus::seed_from_u64(7))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn too_many_clusters() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let obs = array![[0., 0.], [1., 1.]];
        let err = KMeansInit::Random.run(3, obs.view(), &mut rng).unwrap_err();
        assert!(matches!(
            err,
            KMeansError::NotEnoughSamples {
                n_clusters: 3,
                n_samples: 2
            }
        ));
    }

    #[test]
    fn precomputed_dimension_mismatch() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let obs = array![[0., 0.], [1., 1.]];
        let init = KMeansInit::Precomputed(array![[0., 0., 0.]]);
        let err = init.run(1, obs.view(), &mut rng).unwrap_err();
        assert!(matches!(
            err,
            KMeansError::DimensionMismatch {
                expected: 3,
                found: 2
            }
        ));
    }
}
