//! `lloyd` partitions a set of points into a fixed number of clusters with
//! Lloyd's algorithm for k-means clustering.
//!
//! ## The big picture
//!
//! Points are the rows of an `ndarray` matrix with shape `(n_observations, n_features)`.
//! A fit seeds `n_clusters` centroids with distinct observations drawn at random, then
//! alternates an assignment step (every point joins its nearest centroid) and an update step
//! (every centroid moves to the mean of its points) until the assignment stops changing.
//! The fitted [`KMeans`] model exposes the labels, the centroids, the iteration count and two
//! scores of the final partition: the residual (sum of euclidean distances to the assigned
//! centroids) and the inertia (sum of squared distances).
//!
//! Hyperparameters follow a builder pattern and are validated through [`ParamGuard`] before
//! any data is touched. [`KMeansEngine`] wraps the same algorithm for callers that prefer a
//! stateful object which is configured once and fitted many times.
//!
//! ```
//! use lloyd::traits::Fit;
//! use lloyd::{KMeans, KMeansInit};
//! use ndarray::array;
//!
//! let data = array![[0., 0.], [0., 1.], [10., 0.], [10., 1.]];
//! let model = KMeans::params(2)
//!     .init_method(KMeansInit::Precomputed(array![[0., 0.], [10., 0.]]))
//!     .fit(&data)
//!     .unwrap();
//!
//! assert_eq!(model.labels(), &array![0, 0, 1, 1]);
//! assert_eq!(model.centroids(), &array![[0., 0.5], [10., 0.5]]);
//! assert_eq!(model.inertia(), 1.0);
//! assert_eq!(model.residual(), 2.0);
//! ```

pub mod distance;
mod float;
#[allow(clippy::new_ret_no_self)]
mod k_means;
pub mod param_guard;
pub mod prelude;
pub mod traits;

pub use float::Float;
pub use k_means::*;
pub use param_guard::ParamGuard;
