//! `lloyd-datasets` generates synthetic point sets ready to be used in the tests, benchmarks and
//! demos of the `lloyd` k-means crate.
//!
//! ## Current State
//!
//! The [`generate`] module provides:
//!
//! * [`generate::blobs`]: well separated groups of points around given centers, the best-case
//!   input of a clustering algorithm;
//! * [`generate::correlated_line`]: noisy points along the diagonal `y = x`, a positively
//!   correlated set with no natural clusters.
//!
//! ## Using a generator
//!
//! ```
//! use lloyd_datasets::generate;
//! use ndarray_rand::rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let points = generate::correlated_line(50, 3., &mut rng);
//! assert_eq!(points.dim(), (50, 2));
//! ```

pub mod generate;
