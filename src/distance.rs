//! Euclidean distance between points
use ndarray::{ArrayView1, Zip};

use crate::Float;

/// A point in feature space
pub type Point<'a, F> = ArrayView1<'a, F>;

/// Euclidean (L2) distance
///
/// Searches compare the squared distance (`rdistance`), which keeps the order of the true
/// distance without the square root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct L2Dist;

impl L2Dist {
    // Panics if a and b are not of equal dimension
    pub fn distance<F: Float>(&self, a: Point<F>, b: Point<F>) -> F {
        self.rdist_to_dist(self.rdistance(a, b))
    }

    pub fn rdistance<F: Float>(&self, a: Point<F>, b: Point<F>) -> F {
        Zip::from(&a).and(&b).fold(F::zero(), |acc, &a, &b| {
            let diff = a - b;
            acc + diff * diff
        })
    }

    pub fn rdist_to_dist<F: Float>(&self, rdist: F) -> F {
        rdist.sqrt()
    }
}
