use std::fmt;
use std::iter::Sum;

use ndarray::ScalarOperand;
use num_traits::{NumAssignOps, NumCast};

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. Records and centroids are stored in
/// this type.
pub trait Float:
    num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Sum
    + NumAssignOps
    + ScalarOperand
{
    /// Infallible conversion for the small integer and float constants used by the algorithms.
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap_or_else(Self::nan)
    }
}

impl Float for f32 {}

impl Float for f64 {}
