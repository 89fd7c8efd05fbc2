//! Certified lattice enumeration and distance computation.
//!
//! Given an upper-triangular Cholesky factor `R` of a positive-definite
//! quadratic form (so `Q(n) = ||R n||^2`) and an offset vector `v` already
//! expressed in the `R` basis, this module answers two questions with
//! rigorous error control:
//!
//! - **Enumeration** ([`Ellipsoid`]): which integer points `n` satisfy
//!   `||v + R n||^2 <= r2`? The constructed tree certifies a superset — no
//!   true point is ever excluded, whatever the internal rounding did.
//! - **Distance** ([`distance()`]): how close is the nearest lattice point to
//!   `-v`? The result is an enclosure of `min_n ||v + R n||^2`, optionally
//!   excluding the origin `n = 0`.
//!
//! Both walk the same recursion: the admissible range of the last coordinate
//! is bracketed ([`admissible_interval`]), each candidate reduces the
//! problem by one dimension ([`recursion_step`]), and dimension 1 is solved
//! directly. Enumeration materializes every branch; the distance search
//! instead tightens its bound as candidates are explored, shrinking the
//! remaining range after every improvement.
//!
//! # Example
//!
//! ```
//! use rigoris::{ball_vec_zeros, BallMatrix, Ellipsoid};
//! use rug::Float;
//!
//! // Unit lattice in the plane: points with n1^2 + n2^2 <= 4.
//! let cho = BallMatrix::from_f64_rows(2, 2, &[1.0, 0.0, 0.0, 1.0], 64);
//! let v = ball_vec_zeros(2, 64);
//! let e = Ellipsoid::build(&cho, &Float::with_val(64, 4.0), &v, 64).unwrap();
//! assert_eq!(e.point_count(), 13);
//! ```

mod distance;
mod interval;
mod tree;

pub use distance::{
    distance, is_zero_point, point_distance, shifted_distances, shortest_vector_norm,
    uniform_distance,
};
pub use interval::{admissible_interval, recursion_step, AdmissibleRange};
pub use tree::Ellipsoid;

use core::fmt;

/// An admissible-interval bound could not be represented as a machine
/// integer (non-finite quantity, or magnitude at the word-size safety
/// threshold).
///
/// Not a fatal error: enumeration reports it to the caller (retry at higher
/// precision or a smaller radius), the distance search falls back to the
/// uniform bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundOverflow;

impl fmt::Display for BoundOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "admissible interval bound is not representable as a machine integer")
    }
}

impl std::error::Error for BoundOverflow {}
