//! # rigoris
//!
//! Rigorous ball arithmetic and certified lattice geometry, the numerical
//! core needed by theta-function summation over the Siegel upper half-space.
//! Every computed quantity is an enclosure: results stay mathematically
//! valid regardless of internal floating-point round-off, at any working
//! precision.
//!
//! ## Quick start
//!
//! ```
//! use rigoris::{ball_vec_from_f64, distance, BallMatrix, Ellipsoid};
//! use rug::Float;
//!
//! // Quadratic form Q(n) = ||R n||^2 with upper-triangular R.
//! let r = BallMatrix::from_f64_rows(2, 2, &[1.0, 0.5, 0.0, 1.0], 64);
//! let v = ball_vec_from_f64(&[0.25, -0.5], 64);
//!
//! // Certified superset of the points with ||v + R n||^2 <= 2.
//! let e = Ellipsoid::build(&r, &Float::with_val(64, 2.0), &v, 64).unwrap();
//! assert!(e.point_count() > 0);
//!
//! // Rigorous enclosure of the minimal squared distance.
//! let d = distance(&v, &r, false, 64);
//! assert!(d.is_finite());
//! ```
//!
//! ## Modules
//!
//! - [`ball`] — Midpoint-radius rigorous reals ([`Ball`]) over MPFR
//!   ([`rug::Float`]), with directed bounds, certain comparisons, and the
//!   checked float-to-integer primitive. [`ball::matrix`] adds matrices and
//!   vectors of balls, including a rigorous Cholesky factorization.
//!
//! - [`lattice`] — The certified lattice engine: [`admissible_interval`]
//!   brackets one coordinate, [`recursion_step`] reduces the dimension,
//!   [`Ellipsoid`] enumerates all points within a radius (never excluding a
//!   true point), and [`distance`] computes a tight enclosure of the
//!   minimal squared distance by incremental pruning.
//!
//! - [`dense`] — Plain generic dense matrices ([`DenseMatrix`]) for integer
//!   point sets and floating-point scratch.
//!
//! - [`traits`] — Element traits for the dense layer ([`Scalar`],
//!   [`FloatScalar`]).
//!
//! ## Precision model
//!
//! There is no global precision state. Each operation takes `prec: u32`
//! (bits of midpoint precision); radii carry the accumulated error. Failing
//! operations degrade explicitly: enumeration reports construction failure
//! rather than returning a partial tree, and the distance search falls back
//! to an always-valid uniform bound.

pub mod ball;
pub mod dense;
pub mod lattice;
pub mod traits;

pub use ball::matrix::{ball_vec_from_f64, ball_vec_zeros, dot, BallMatrix, LinalgError};
pub use ball::{to_i64_checked, Ball};
pub use dense::DenseMatrix;
pub use lattice::{
    admissible_interval, distance, is_zero_point, point_distance, recursion_step,
    shifted_distances, shortest_vector_norm, uniform_distance, AdmissibleRange, BoundOverflow,
    Ellipsoid,
};
pub use traits::{FloatScalar, Scalar};

pub use rug;
