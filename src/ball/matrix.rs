//! Matrices and vectors of rigorous reals.
//!
//! [`BallMatrix`] is a runtime-dimension, row-major matrix of [`Ball`]
//! entries with the handful of operations the lattice engine needs:
//! matrix-vector products (against ball vectors and against integer points),
//! a midpoint snapshot for floating-point heuristics, and a rigorous
//! Cholesky factorization producing the upper-triangular factor consumed by
//! the enumeration and distance routines.

use core::fmt;
use core::ops::{Index, IndexMut};

use crate::ball::Ball;
use crate::dense::DenseMatrix;

/// Errors from rigorous linear algebra operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinalgError {
    /// A Cholesky pivot could not be certified strictly positive at the
    /// working precision. Either the matrix is not positive definite or the
    /// precision is too low to tell.
    NotPositiveDefinite,
}

impl fmt::Display for LinalgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositiveDefinite => {
                write!(f, "matrix is not certainly positive definite")
            }
        }
    }
}

impl std::error::Error for LinalgError {}

// ── Vector helpers ──────────────────────────────────────────────────

/// Vector of exact zero balls.
pub fn ball_vec_zeros(n: usize, prec: u32) -> Vec<Ball> {
    (0..n).map(|_| Ball::zero(prec)).collect()
}

/// Vector of balls from `f64` values (exact whenever `prec >= 53`).
pub fn ball_vec_from_f64(xs: &[f64], prec: u32) -> Vec<Ball> {
    xs.iter().map(|&x| Ball::from_f64(prec, x)).collect()
}

/// Rigorous dot product.
pub fn dot(a: &[Ball], b: &[Ball], prec: u32) -> Ball {
    assert_eq!(a.len(), b.len(), "vector length mismatch");
    let mut acc = Ball::zero(prec);
    for (x, y) in a.iter().zip(b) {
        acc = acc.add(&x.mul(y, prec), prec);
    }
    acc
}

// ── BallMatrix ──────────────────────────────────────────────────────

/// Runtime-dimension matrix of rigorous reals, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct BallMatrix {
    data: Vec<Ball>,
    nrows: usize,
    ncols: usize,
}

impl BallMatrix {
    /// Create an `nrows x ncols` matrix of exact zeros.
    pub fn zeros(nrows: usize, ncols: usize, prec: u32) -> Self {
        Self {
            data: (0..nrows * ncols).map(|_| Ball::zero(prec)).collect(),
            nrows,
            ncols,
        }
    }

    /// Create a matrix from a function of the row and column index.
    pub fn from_fn(nrows: usize, ncols: usize, f: impl Fn(usize, usize) -> Ball) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    /// Create a matrix of exact `f64` entries in row-major order.
    ///
    /// ```
    /// use rigoris::BallMatrix;
    ///
    /// let m = BallMatrix::from_f64_rows(2, 2, &[2.0, 0.5, 0.0, 1.0], 64);
    /// assert_eq!(m.nrows(), 2);
    /// assert!(m[(0, 1)].contains_f64(0.5));
    /// ```
    pub fn from_f64_rows(nrows: usize, ncols: usize, row_major: &[f64], prec: u32) -> Self {
        assert_eq!(
            row_major.len(),
            nrows * ncols,
            "slice length {} does not match {}x{} matrix",
            row_major.len(),
            nrows,
            ncols,
        );
        Self {
            data: row_major.iter().map(|&x| Ball::from_f64(prec, x)).collect(),
            nrows,
            ncols,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Whether the matrix is square.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Matrix-vector product with a ball vector.
    pub fn mul_vec(&self, v: &[Ball], prec: u32) -> Vec<Ball> {
        assert_eq!(v.len(), self.ncols, "vector length mismatch");
        (0..self.nrows)
            .map(|i| {
                let mut acc = Ball::zero(prec);
                for j in 0..self.ncols {
                    acc = acc.add(&self[(i, j)].mul(&v[j], prec), prec);
                }
                acc
            })
            .collect()
    }

    /// Matrix-vector product with an integer point.
    pub fn mul_vec_i64(&self, pt: &[i64], prec: u32) -> Vec<Ball> {
        assert_eq!(pt.len(), self.ncols, "point length mismatch");
        (0..self.nrows)
            .map(|i| {
                let mut acc = Ball::zero(prec);
                for j in 0..self.ncols {
                    acc = acc.add(&self[(i, j)].mul_i64(pt[j], prec), prec);
                }
                acc
            })
            .collect()
    }

    /// Snapshot of the midpoints as a plain `f64` matrix.
    ///
    /// This is an approximation with no enclosure guarantee; it feeds
    /// heuristics only.
    pub fn midpoint_f64(&self) -> DenseMatrix<f64> {
        DenseMatrix::from_fn(self.nrows, self.ncols, |i, j| self[(i, j)].to_f64())
    }

    /// Transpose.
    pub fn transpose(&self) -> BallMatrix {
        Self::from_fn(self.ncols, self.nrows, |i, j| self[(j, i)].clone())
    }

    /// Rigorous Cholesky factorization of a symmetric positive-definite
    /// matrix: returns the upper-triangular `R` with `R^T R = A` (entries
    /// below the diagonal exactly zero).
    ///
    /// Fails with [`LinalgError::NotPositiveDefinite`] when a pivot is not
    /// certainly positive — either the matrix is not positive definite or
    /// the working precision cannot certify it.
    ///
    /// ```
    /// use rigoris::BallMatrix;
    ///
    /// let a = BallMatrix::from_f64_rows(2, 2, &[4.0, 2.0, 2.0, 3.0], 64);
    /// let r = a.cholesky_upper(64).unwrap();
    /// assert!(r[(0, 0)].contains_f64(2.0));
    /// assert!(r[(0, 1)].contains_f64(1.0));
    /// ```
    pub fn cholesky_upper(&self, prec: u32) -> Result<BallMatrix, LinalgError> {
        assert!(self.is_square(), "Cholesky factorization requires a square matrix");
        let n = self.nrows;
        let mut r = BallMatrix::zeros(n, n, prec);

        for j in 0..n {
            for i in 0..=j {
                let mut s = self[(i, j)].clone();
                for k in 0..i {
                    s = s.sub(&r[(k, i)].mul(&r[(k, j)], prec), prec);
                }
                if i == j {
                    if !s.is_positive() {
                        return Err(LinalgError::NotPositiveDefinite);
                    }
                    let pivot = s.sqrt(prec);
                    r[(j, j)] = pivot;
                } else {
                    let entry = s.div(&r[(i, i)], prec);
                    r[(i, j)] = entry;
                }
            }
        }

        Ok(r)
    }
}

impl Index<(usize, usize)> for BallMatrix {
    type Output = Ball;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &Ball {
        &self.data[row * self.ncols + col]
    }
}

impl IndexMut<(usize, usize)> for BallMatrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Ball {
        &mut self.data[row * self.ncols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: u32 = 64;

    #[test]
    fn mul_vec_i64_matches_mul_vec() {
        let m = BallMatrix::from_f64_rows(2, 2, &[2.0, 1.0, 0.0, 3.0], P);
        let pt = [1_i64, -2];
        let v = ball_vec_from_f64(&[1.0, -2.0], P);

        let a = m.mul_vec_i64(&pt, P);
        let b = m.mul_vec(&v, P);
        for (x, y) in a.iter().zip(&b) {
            assert!(x.contains_f64(y.to_f64()));
        }
        assert!(a[0].contains_f64(0.0));
        assert!(a[1].contains_f64(-6.0));
    }

    #[test]
    fn dot_known_value() {
        let a = ball_vec_from_f64(&[1.0, 2.0, 3.0], P);
        let d = dot(&a, &a, P);
        assert!(d.contains_f64(14.0));
        assert!(d.is_positive());
    }

    #[test]
    fn cholesky_reconstructs() {
        // A = [[4, 2], [2, 3]] -> R = [[2, 1], [0, sqrt(2)]]
        let a = BallMatrix::from_f64_rows(2, 2, &[4.0, 2.0, 2.0, 3.0], P);
        let r = a.cholesky_upper(P).unwrap();

        assert!(r[(0, 0)].contains_f64(2.0));
        assert!(r[(0, 1)].contains_f64(1.0));
        assert!(r[(1, 0)].contains_f64(0.0));
        assert!(r[(1, 1)].contains_f64(std::f64::consts::SQRT_2));

        // R^T R must enclose A.
        let rt = r.transpose();
        for i in 0..2 {
            for j in 0..2 {
                let mut s = Ball::zero(P);
                for k in 0..2 {
                    s = s.add(&rt[(i, k)].mul(&r[(k, j)], P), P);
                }
                assert!(s.contains_f64(a[(i, j)].to_f64()), "entry ({i},{j})");
            }
        }
    }

    #[test]
    fn cholesky_rejects_indefinite() {
        let a = BallMatrix::from_f64_rows(2, 2, &[1.0, 5.0, 5.0, 1.0], P);
        assert_eq!(a.cholesky_upper(P).unwrap_err(), LinalgError::NotPositiveDefinite);
    }

    #[test]
    fn cholesky_identity() {
        let id = BallMatrix::from_fn(3, 3, |i, j| {
            if i == j {
                Ball::from_i64(P, 1)
            } else {
                Ball::zero(P)
            }
        });
        let r = id.cholesky_upper(P).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert!(r[(i, j)].contains_f64(expect));
            }
        }
    }
}
