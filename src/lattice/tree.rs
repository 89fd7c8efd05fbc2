//! Recursive enumeration tree for lattice points inside an ellipsoid.

use rug::Float;

use crate::ball::matrix::BallMatrix;
use crate::ball::Ball;
use crate::dense::DenseMatrix;
use crate::lattice::interval::{admissible_interval, recursion_step};
use crate::lattice::BoundOverflow;

/// Certified superset of the integer points `n` with `||v + R n||^2 <= r2`.
///
/// One node per admissible value of the last free coordinate at its level:
/// a node of dimension `d` brackets coordinate `d - 1` and owns one child of
/// dimension `d - 1` per admissible integer, down to the dimension-1 leaves.
/// Children are split into a right side (`mid, mid+1, ..., max`) and a left
/// side (`mid-1, mid-2, ..., min`), visited in that order both during
/// construction and extraction.
///
/// Construction never excludes a true lattice point: every interval is
/// computed with outward rounding, and any bound that cannot be represented
/// aborts the whole build (a partial tree would silently undercount).
/// An empty bracket is a legitimate terminal node with zero points.
///
/// # Example
///
/// ```
/// use rigoris::{ball_vec_zeros, BallMatrix, Ellipsoid};
/// use rug::Float;
///
/// let cho = BallMatrix::from_f64_rows(1, 1, &[1.0], 64);
/// let v = ball_vec_zeros(1, 64);
/// let e = Ellipsoid::build(&cho, &Float::with_val(64, 6.25), &v, 64).unwrap();
///
/// assert_eq!(e.point_count(), 5); // -2..=2
/// assert_eq!(e.coordinate_bound(0), 2);
/// let pts = e.points();
/// assert_eq!(pts.row(0), &[-2]);
/// ```
#[derive(Debug, Clone)]
pub struct Ellipsoid {
    dim: usize,
    ambient: usize,
    min: i64,
    mid: i64,
    max: i64,
    /// Coordinates fixed by the path from the root: entry `k` is the value
    /// committed for coordinate `dim + k`.
    last_coords: Vec<i64>,
    rchildren: Vec<Ellipsoid>,
    lchildren: Vec<Ellipsoid>,
    nb_pts: usize,
    nb_border: usize,
    /// `boxes[k]` bounds the absolute value of coordinate `k` over the
    /// subtree; callers size output buffers from it.
    boxes: Vec<i64>,
}

enum Side {
    Right,
    Left,
}

impl Ellipsoid {
    /// Enumerate the lattice points of squared radius at most `r2` around
    /// `-v`, in the basis of the upper-triangular Cholesky factor `cho`.
    ///
    /// Fails with [`BoundOverflow`] when any admissible-interval bound is
    /// unrepresentable; no partial tree is returned. Callers typically
    /// retry at higher precision or with a smaller radius.
    pub fn build(
        cho: &BallMatrix,
        r2: &Float,
        v: &[Ball],
        prec: u32,
    ) -> Result<Ellipsoid, BoundOverflow> {
        let g = cho.nrows();
        assert!(cho.is_square(), "Cholesky factor must be square");
        assert!(g >= 1, "ambient dimension must be at least 1");
        assert_eq!(v.len(), g, "offset vector length mismatch");

        let mut coords = vec![0_i64; g];
        Self::build_rec(cho, r2, v, g, g, &mut coords, prec)
    }

    fn build_rec(
        cho: &BallMatrix,
        r2: &Float,
        v: &[Ball],
        d: usize,
        g: usize,
        coords: &mut [i64],
        prec: u32,
    ) -> Result<Ellipsoid, BoundOverflow> {
        let range = admissible_interval(&cho[(d - 1, d - 1)], r2, &v[d - 1], prec)?;

        let mut node = Ellipsoid {
            dim: d,
            ambient: g,
            min: range.min,
            mid: range.mid,
            max: range.max,
            last_coords: coords[d..g].to_vec(),
            rchildren: Vec::new(),
            lchildren: Vec::new(),
            nb_pts: 0,
            nb_border: if d == 1 { 2 } else { 0 },
            boxes: vec![0; d],
        };

        if range.is_empty() {
            return Ok(node);
        }

        node.boxes[d - 1] = range.max.max(-range.min);

        if d == 1 {
            node.nb_pts = (range.max - range.min + 1) as usize;
            return Ok(node);
        }

        let r2_ball = Ball::from_float(r2.clone());
        for n in range.mid..=range.max {
            node.attach_child(cho, &r2_ball, v, n, coords, prec, Side::Right)?;
        }
        for n in (range.min..range.mid).rev() {
            node.attach_child(cho, &r2_ball, v, n, coords, prec, Side::Left)?;
        }

        Ok(node)
    }

    fn attach_child(
        &mut self,
        cho: &BallMatrix,
        r2: &Ball,
        v: &[Ball],
        n: i64,
        coords: &mut [i64],
        prec: u32,
        side: Side,
    ) -> Result<(), BoundOverflow> {
        let d = self.dim;
        let (next_r2, next_v) = recursion_step(cho, r2, v, n, d, prec);
        let next_bound = next_r2.upper_bound(prec);

        coords[d - 1] = n;
        let child = Self::build_rec(cho, &next_bound, &next_v, d - 1, self.ambient, coords, prec)?;

        self.nb_pts += child.nb_pts;
        self.nb_border += child.nb_border;
        for k in 0..d - 1 {
            self.boxes[k] = self.boxes[k].max(child.boxes[k]);
        }
        match side {
            Side::Right => self.rchildren.push(child),
            Side::Left => self.lchildren.push(child),
        }
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Dimension of this node (the root has the ambient dimension).
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Ambient dimension `g`.
    #[inline]
    pub fn ambient_dim(&self) -> usize {
        self.ambient
    }

    /// Total number of enumerated points in the subtree.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.nb_pts
    }

    /// Number of border slots (two per dimension-1 node, empty ones
    /// included).
    #[inline]
    pub fn border_count(&self) -> usize {
        self.nb_border
    }

    /// Whether the subtree contains no point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nb_pts == 0
    }

    /// Maximum absolute admissible value of coordinate `k` over the subtree.
    #[inline]
    pub fn coordinate_bound(&self, k: usize) -> i64 {
        self.boxes[k]
    }

    // ── Extraction ──────────────────────────────────────────────────

    /// All enumerated points, one per row, in construction order (right
    /// children before left children, leaf ranges ascending).
    pub fn points(&self) -> DenseMatrix<i64> {
        let mut out = DenseMatrix::zeros(self.nb_pts, self.ambient);
        let mut row = 0;
        self.fill_points(&mut out, &mut row);
        debug_assert_eq!(row, self.nb_pts);
        out
    }

    fn fill_points(&self, out: &mut DenseMatrix<i64>, row: &mut usize) {
        if self.dim == 1 {
            for n in self.min..=self.max {
                out[(*row, 0)] = n;
                for (j, &c) in self.last_coords.iter().enumerate() {
                    out[(*row, 1 + j)] = c;
                }
                *row += 1;
            }
            return;
        }
        for child in &self.rchildren {
            child.fill_points(out, row);
        }
        for child in &self.lchildren {
            child.fill_points(out, row);
        }
    }

    /// The border points: for each dimension-1 node, the two integers
    /// adjacent to its enumerated range (`min - 1` and `max + 1`) with the
    /// coordinates fixed by its path. Callers needing the enclosing box of
    /// the point set rather than just its interior evaluate these.
    pub fn border_points(&self) -> DenseMatrix<i64> {
        let mut out = DenseMatrix::zeros(self.nb_border, self.ambient);
        let mut row = 0;
        self.fill_border(&mut out, &mut row);
        debug_assert_eq!(row, self.nb_border);
        out
    }

    fn fill_border(&self, out: &mut DenseMatrix<i64>, row: &mut usize) {
        if self.dim == 1 {
            for n in [self.min - 1, self.max + 1] {
                out[(*row, 0)] = n;
                for (j, &c) in self.last_coords.iter().enumerate() {
                    out[(*row, 1 + j)] = c;
                }
                *row += 1;
            }
            return;
        }
        for child in &self.rchildren {
            child.fill_border(out, row);
        }
        for child in &self.lchildren {
            child.fill_border(out, row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ball::matrix::{ball_vec_from_f64, ball_vec_zeros};
    use std::collections::HashSet;

    const P: u32 = 64;

    fn point_set(e: &Ellipsoid) -> HashSet<Vec<i64>> {
        e.points().rows().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn unit_disc_radius_two() {
        // n1^2 + n2^2 <= 4 has 13 integer solutions.
        let cho = BallMatrix::from_f64_rows(2, 2, &[1.0, 0.0, 0.0, 1.0], P);
        let v = ball_vec_zeros(2, P);
        let e = Ellipsoid::build(&cho, &Float::with_val(P, 4.0), &v, P).unwrap();

        assert_eq!(e.point_count(), 13);
        assert_eq!(e.coordinate_bound(0), 2);
        assert_eq!(e.coordinate_bound(1), 2);
        // Five admissible values of n2, two border slots each.
        assert_eq!(e.border_count(), 10);

        let pts = point_set(&e);
        assert_eq!(pts.len(), 13);
        for n1 in -3_i64..=3 {
            for n2 in -3_i64..=3 {
                let inside = n1 * n1 + n2 * n2 <= 4;
                assert_eq!(pts.contains(&vec![n1, n2]), inside, "point ({n1},{n2})");
            }
        }
    }

    #[test]
    fn empty_root() {
        let cho = BallMatrix::from_f64_rows(2, 2, &[1.0, 0.0, 0.0, 1.0], P);
        let v = ball_vec_from_f64(&[0.5, 0.5], P);
        let e = Ellipsoid::build(&cho, &Float::with_val(P, 0.1), &v, P).unwrap();

        assert!(e.is_empty());
        assert_eq!(e.point_count(), 0);
        assert_eq!(e.points().nrows(), 0);
        assert_eq!(e.coordinate_bound(1), 0);
    }

    #[test]
    fn empty_leaf_keeps_border_slots() {
        let cho = BallMatrix::from_f64_rows(1, 1, &[1.0], P);
        let v = ball_vec_from_f64(&[0.5], P);
        let e = Ellipsoid::build(&cho, &Float::with_val(P, 0.01), &v, P).unwrap();

        assert!(e.is_empty());
        assert_eq!(e.border_count(), 2);
        let border = e.border_points();
        assert_eq!(border.nrows(), 2);
        // Empty bracket around the center -0.5: min = 0, max = -1, so the
        // border slots are min - 1 = -1 and max + 1 = 0.
        assert_eq!(border.row(0), &[-1]);
        assert_eq!(border.row(1), &[0]);
    }

    #[test]
    fn shifted_center() {
        // (n + 0.5)^2 <= 1: n in {-1, 0}.
        let cho = BallMatrix::from_f64_rows(1, 1, &[1.0], P);
        let v = ball_vec_from_f64(&[0.5], P);
        let e = Ellipsoid::build(&cho, &Float::with_val(P, 1.0), &v, P).unwrap();

        let pts = point_set(&e);
        assert_eq!(pts.len(), 2);
        assert!(pts.contains(&vec![-1]));
        assert!(pts.contains(&vec![0]));
    }

    #[test]
    fn correlated_form() {
        // cho = [[1, 1], [0, 1]]: Q(n) = (n1 + n2)^2 + n2^2.
        let cho = BallMatrix::from_f64_rows(2, 2, &[1.0, 1.0, 0.0, 1.0], P);
        let v = ball_vec_zeros(2, P);
        let e = Ellipsoid::build(&cho, &Float::with_val(P, 2.0), &v, P).unwrap();

        let pts = point_set(&e);
        for n1 in -4_i64..=4 {
            for n2 in -4_i64..=4 {
                let q = (n1 + n2) * (n1 + n2) + n2 * n2;
                if q <= 2 {
                    assert!(pts.contains(&vec![n1, n2]), "missing ({n1},{n2})");
                }
            }
        }
        // (0,0), (±1,0), (0,±1), (±1,∓1), (±2,∓1): nine points in total.
        assert_eq!(pts.len(), 9);
    }

    #[test]
    fn deterministic_rebuild() {
        let cho = BallMatrix::from_f64_rows(2, 2, &[1.25, 0.75, 0.0, 0.5], P);
        let v = ball_vec_from_f64(&[0.3, -0.7], P);
        let r2 = Float::with_val(P, 5.0);

        let e1 = Ellipsoid::build(&cho, &r2, &v, P).unwrap();
        let e2 = Ellipsoid::build(&cho, &r2, &v, P).unwrap();
        assert_eq!(e1.point_count(), e2.point_count());
        assert_eq!(e1.points(), e2.points());
        assert_eq!(e1.border_points(), e2.border_points());
    }

    #[test]
    fn three_dimensional_ball() {
        // n1^2 + n2^2 + n3^2 <= 1: origin plus 6 unit vectors.
        let cho = BallMatrix::from_f64_rows(
            3,
            3,
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            P,
        );
        let v = ball_vec_zeros(3, P);
        let e = Ellipsoid::build(&cho, &Float::with_val(P, 1.0), &v, P).unwrap();

        assert_eq!(e.point_count(), 7);
        let pts = point_set(&e);
        assert!(pts.contains(&vec![0, 0, 0]));
        assert!(pts.contains(&vec![0, 0, 1]));
        assert!(pts.contains(&vec![-1, 0, 0]));
    }

    #[test]
    fn unrepresentable_bound_aborts_whole_build() {
        // A huge radius over a tiny diagonal entry pushes the bracket past
        // the machine-integer guard.
        let cho = BallMatrix::from_f64_rows(1, 1, &[1.0e-10], P);
        let v = ball_vec_zeros(1, P);
        let r2 = Float::with_val(P, Float::i_exp(1, 90));
        assert_eq!(
            Ellipsoid::build(&cho, &r2, &v, P).unwrap_err(),
            BoundOverflow
        );
    }
}
