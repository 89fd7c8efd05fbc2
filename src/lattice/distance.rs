//! Certified minimal squared distance from a vector to a shifted lattice.
//!
//! The search mirrors the enumeration recursion but never materializes the
//! point set: starting from a cheap upper bound, each explored candidate for
//! the last coordinate tightens the running bracket `[d_low, d_up]`, and the
//! admissible interval is re-derived whenever the upper bound improves, so
//! later candidates are pruned by the best distance found rather than the
//! initial conservative bound.

use core::cmp::Ordering;

use rug::Float;

use crate::ball::matrix::{ball_vec_zeros, dot, BallMatrix};
use crate::ball::Ball;
use crate::lattice::interval::{admissible_interval, recursion_step, AdmissibleRange};
use crate::lattice::BoundOverflow;

/// Magnitude guard for rounding the continuous solution to integers.
const MAX_ROUND_MAG: f64 = (1_u64 << 30) as f64;

/// Whether an integer point is the origin.
pub fn is_zero_point(pt: &[i64]) -> bool {
    pt.iter().all(|&x| x == 0)
}

/// Enclosure of `||cho * pt + v||^2` for an integer point `pt`.
pub fn point_distance(v: &[Ball], cho: &BallMatrix, pt: &[i64], prec: u32) -> Ball {
    let w: Vec<Ball> = cho
        .mul_vec_i64(pt, prec)
        .iter()
        .zip(v)
        .map(|(a, b)| a.add(b, prec))
        .collect();
    dot(&w, &w, prec)
}

/// Uniform distance bound: a ball containing `Dist(v, cho Z^g)^2` for
/// *every* vector `v`, from the extremal corners of the fundamental domain.
/// Always computable; the fallback when the adaptive search cannot run.
pub fn uniform_distance(cho: &BallMatrix, omit_zero: bool, prec: u32) -> Ball {
    let g = cho.nrows();
    let v: Vec<Ball> = (0..g)
        .map(|_| {
            let b = Ball::zero_pm_one(prec);
            if omit_zero {
                b
            } else {
                b.mul_2exp(-1)
            }
        })
        .collect();
    let w = cho.mul_vec(&v, prec);
    dot(&w, &w, prec)
}

/// Upper bound on `Dist(v, cho Z^g)^2` as a plain float.
///
/// Rounds the `f64` solution of the continuous relaxation `cho x = v` to an
/// approximate nearest point and evaluates the rigorous distance there
/// (under `omit_zero` the origin is bumped to the neighboring point
/// `(1, 0, ..., 0)`). Falls back to the uniform bound when the rounding is
/// numerically unsafe. Any integer candidate yields a valid bound, so the
/// heuristic affects tightness only.
fn distance_upper_bound(v: &[Ball], cho: &BallMatrix, omit_zero: bool, prec: u32) -> Float {
    let g = cho.nrows();
    let cho_mid = cho.midpoint_f64();
    let v_mid: Vec<f64> = v.iter().map(Ball::to_f64).collect();
    let x = cho_mid.solve_upper_triangular(&v_mid);

    let mut pt = vec![0_i64; g];
    let mut safe = true;
    for (k, &xk) in x.iter().enumerate() {
        if !xk.is_finite() || xk.abs() > MAX_ROUND_MAG {
            safe = false;
            break;
        }
        pt[k] = -(xk.round() as i64);
    }

    let d = if safe {
        if omit_zero && is_zero_point(&pt) {
            pt[0] = 1;
        }
        point_distance(v, cho, &pt, prec)
    } else {
        uniform_distance(cho, omit_zero, prec)
    };
    d.upper_bound(prec)
}

/// Explore candidate `n` for the last coordinate and tighten the bracket.
///
/// The reduced problem is solved recursively against the *current* bound
/// ball `d`; the candidate's total distance is `x = rec + (d - next_dmax)`,
/// whose directed bounds update `d_low`/`d_up`. An improved upper bound
/// re-derives the admissible interval, shrinking the range the caller still
/// has to scan.
#[allow(clippy::too_many_arguments)]
fn distance_update(
    range: &mut AdmissibleRange,
    d: &mut Ball,
    d_up: &mut Float,
    d_low: &mut Float,
    cho: &BallMatrix,
    v: &[Ball],
    n: i64,
    g: usize,
    omit_zero: bool,
    prec: u32,
) -> Result<(), BoundOverflow> {
    let (next_dmax, next_v) = recursion_step(cho, d, v, n, g, prec);
    let t = next_dmax.upper_bound(prec);
    let x = distance_rec(cho, &next_v, &t, g - 1, omit_zero && n == 0, prec)?;
    let x = x.sub(&next_dmax, prec).add(d, prec);

    let mut update = false;

    let tl = x.lower_bound(prec);
    if tl < *d_low {
        update = true;
        *d_low = if tl.cmp0() == Some(Ordering::Greater) {
            tl
        } else {
            Float::new(prec)
        };
    }

    let tu = x.upper_bound(prec);
    if tu < *d_up {
        update = true;
        *d_up = tu;
        *range = admissible_interval(&cho[(g - 1, g - 1)], d_up, &v[g - 1], prec)?;
    }

    if update {
        *d = Ball::from_float(d_low.clone()).union(&Ball::from_float(d_up.clone()), prec);
    }
    Ok(())
}

fn distance_rec(
    cho: &BallMatrix,
    v: &[Ball],
    dmax: &Float,
    g: usize,
    omit_zero: bool,
    prec: u32,
) -> Result<Ball, BoundOverflow> {
    let mut range = admissible_interval(&cho[(g - 1, g - 1)], dmax, &v[g - 1], prec)?;

    if range.is_empty() {
        // No lattice point within dmax: the minimum is dmax itself.
        return Ok(Ball::from_float(dmax.clone()));
    }

    if g == 1 {
        let c = &cho[(0, 0)];
        let m = if omit_zero && range.mid == 0 {
            range.mid + 1
        } else {
            range.mid
        };
        let mut d = c.mul_i64(m, prec).add(&v[0], prec).sqr(prec);
        if !omit_zero || range.mid + 1 != 0 {
            let t = c.mul_i64(range.mid + 1, prec).add(&v[0], prec).sqr(prec);
            d = d.min(&t, prec);
        }
        if !omit_zero || range.mid - 1 != 0 {
            let t = c.mul_i64(range.mid - 1, prec).add(&v[0], prec).sqr(prec);
            d = d.min(&t, prec);
        }
        return Ok(d);
    }

    // Plain-float bounds lose less precision through repeated updates than
    // ball arithmetic on d would.
    let mut d = Ball::from_float(dmax.clone());
    let mut d_low = dmax.clone();
    let mut d_up = dmax.clone();

    let mut k = 0;
    while range.mid + k <= range.max {
        let n = range.mid + k;
        distance_update(
            &mut range, &mut d, &mut d_up, &mut d_low, cho, v, n, g, omit_zero, prec,
        )?;
        k += 1;
    }

    let mut k = 0;
    while range.mid - (k + 1) >= range.min {
        let n = range.mid - (k + 1);
        distance_update(
            &mut range, &mut d, &mut d_up, &mut d_low, cho, v, n, g, omit_zero, prec,
        )?;
        k += 1;
    }

    Ok(d)
}

/// Enclosure of the minimal squared distance from `-v` to the lattice
/// `cho Z^g`, i.e. of `min ||v + cho n||^2` over integer points `n`
/// (excluding `n = 0` when `omit_zero` is set).
///
/// The result is sound for any precision; tightness degrades gracefully.
/// If an admissible-interval bound is unrepresentable anywhere in the
/// search, the uniform bound is returned for the whole call. The result is
/// clamped non-negative.
///
/// ```
/// use rigoris::{ball_vec_zeros, distance, BallMatrix};
///
/// let cho = BallMatrix::from_f64_rows(1, 1, &[1.0], 64);
/// let v = ball_vec_zeros(1, 64);
/// // The origin is at distance 0; the nearest nonzero point at distance 1.
/// assert!(distance(&v, &cho, false, 64).contains_f64(0.0));
/// assert!(distance(&v, &cho, true, 64).contains_f64(1.0));
/// ```
pub fn distance(v: &[Ball], cho: &BallMatrix, omit_zero: bool, prec: u32) -> Ball {
    let g = cho.nrows();
    assert!(cho.is_square(), "Cholesky factor must be square");
    assert!(g >= 1, "ambient dimension must be at least 1");
    assert_eq!(v.len(), g, "offset vector length mismatch");

    let dmax = distance_upper_bound(v, cho, omit_zero, prec);
    let d = match distance_rec(cho, v, &dmax, g, omit_zero, prec) {
        Ok(d) => d,
        Err(BoundOverflow) => uniform_distance(cho, omit_zero, prec),
    };
    d.nonnegative_part(prec)
}

/// Enclosure of the length of the shortest nonzero vector of `cho Z^g`.
pub fn shortest_vector_norm(cho: &BallMatrix, prec: u32) -> Ball {
    let zero = ball_vec_zeros(cho.nrows(), prec);
    distance(&zero, cho, true, prec).sqrt(prec)
}

/// Bit `k` of the characteristic `a`, most significant bit first.
fn char_bit(a: u64, k: usize, g: usize) -> bool {
    (a >> (g - 1 - k)) & 1 == 1
}

/// Distances from `v` shifted by every half-integer characteristic: entry
/// `a` is `distance(v + cho * (a/2), cho, false)` for `a` running over
/// `{0, 1}^g` (big-endian bit order). Theta summation needs all `2^g` of
/// them to pick its truncation radii.
pub fn shifted_distances(v: &[Ball], cho: &BallMatrix, prec: u32) -> Vec<Ball> {
    let g = cho.nrows();
    assert_eq!(v.len(), g, "offset vector length mismatch");
    assert!(g < 64, "ambient dimension too large for characteristics");

    (0..1_u64 << g)
        .map(|a| {
            let half: Vec<Ball> = (0..g)
                .map(|k| {
                    if char_bit(a, k, g) {
                        Ball::from_i64(prec, 1).mul_2exp(-1)
                    } else {
                        Ball::zero(prec)
                    }
                })
                .collect();
            let shift = cho.mul_vec(&half, prec);
            let w: Vec<Ball> = v
                .iter()
                .zip(&shift)
                .map(|(x, s)| x.add(s, prec))
                .collect();
            distance(&w, cho, false, prec)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ball::matrix::ball_vec_from_f64;

    const P: u32 = 64;

    fn identity(g: usize) -> BallMatrix {
        BallMatrix::from_fn(g, g, |i, j| {
            if i == j {
                Ball::from_i64(P, 1)
            } else {
                Ball::zero(P)
            }
        })
    }

    #[test]
    fn omit_zero_semantics() {
        let cho = identity(1);
        let v = ball_vec_zeros(1, P);

        let d0 = distance(&v, &cho, false, P);
        assert!(d0.contains_f64(0.0));
        assert!(!d0.contains_f64(0.5));

        let d1 = distance(&v, &cho, true, P);
        assert!(d1.contains_f64(1.0));
        assert!(!d1.contains_f64(0.5));
    }

    #[test]
    fn dimension_one_exact() {
        // Lattice 2Z shifted by 0.5: nearest point n = 0 at squared
        // distance 0.25, next at (2*(-1) + 0.5)^2 = 2.25.
        let cho = BallMatrix::from_f64_rows(1, 1, &[2.0], P);
        let v = ball_vec_from_f64(&[0.5], P);
        let d = distance(&v, &cho, false, P);
        assert!(d.contains_f64(0.25));
        assert!(d.radius().to_f64() < 1e-10);
    }

    #[test]
    fn plane_shifted_to_deep_hole() {
        let cho = identity(2);
        let v = ball_vec_from_f64(&[0.5, 0.5], P);
        let d = distance(&v, &cho, false, P);
        assert!(d.contains_f64(0.5));
        assert!(!d.contains_f64(0.4));
    }

    #[test]
    fn correlated_shortest() {
        // Q(n) = (n1 + n2)^2 + n2^2: shortest nonzero value is 1.
        let cho = BallMatrix::from_f64_rows(2, 2, &[1.0, 1.0, 0.0, 1.0], P);
        let v = ball_vec_zeros(2, P);
        let d = distance(&v, &cho, true, P);
        assert!(d.contains_f64(1.0));
        assert!(d.is_positive());
    }

    #[test]
    fn uniform_bound_covers_worst_case() {
        let cho = identity(2);
        let u = uniform_distance(&cho, false, P);
        // The deep hole (0.5, 0.5) realizes squared distance 0.5.
        assert!(u.contains_f64(0.5));

        let u1 = uniform_distance(&cho, true, P);
        // Omitting the origin, a corner of the fundamental domain can be
        // as far as ||(1, 1)||^2 = 2 from the remaining points.
        assert!(u1.contains_f64(2.0));
    }

    #[test]
    fn point_distance_known_value() {
        let cho = identity(2);
        let v = ball_vec_from_f64(&[0.25, 0.0], P);
        let d = point_distance(&v, &cho, &[1, 1], P);
        assert!(d.contains_f64(1.5625 + 1.0));
    }

    #[test]
    fn zero_point_test() {
        assert!(is_zero_point(&[0, 0, 0]));
        assert!(!is_zero_point(&[0, -1, 0]));
        assert!(is_zero_point(&[]));
    }

    #[test]
    fn shortest_vector_of_unit_lattice() {
        let rho = shortest_vector_norm(&identity(3), P);
        assert!(rho.contains_f64(1.0));
        assert!(rho.is_positive());
    }

    #[test]
    fn shifted_distances_one_dimensional() {
        // Lattice 2Z: characteristic 0 sits on a lattice point,
        // characteristic 1 sits at the midpoint, squared distance 1.
        let cho = BallMatrix::from_f64_rows(1, 1, &[2.0], P);
        let v = ball_vec_zeros(1, P);
        let ds = shifted_distances(&v, &cho, P);
        assert_eq!(ds.len(), 2);
        assert!(ds[0].contains_f64(0.0));
        assert!(ds[1].contains_f64(1.0));
    }

    #[test]
    fn shifted_distances_bit_order() {
        // g = 2, diag(2, 4): a = 1 shifts the *last* coordinate.
        let cho = BallMatrix::from_f64_rows(2, 2, &[2.0, 0.0, 0.0, 4.0], P);
        let v = ball_vec_zeros(2, P);
        let ds = shifted_distances(&v, &cho, P);
        assert_eq!(ds.len(), 4);
        assert!(ds[0].contains_f64(0.0));
        assert!(ds[1].contains_f64(4.0)); // (0, 2): midpoint of the 4Z axis
        assert!(ds[2].contains_f64(1.0)); // (1, 0): midpoint of the 2Z axis
        assert!(ds[3].contains_f64(5.0)); // both
    }

    #[test]
    fn determinism() {
        let cho = BallMatrix::from_f64_rows(2, 2, &[1.5, 0.25, 0.0, 0.75], P);
        let v = ball_vec_from_f64(&[0.2, -0.4], P);
        let d1 = distance(&v, &cho, false, P);
        let d2 = distance(&v, &cho, false, P);
        assert_eq!(d1, d2);
    }
}
