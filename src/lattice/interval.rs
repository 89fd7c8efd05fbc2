//! Admissible interval for one lattice coordinate, and the one-step
//! dimension reduction shared by enumeration and distance search.

use rug::float::Round;
use rug::Float;

use crate::ball::matrix::BallMatrix;
use crate::ball::{to_i64_checked, Ball};
use crate::lattice::BoundOverflow;

/// Largest center error radius (in integer units) accepted before the
/// interval is declared unusable.
const MAX_CENTER_ERR: i64 = 100;

/// Integer bracket for one coordinate.
///
/// Every integer `n` with `(v + c n)^2 <= r2` satisfies `min <= n <= max`;
/// `mid` is the rounded center `-v/c`. An inverted range (`min > max`)
/// certifies that no admissible integer exists; `mid` need not lie inside
/// the range in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissibleRange {
    pub min: i64,
    pub mid: i64,
    pub max: i64,
}

impl AdmissibleRange {
    /// Whether the bracket contains no integer.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// Bracket the integers `n` for which `(v + c n)^2 <= r2` can hold.
///
/// `c` must be certainly positive (a diagonal entry of the Cholesky
/// factor); `r2` is a plain upper-bound scalar. All roundings are directed
/// outward, so the true admissible set is never cut: `max` comes from an
/// upper bound rounded toward `+inf` and then floored, `min` from a lower
/// bound rounded toward `-inf` and then ceiled.
///
/// A negative `r2` yields the certified-empty inverted range
/// `(mid + 1, mid, mid)`.
///
/// Fails with [`BoundOverflow`] when the center's error radius does not
/// round to an integer at most 100, or when any bound falls outside the
/// safe `i64` range; the caller must fall back rather than risk silent
/// truncation.
///
/// ```
/// use rigoris::{admissible_interval, Ball};
/// use rug::Float;
///
/// // |0.5 + n| <= 2: n in [-2, 1], center -0.5 rounds to 0.
/// let c = Ball::from_i64(64, 1);
/// let v = Ball::from_f64(64, 0.5);
/// let r = admissible_interval(&c, &Float::with_val(64, 4.0), &v, 64).unwrap();
/// assert_eq!((r.min, r.mid, r.max), (-2, 0, 1));
/// ```
pub fn admissible_interval(
    c: &Ball,
    r2: &Float,
    v: &Ball,
    prec: u32,
) -> Result<AdmissibleRange, BoundOverflow> {
    let ctr = v.neg().div(c, prec);

    let err = to_i64_checked(ctr.radius(), Round::Nearest).ok_or(BoundOverflow)?;
    if err > MAX_CENTER_ERR {
        return Err(BoundOverflow);
    }
    let mid = to_i64_checked(ctr.midpoint(), Round::Nearest).ok_or(BoundOverflow)?;

    if *r2 < 0 {
        return Ok(AdmissibleRange {
            min: mid + 1,
            mid,
            max: mid,
        });
    }

    let rad = Ball::from_float(r2.clone())
        .sqrt(prec)
        .div(c, prec)
        .upper_bound(prec);
    let rad = Ball::from_float(rad);

    let hi = ctr.add(&rad, prec).upper_bound(prec);
    let max = to_i64_checked(&hi, Round::Down).ok_or(BoundOverflow)?;

    let lo = ctr.sub(&rad, prec).lower_bound(prec);
    let min = to_i64_checked(&lo, Round::Up).ok_or(BoundOverflow)?;

    Ok(AdmissibleRange { min, mid, max })
}

/// Reduce an order-`d` problem to order `d - 1` by committing the last
/// coordinate to the integer `n`.
///
/// Returns the reduced radius bound
/// `max(0, r2 - (v[d-1] + cho[d-1][d-1] n)^2)` and the reduced offset
/// `next_v[k] = v[k] + cho[k][d-1] n` for `k < d - 1`. The clamp keeps
/// downstream comparisons well-defined when rounding drives the
/// subtraction negative.
pub fn recursion_step(
    cho: &BallMatrix,
    r2: &Ball,
    v: &[Ball],
    n: i64,
    d: usize,
    prec: u32,
) -> (Ball, Vec<Ball>) {
    debug_assert!(d >= 1 && d <= v.len());

    let x = cho[(d - 1, d - 1)]
        .mul_i64(n, prec)
        .add(&v[d - 1], prec)
        .sqr(prec);
    let next_r2 = r2.sub(&x, prec).nonnegative_part(prec);

    let next_v = (0..d - 1)
        .map(|k| v[k].add(&cho[(k, d - 1)].mul_i64(n, prec), prec))
        .collect();

    (next_r2, next_v)
}
