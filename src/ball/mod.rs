//! Midpoint-radius ("ball") rigorous real arithmetic.
//!
//! A [`Ball`] stores a midpoint at the caller's working precision and a
//! low-precision radius that is only ever rounded upward, so every operation
//! returns an enclosure of the exact mathematical result: whatever true
//! values the input balls contain, the true result lies inside the output
//! ball. Precision is an explicit `prec` argument on every rounding
//! operation; there is no global precision state.
//!
//! Midpoints are [`rug::Float`] (MPFR) values. Rounding a midpoint to
//! nearest at `prec` bits introduces at most one ulp of error, bounded by
//! `|mid| * 2^(1-prec)` and absorbed into the radius. Division, square root,
//! and the lattice operations built on top only ever consume directed upper
//! and lower bounds, so a slightly conservative radius costs tightness, never
//! correctness.
//!
//! # Examples
//!
//! ```
//! use rigoris::Ball;
//!
//! let a = Ball::from_f64(64, 0.125);
//! let b = Ball::from_f64(64, 0.25);
//! let c = a.add(&b, 64);
//! assert!(c.contains_f64(0.375));
//! assert!(c.is_positive());
//! ```

pub mod matrix;

use core::cmp::Ordering;
use core::fmt;

use rug::float::{Round, Special};
use rug::Float;

/// Radius precision in bits. Radii are error bounds, not payload; 32 bits
/// with upward rounding keeps them cheap and sound.
const RAD_PREC: u32 = 32;

/// Largest exponent for which a `Float` is converted to `i64`.
/// Leaves four guard bits below the word size, so downstream arithmetic on
/// the resulting integers cannot overflow.
const MAX_SAFE_EXP: i32 = 60;

/// Round a `Float` to `i64`, or fail.
///
/// Returns `None` when the value is not finite or its magnitude reaches
/// `2^60`. This is the only path from rigorous values to machine integers;
/// callers treat `None` as "fall back", never as a fatal error.
///
/// ```
/// use rigoris::ball::to_i64_checked;
/// use rug::float::Round;
/// use rug::Float;
///
/// let x = Float::with_val(64, 2.5);
/// assert_eq!(to_i64_checked(&x, Round::Down), Some(2));
/// assert_eq!(to_i64_checked(&x, Round::Up), Some(3));
///
/// let huge = Float::with_val(64, Float::i_exp(1, 61));
/// assert_eq!(to_i64_checked(&huge, Round::Nearest), None);
/// ```
pub fn to_i64_checked(x: &Float, round: Round) -> Option<i64> {
    if !x.is_finite() {
        return None;
    }
    if let Some(e) = x.get_exp() {
        if e > MAX_SAFE_EXP {
            return None;
        }
    }
    let (z, _) = x.to_integer_round(round)?;
    z.to_i64()
}

// ── Radius helpers (RAD_PREC, upward rounding only) ─────────────────

fn rad_zero() -> Float {
    Float::new(RAD_PREC)
}

fn up_sum(a: &Float, b: &Float) -> Float {
    Float::with_val_round(RAD_PREC, a + b, Round::Up).0
}

fn up_mul(a: &Float, b: &Float) -> Float {
    Float::with_val_round(RAD_PREC, a * b, Round::Up).0
}

fn abs_up(x: &Float) -> Float {
    Float::with_val_round(RAD_PREC, x.abs_ref(), Round::Up).0
}

fn abs_down(x: &Float) -> Float {
    Float::with_val_round(RAD_PREC, x.abs_ref(), Round::Down).0
}

/// Upper bound on the error of rounding to nearest at `prec` bits:
/// one ulp, `|mid| * 2^(1-prec)`.
fn rounding_error(mid: &Float, prec: u32) -> Float {
    debug_assert!(prec >= 2, "precision below 2 bits is meaningless");
    if mid.is_zero() {
        return rad_zero();
    }
    if !mid.is_finite() {
        return Float::with_val(RAD_PREC, Special::Infinity);
    }
    let mut e = abs_up(mid);
    e >>= prec - 1;
    e
}

fn float_min(a: Float, b: Float) -> Float {
    if a.is_nan() {
        a
    } else if b.is_nan() || b < a {
        b
    } else {
        a
    }
}

fn float_max(a: Float, b: Float) -> Float {
    if a.is_nan() {
        a
    } else if b.is_nan() || b > a {
        b
    } else {
        a
    }
}

// ── Ball ────────────────────────────────────────────────────────────

/// A rigorous real number: midpoint plus error radius.
///
/// Cheap to clone relative to the arithmetic performed on it; not `Copy`
/// (the midpoint is heap-allocated by MPFR).
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    mid: Float,
    rad: Float,
}

impl Ball {
    fn from_parts(mid: Float, rad: Float) -> Self {
        let rad = if rad.is_nan() {
            Float::with_val(RAD_PREC, Special::Infinity)
        } else {
            rad
        };
        Self { mid, rad }
    }

    // ── Constructors ────────────────────────────────────────────────

    /// The exact ball `0 ± 0` at midpoint precision `prec`.
    pub fn zero(prec: u32) -> Self {
        Self {
            mid: Float::new(prec),
            rad: rad_zero(),
        }
    }

    /// Exact integer value.
    pub fn from_i64(prec: u32, n: i64) -> Self {
        let (mid, dir) = Float::with_val_round(prec, n, Round::Nearest);
        let rad = if dir == Ordering::Equal {
            rad_zero()
        } else {
            rounding_error(&mid, prec)
        };
        Self::from_parts(mid, rad)
    }

    /// Value of an `f64`, exact whenever `prec >= 53`.
    pub fn from_f64(prec: u32, x: f64) -> Self {
        let (mid, dir) = Float::with_val_round(prec, x, Round::Nearest);
        let rad = if dir == Ordering::Equal {
            rad_zero()
        } else {
            rounding_error(&mid, prec)
        };
        Self::from_parts(mid, rad)
    }

    /// Exact embedding of a `Float` (zero radius). The midpoint keeps the
    /// precision of `x`.
    pub fn from_float(x: Float) -> Self {
        Self {
            mid: x,
            rad: rad_zero(),
        }
    }

    /// The ball `[-1, 1]`.
    pub fn zero_pm_one(prec: u32) -> Self {
        Self {
            mid: Float::new(prec),
            rad: Float::with_val(RAD_PREC, 1),
        }
    }

    /// Exact positive infinity.
    pub fn pos_inf(prec: u32) -> Self {
        Self {
            mid: Float::with_val(prec, Special::Infinity),
            rad: rad_zero(),
        }
    }

    /// A ball containing every real number (NaN midpoint, infinite radius).
    pub fn indeterminate(prec: u32) -> Self {
        Self {
            mid: Float::with_val(prec, Special::Nan),
            rad: Float::with_val(RAD_PREC, Special::Infinity),
        }
    }

    /// Smallest ball containing `[lo, hi]`. Both endpoints must be finite
    /// with `lo <= hi`; anything else yields [`Ball::indeterminate`].
    pub(crate) fn from_endpoints_floats(lo: Float, hi: Float, prec: u32) -> Self {
        if !lo.is_finite() || !hi.is_finite() {
            return Self::indeterminate(prec);
        }
        let mut mid = Float::with_val_round(prec, &lo + &hi, Round::Nearest).0;
        mid >>= 1_u32;
        let r1 = Float::with_val_round(RAD_PREC, &hi - &mid, Round::Up).0;
        let r2 = Float::with_val_round(RAD_PREC, &mid - &lo, Round::Up).0;
        let mut rad = float_max(r1, r2);
        if rad.cmp0() == Some(Ordering::Less) {
            rad = rad_zero();
        }
        Self::from_parts(mid, rad)
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Midpoint.
    #[inline]
    pub fn midpoint(&self) -> &Float {
        &self.mid
    }

    /// Error radius.
    #[inline]
    pub fn radius(&self) -> &Float {
        &self.rad
    }

    /// Midpoint as `f64` (approximation, not a bound).
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.mid.to_f64()
    }

    /// Whether both midpoint and radius are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.mid.is_finite() && self.rad.is_finite()
    }

    /// Directed upper bound `mid + rad`, rounded up at `prec`.
    pub fn upper_bound(&self, prec: u32) -> Float {
        Float::with_val_round(prec, &self.mid + &self.rad, Round::Up).0
    }

    /// Directed lower bound `mid - rad`, rounded down at `prec`.
    pub fn lower_bound(&self, prec: u32) -> Float {
        Float::with_val_round(prec, &self.mid - &self.rad, Round::Down).0
    }

    // ── Predicates ──────────────────────────────────────────────────

    /// Whether every value in the ball is strictly positive.
    pub fn is_positive(&self) -> bool {
        if self.mid.is_nan() || self.rad.is_nan() {
            return false;
        }
        let p = self.mid.prec().max(RAD_PREC);
        self.lower_bound(p).cmp0() == Some(Ordering::Greater)
    }

    /// Whether every value of `self` is strictly below every value of `rhs`.
    pub fn certainly_lt(&self, rhs: &Ball) -> bool {
        let p = self.mid.prec().max(rhs.mid.prec()).max(RAD_PREC);
        matches!(
            self.upper_bound(p).partial_cmp(&rhs.lower_bound(p)),
            Some(Ordering::Less)
        )
    }

    /// Whether every value of `self` is strictly above every value of `rhs`.
    pub fn certainly_gt(&self, rhs: &Ball) -> bool {
        rhs.certainly_lt(self)
    }

    /// Whether the ball contains the exact value `x`.
    ///
    /// The check uses 64 guard bits of directed rounding; it can accept a
    /// value within `2^-64` ulp of the boundary but never rejects a
    /// contained one.
    pub fn contains_f64(&self, x: f64) -> bool {
        if self.mid.is_nan() {
            return false;
        }
        if self.rad.is_nan() || self.rad.is_infinite() {
            return true;
        }
        let p = self.mid.prec() + 64;
        self.lower_bound(p) <= x && x <= self.upper_bound(p)
    }

    // ── Arithmetic ──────────────────────────────────────────────────

    /// Negation (exact).
    pub fn neg(&self) -> Ball {
        Self {
            mid: Float::with_val(self.mid.prec(), -&self.mid),
            rad: self.rad.clone(),
        }
    }

    /// Multiplication by a power of two (exact).
    pub fn mul_2exp(&self, e: i32) -> Ball {
        let mut mid = self.mid.clone();
        let mut rad = self.rad.clone();
        if e >= 0 {
            mid <<= e as u32;
            rad <<= e as u32;
        } else {
            mid >>= (-e) as u32;
            rad >>= (-e) as u32;
        }
        Self { mid, rad }
    }

    /// Sum.
    pub fn add(&self, rhs: &Ball, prec: u32) -> Ball {
        let (mid, dir) = Float::with_val_round(prec, &self.mid + &rhs.mid, Round::Nearest);
        let mut rad = up_sum(&self.rad, &rhs.rad);
        if dir != Ordering::Equal {
            rad = up_sum(&rad, &rounding_error(&mid, prec));
        }
        Self::from_parts(mid, rad)
    }

    /// Difference.
    pub fn sub(&self, rhs: &Ball, prec: u32) -> Ball {
        let (mid, dir) = Float::with_val_round(prec, &self.mid - &rhs.mid, Round::Nearest);
        let mut rad = up_sum(&self.rad, &rhs.rad);
        if dir != Ordering::Equal {
            rad = up_sum(&rad, &rounding_error(&mid, prec));
        }
        Self::from_parts(mid, rad)
    }

    /// Product. Radius bound: `|a|rb + |b|ra + ra*rb` plus the midpoint
    /// rounding error.
    pub fn mul(&self, rhs: &Ball, prec: u32) -> Ball {
        let (mid, dir) = Float::with_val_round(prec, &self.mid * &rhs.mid, Round::Nearest);
        let am = abs_up(&self.mid);
        let bm = abs_up(&rhs.mid);
        let mut rad = up_sum(
            &up_sum(&up_mul(&am, &rhs.rad), &up_mul(&bm, &self.rad)),
            &up_mul(&self.rad, &rhs.rad),
        );
        if dir != Ordering::Equal {
            rad = up_sum(&rad, &rounding_error(&mid, prec));
        }
        Self::from_parts(mid, rad)
    }

    /// Product with a machine integer.
    pub fn mul_i64(&self, n: i64, prec: u32) -> Ball {
        let (mid, dir) = Float::with_val_round(prec, &self.mid * n, Round::Nearest);
        let mut rad = Float::with_val_round(RAD_PREC, &self.rad * n.unsigned_abs(), Round::Up).0;
        if dir != Ordering::Equal {
            rad = up_sum(&rad, &rounding_error(&mid, prec));
        }
        Self::from_parts(mid, rad)
    }

    /// Square.
    pub fn sqr(&self, prec: u32) -> Ball {
        self.mul(self, prec)
    }

    /// Quotient. [`Ball::indeterminate`] when the divisor is not certainly
    /// nonzero.
    pub fn div(&self, rhs: &Ball, prec: u32) -> Ball {
        // Lower bound on |rhs|; must be strictly positive.
        let bl = abs_down(&rhs.mid);
        let den1 = Float::with_val_round(RAD_PREC, &bl - &rhs.rad, Round::Down).0;
        if den1.cmp0() != Some(Ordering::Greater) {
            return Self::indeterminate(prec);
        }

        let (mid, dir) = Float::with_val_round(prec, &self.mid / &rhs.mid, Round::Nearest);
        // |a/b - a'/b'| <= (|a'|rb + |b'|ra) / (|b'| (|b'| - rb))
        let num = up_sum(
            &up_mul(&abs_up(&self.mid), &rhs.rad),
            &up_mul(&abs_up(&rhs.mid), &self.rad),
        );
        let den = Float::with_val_round(RAD_PREC, &bl * &den1, Round::Down).0;
        let mut rad = Float::with_val_round(RAD_PREC, &num / &den, Round::Up).0;
        if dir != Ordering::Equal {
            rad = up_sum(&rad, &rounding_error(&mid, prec));
        }
        Self::from_parts(mid, rad)
    }

    /// Square root, evaluated on the intersection of the ball with
    /// `[0, inf)`. A ball lying entirely below zero (or a non-finite one)
    /// yields [`Ball::indeterminate`].
    pub fn sqrt(&self, prec: u32) -> Ball {
        if !self.is_finite() {
            return Self::indeterminate(prec);
        }
        let hi = self.upper_bound(prec);
        if hi.cmp0() == Some(Ordering::Less) {
            return Self::indeterminate(prec);
        }
        let mut lo = self.lower_bound(prec);
        if lo.cmp0() != Some(Ordering::Greater) {
            lo = Float::new(prec);
        }
        let slo = Float::with_val_round(prec, lo.sqrt_ref(), Round::Down).0;
        let shi = Float::with_val_round(prec, hi.sqrt_ref(), Round::Up).0;
        Self::from_endpoints_floats(slo, shi, prec)
    }

    /// Ball enclosing `{min(x, y) : x in self, y in rhs}`.
    pub fn min(&self, rhs: &Ball, prec: u32) -> Ball {
        let lo = float_min(self.lower_bound(prec), rhs.lower_bound(prec));
        let hi = float_min(self.upper_bound(prec), rhs.upper_bound(prec));
        Self::from_endpoints_floats(lo, hi, prec)
    }

    /// Ball enclosing `{max(x, y) : x in self, y in rhs}`.
    pub fn max(&self, rhs: &Ball, prec: u32) -> Ball {
        let lo = float_max(self.lower_bound(prec), rhs.lower_bound(prec));
        let hi = float_max(self.upper_bound(prec), rhs.upper_bound(prec));
        Self::from_endpoints_floats(lo, hi, prec)
    }

    /// Ball containing the union of both balls.
    pub fn union(&self, rhs: &Ball, prec: u32) -> Ball {
        let lo = float_min(self.lower_bound(prec), rhs.lower_bound(prec));
        let hi = float_max(self.upper_bound(prec), rhs.upper_bound(prec));
        Self::from_endpoints_floats(lo, hi, prec)
    }

    /// Ball enclosing `{max(x, 0) : x in self}`. Used to keep reduced
    /// radius bounds non-negative through the lattice recursion.
    pub fn nonnegative_part(&self, prec: u32) -> Ball {
        if self.mid.is_nan() || self.rad.is_nan() {
            return Self::indeterminate(prec);
        }
        let mut lo = self.lower_bound(prec);
        if lo.cmp0() == Some(Ordering::Less) {
            lo = Float::new(prec);
        }
        let mut hi = self.upper_bound(prec);
        if hi.cmp0() == Some(Ordering::Less) {
            hi = Float::new(prec);
        }
        Self::from_endpoints_floats(lo, hi, prec)
    }
}

impl fmt::Display for Ball {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} +/- {}]", self.mid, self.rad)
    }
}
