//! Numerical helpers shared across the crate.
//!
//! All comparisons between floating point quantities in the heuristic go
//! through these tolerance-aware helpers so that the meaning of "equal",
//! "integer" and "zero" is consistent everywhere.

/// Default comparison tolerance.
pub const EPS: f64 = 1e-6;

/// A large value standing in for an infinite bound.
pub const INF_BOUND: f64 = 1e30;

/// `a == b` within `eps`.
#[inline]
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// `a == b` within the default tolerance.
#[inline]
pub fn feq(a: f64, b: f64) -> bool {
    approx_eq(a, b, EPS)
}

/// `a < b` beyond the default tolerance.
#[inline]
pub fn flt(a: f64, b: f64) -> bool {
    b - a > EPS
}

/// `a > b` beyond the default tolerance.
#[inline]
pub fn fgt(a: f64, b: f64) -> bool {
    a - b > EPS
}

/// `a <= b` within the default tolerance.
#[inline]
pub fn fle(a: f64, b: f64) -> bool {
    a - b <= EPS
}

/// `a >= b` within the default tolerance.
#[inline]
pub fn fge(a: f64, b: f64) -> bool {
    b - a <= EPS
}

/// Fractional distance of `v` to the nearest integer.
#[inline]
pub fn fractionality(v: f64) -> f64 {
    (v - v.round()).abs()
}

/// True if `v` is integral within `eps`.
#[inline]
pub fn is_integral(v: f64, eps: f64) -> bool {
    fractionality(v) <= eps
}

/// Sign of `v` under the default tolerance: -1, 0 or 1.
#[inline]
pub fn fsign(v: f64) -> i32 {
    if fgt(v, 0.0) {
        1
    } else if flt(v, 0.0) {
        -1
    } else {
        0
    }
}

/// Treat bounds beyond `INF_BOUND` as infinite.
#[inline]
pub fn is_unbounded(v: f64) -> bool {
    v.abs() >= INF_BOUND
}
