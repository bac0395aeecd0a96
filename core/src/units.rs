//! Fixed-point unit handling
//!
//! All amounts in the engine are u64 base units with 8 implied decimal
//! places. Rates and fees are basis points. Intermediate products are
//! widened to u128 so every invariant check is exact.

/// One whole token in base units (8 decimal places)
pub const COIN: u64 = 100_000_000;

/// Basis-point denominator (10_000 bps = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Floor of `amount * bps / 10_000`
pub fn bps_of(amount: u64, bps: u64) -> u64 {
    ((amount as u128 * bps as u128) / BPS_DENOMINATOR as u128) as u64
}

/// Floor of `a * b / d`, exact via u128 widening
///
/// Callers must guarantee `d > 0`.
pub fn mul_div(a: u64, b: u64, d: u64) -> u64 {
    ((a as u128 * b as u128) / d as u128) as u64
}

/// Ceiling of `a * b / d`, exact via u128 widening
///
/// Callers must guarantee `d > 0`.
pub fn mul_div_ceil(a: u64, b: u64, d: u64) -> u64 {
    let product = a as u128 * b as u128;
    product.div_ceil(d as u128) as u64
}

/// Integer square root (Newton's method)
///
/// Returns the largest `r` with `r * r <= x`.
pub fn integer_sqrt(x: u128) -> u128 {
    if x < 2 {
        return x;
    }
    let mut r = 1u128 << (x.ilog2() / 2 + 1);
    loop {
        let next = (r + x / r) / 2;
        if next >= r {
            return r;
        }
        r = next;
    }
}
