//! Number types used by the elimination algorithms.
//!
//! The core type is [Rational](rational::Rational), an exact fraction of native integers that is
//! always kept in canonical form. Plain numbers enter through [Scalar](rational::Scalar),
//! which is the only place where integers and decimals are coerced into rationals.
pub mod rational;

/// The tolerance below which the decimal approximation of an entry is considered zero
/// when selecting pivots.
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// The largest denominator used when approximating a decimal by a rational number.
pub const MAX_DECIMAL_DENOMINATOR: i64 = 1_000_000_000;
