use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
    iter::Sum,
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use thiserror::Error;

use crate::utils;

use super::MAX_DECIMAL_DENOMINATOR;

/// Errors that can occur when constructing or operating on rational numbers.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RationalError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("The result does not fit in a 64-bit numerator and denominator")]
    Overflow,
    #[error("Cannot convert a non-finite decimal to a rational number")]
    NotFinite,
    #[error("Cannot parse '{0}' as a rational number")]
    Parse(String),
    #[error("The denominator bound must be positive, got {0}")]
    InvalidDenominatorBound(i64),
}

/// An exact fraction `numerator/denominator` of native integers.
///
/// The representation is canonical: the denominator is positive, zero is stored as `0/1`
/// and the numerator and denominator are coprime. Therefore two rationals are equal
/// if and only if their fields are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "(i64, i64)", into = "(i64, i64)")
)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

impl Rational {
    /// Create the rational `num/den` in canonical form.
    pub fn new(num: i64, den: i64) -> Result<Rational, RationalError> {
        Self::from_i128(num as i128, den as i128)
    }

    /// Normalize a wide fraction and narrow it to native integers.
    fn from_i128(mut num: i128, mut den: i128) -> Result<Rational, RationalError> {
        if den == 0 {
            return Err(RationalError::DivisionByZero);
        }

        if num == 0 {
            return Ok(Rational::zero());
        }

        let g = utils::gcd_signed_i128(num, den);
        if g != 1 {
            // g divides both, so it fits in an i128 unless both are i128::MIN
            let g = i128::try_from(g).map_err(|_| RationalError::Overflow)?;
            num /= g;
            den /= g;
        }

        if den < 0 {
            num = num.checked_neg().ok_or(RationalError::Overflow)?;
            den = den.checked_neg().ok_or(RationalError::Overflow)?;
        }

        Ok(Rational {
            numerator: i64::try_from(num).map_err(|_| RationalError::Overflow)?,
            denominator: i64::try_from(den).map_err(|_| RationalError::Overflow)?,
        })
    }

    pub const fn zero() -> Rational {
        Rational {
            numerator: 0,
            denominator: 1,
        }
    }

    pub const fn one() -> Rational {
        Rational {
            numerator: 1,
            denominator: 1,
        }
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn is_one(&self) -> bool {
        self.numerator == 1 && self.denominator == 1
    }

    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    pub fn is_integer(&self) -> bool {
        self.denominator == 1
    }

    /// A best-effort floating point approximation.
    ///
    /// This is only suitable for magnitude comparisons, never to decide exact equality.
    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Check if the decimal approximation lies within `epsilon` of zero.
    ///
    /// Unlike [Rational::is_zero], this test also accepts tiny nonzero values that
    /// are an artifact of converting floating point input.
    pub fn is_near_zero(&self, epsilon: f64) -> bool {
        self.to_f64().abs() < epsilon
    }

    pub fn checked_neg(&self) -> Result<Rational, RationalError> {
        Ok(Rational {
            numerator: self
                .numerator
                .checked_neg()
                .ok_or(RationalError::Overflow)?,
            denominator: self.denominator,
        })
    }

    pub fn abs(&self) -> Result<Rational, RationalError> {
        if self.is_negative() {
            self.checked_neg()
        } else {
            Ok(*self)
        }
    }

    /// Compute `1/self`.
    pub fn inv(&self) -> Result<Rational, RationalError> {
        Self::from_i128(self.denominator as i128, self.numerator as i128)
    }

    pub fn checked_add(&self, rhs: impl Into<Scalar>) -> Result<Rational, RationalError> {
        let rhs = rhs.into().to_rational()?;
        let (n1, d1) = (self.numerator as i128, self.denominator as i128);
        let (n2, d2) = (rhs.numerator as i128, rhs.denominator as i128);

        if d1 == d2 {
            return Self::from_i128(n1 + n2, d1);
        }

        // bring both to the smallest common denominator when it is representable
        let (f1, f2, den) = match utils::lcm_signed(self.denominator, rhs.denominator) {
            Some(l) => (l as i128 / d1, l as i128 / d2, l as i128),
            None => (d2, d1, d1 * d2),
        };

        let num = (n1 * f1)
            .checked_add(n2 * f2)
            .ok_or(RationalError::Overflow)?;
        Self::from_i128(num, den)
    }

    pub fn checked_sub(&self, rhs: impl Into<Scalar>) -> Result<Rational, RationalError> {
        let rhs = rhs.into().to_rational()?;
        self.checked_add(rhs.checked_neg()?)
    }

    pub fn checked_mul(&self, rhs: impl Into<Scalar>) -> Result<Rational, RationalError> {
        let rhs = rhs.into().to_rational()?;
        if self.is_zero() || rhs.is_zero() {
            return Ok(Rational::zero());
        }

        Self::from_i128(
            self.numerator as i128 * rhs.numerator as i128,
            self.denominator as i128 * rhs.denominator as i128,
        )
    }

    /// Divide `self` by `rhs`, failing with [RationalError::DivisionByZero] if `rhs` is zero.
    pub fn checked_div(&self, rhs: impl Into<Scalar>) -> Result<Rational, RationalError> {
        let rhs = rhs.into().to_rational()?;
        if rhs.is_zero() {
            return Err(RationalError::DivisionByZero);
        }

        Self::from_i128(
            self.numerator as i128 * rhs.denominator as i128,
            self.denominator as i128 * rhs.numerator as i128,
        )
    }

    /// Convert a floating point number to the rational number with a denominator of at most
    /// `max_denominator` that lies closest to it.
    ///
    /// The float is first expanded exactly into a fraction with a power-of-two denominator,
    /// after which continued fractions select the best approximation. As a result
    /// `0.1` becomes `1/10` instead of `3602879701896397/36028797018963968`.
    pub fn from_f64_approx(f: f64, max_denominator: i64) -> Result<Rational, RationalError> {
        if max_denominator <= 0 {
            return Err(RationalError::InvalidDenominatorBound(max_denominator));
        }

        if !f.is_finite() {
            return Err(RationalError::NotFinite);
        }
        if f == 0. {
            return Ok(Rational::zero());
        }

        let bits: u64 = f.to_bits();
        let sign: i128 = if bits >> 63 == 0 { 1 } else { -1 };
        let mut exponent: i16 = ((bits >> 52) & 0x7ff) as i16;
        let mantissa = if exponent == 0 {
            (bits & 0xfffffffffffff) << 1
        } else {
            (bits & 0xfffffffffffff) | 0x10000000000000
        };
        // exponent bias + mantissa shift
        exponent -= 1023 + 52;

        if exponent >= 0 {
            if exponent >= 74 {
                return Err(RationalError::Overflow);
            }
            return Self::from_i128(sign * ((mantissa as i128) << exponent), 1);
        }

        if exponent < -126 {
            // smaller than 2^-74, which rounds to zero for any practical denominator bound
            return Ok(Rational::zero());
        }

        let (mut n, mut d) = (mantissa as i128, 1i128 << -exponent);
        let g = utils::gcd_signed_i128(n, d) as i128;
        n /= g;
        d /= g;

        let max_den = max_denominator as i128;
        if d <= max_den {
            return Self::from_i128(sign * n, d);
        }

        let (mut p0, mut q0, mut p1, mut q1) = (0i128, 1i128, 1i128, 0i128);
        loop {
            let a = n / d;
            let q2 = q0 + a * q1;
            if q2 > max_den {
                break;
            }
            (p1, p0, q0, q1) = (p0 + a * p1, p1, q1, q2);
            (d, n) = (n - a * d, d);
        }

        let k = (max_den - q0) / q1;
        let (bn, bd) = (p0 + k * p1, q0 + k * q1);

        let target = f.abs();
        let distance = |p: i128, q: i128| (p as f64 / q as f64 - target).abs();
        let res = if distance(p1, q1) <= distance(bn, bd) {
            (p1, q1)
        } else {
            (bn, bd)
        };

        Self::from_i128(sign * res.0, res.1)
    }
}

/// A number as it arrives from a caller: either an exact rational or a plain numeric value.
///
/// This is the single place where plain numbers are coerced into [Rational]s.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Rational(Rational),
    Integer(i64),
    Decimal(f64),
}

impl Scalar {
    /// Convert the scalar to an exact rational number. Decimals are approximated
    /// by the closest fraction with a denominator of at most [MAX_DECIMAL_DENOMINATOR].
    pub fn to_rational(&self) -> Result<Rational, RationalError> {
        match self {
            Scalar::Rational(r) => Ok(*r),
            Scalar::Integer(i) => Ok((*i).into()),
            Scalar::Decimal(f) => Rational::from_f64_approx(*f, MAX_DECIMAL_DENOMINATOR),
        }
    }

    /// Add `rhs` to the scalar after coercing both to rationals, so that a plain
    /// number can appear on the left of a mixed operation.
    pub fn checked_add(&self, rhs: impl Into<Scalar>) -> Result<Rational, RationalError> {
        self.to_rational()?.checked_add(rhs)
    }

    pub fn checked_sub(&self, rhs: impl Into<Scalar>) -> Result<Rational, RationalError> {
        self.to_rational()?.checked_sub(rhs)
    }

    pub fn checked_mul(&self, rhs: impl Into<Scalar>) -> Result<Rational, RationalError> {
        self.to_rational()?.checked_mul(rhs)
    }

    pub fn checked_div(&self, rhs: impl Into<Scalar>) -> Result<Rational, RationalError> {
        self.to_rational()?.checked_div(rhs)
    }
}

impl From<Rational> for Scalar {
    fn from(value: Rational) -> Self {
        Scalar::Rational(value)
    }
}

impl From<&Rational> for Scalar {
    fn from(value: &Rational) -> Self {
        Scalar::Rational(*value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Integer(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Decimal(value)
    }
}

impl From<i64> for Rational {
    #[inline]
    fn from(value: i64) -> Self {
        Rational {
            numerator: value,
            denominator: 1,
        }
    }
}

impl From<i32> for Rational {
    #[inline]
    fn from(value: i32) -> Self {
        Rational::from(value as i64)
    }
}

impl TryFrom<(i64, i64)> for Rational {
    type Error = RationalError;

    fn try_from((num, den): (i64, i64)) -> Result<Self, Self::Error> {
        Rational::new(num, den)
    }
}

impl From<Rational> for (i64, i64) {
    fn from(r: Rational) -> Self {
        (r.numerator, r.denominator)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::zero()
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for Rational {
    type Err = RationalError;

    /// Parse an integer `n`, a fraction `n/d` or a decimal literal such as `-2.25`.
    /// Decimal literals are converted exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse_err = || RationalError::Parse(s.to_string());

        if let Some((num, den)) = s.split_once('/') {
            let num = num.trim().parse::<i64>().map_err(|_| parse_err())?;
            let den = den.trim().parse::<i64>().map_err(|_| parse_err())?;
            return Rational::new(num, den);
        }

        if let Some((int, frac)) = s.split_once('.') {
            let (negative, int) = match int.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, int.strip_prefix('+').unwrap_or(int)),
            };

            if (int.is_empty() && frac.is_empty())
                || !int.chars().chain(frac.chars()).all(|c| c.is_ascii_digit())
            {
                return Err(parse_err());
            }

            let mut num: i128 = 0;
            let mut den: i128 = 1;
            for c in int.chars().chain(frac.chars()) {
                num = num
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(c as i128 - '0' as i128))
                    .ok_or(RationalError::Overflow)?;
            }
            for _ in frac.chars() {
                den = den.checked_mul(10).ok_or(RationalError::Overflow)?;
            }

            if negative {
                num = -num;
            }
            return Rational::from_i128(num, den);
        }

        s.parse::<i64>().map(Rational::from).map_err(|_| parse_err())
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.denominator == other.denominator {
            return self.numerator.cmp(&other.numerator);
        }

        let a = self.numerator as i128 * other.denominator as i128;
        let b = other.numerator as i128 * self.denominator as i128;
        a.cmp(&b)
    }
}

#[track_caller]
fn unwrap_arithmetic(r: Result<Rational, RationalError>) -> Rational {
    match r {
        Ok(r) => r,
        Err(e) => panic!("{}", e),
    }
}

/// Implement an operator for all combinations of owned and borrowed rationals and
/// native integers. Like native integer operators, these panic on division by zero
/// and on overflow; use the `checked_` methods to handle those cases.
macro_rules! impl_rational_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $checked:ident) => {
        impl $trait<Rational> for Rational {
            type Output = Rational;

            #[track_caller]
            fn $method(self, rhs: Rational) -> Self::Output {
                unwrap_arithmetic(self.$checked(rhs))
            }
        }

        impl<'a> $trait<&'a Rational> for Rational {
            type Output = Rational;

            #[track_caller]
            fn $method(self, rhs: &'a Rational) -> Self::Output {
                unwrap_arithmetic(self.$checked(rhs))
            }
        }

        impl<'a> $trait<Rational> for &'a Rational {
            type Output = Rational;

            #[track_caller]
            fn $method(self, rhs: Rational) -> Self::Output {
                unwrap_arithmetic(self.$checked(rhs))
            }
        }

        impl<'a, 'b> $trait<&'a Rational> for &'b Rational {
            type Output = Rational;

            #[track_caller]
            fn $method(self, rhs: &'a Rational) -> Self::Output {
                unwrap_arithmetic(self.$checked(rhs))
            }
        }

        impl $trait<i64> for Rational {
            type Output = Rational;

            #[track_caller]
            fn $method(self, rhs: i64) -> Self::Output {
                unwrap_arithmetic(self.$checked(rhs))
            }
        }

        impl $trait<Rational> for i64 {
            type Output = Rational;

            #[track_caller]
            fn $method(self, rhs: Rational) -> Self::Output {
                unwrap_arithmetic(Rational::from(self).$checked(rhs))
            }
        }

        impl $assign_trait<Rational> for Rational {
            #[track_caller]
            fn $assign_method(&mut self, rhs: Rational) {
                *self = unwrap_arithmetic(self.$checked(rhs));
            }
        }

        impl<'a> $assign_trait<&'a Rational> for Rational {
            #[track_caller]
            fn $assign_method(&mut self, rhs: &'a Rational) {
                *self = unwrap_arithmetic(self.$checked(rhs));
            }
        }

        impl $assign_trait<i64> for Rational {
            #[track_caller]
            fn $assign_method(&mut self, rhs: i64) {
                *self = unwrap_arithmetic(self.$checked(rhs));
            }
        }
    };
}

impl_rational_op!(Add, add, AddAssign, add_assign, checked_add);
impl_rational_op!(Sub, sub, SubAssign, sub_assign, checked_sub);
impl_rational_op!(Mul, mul, MulAssign, mul_assign, checked_mul);
impl_rational_op!(Div, div, DivAssign, div_assign, checked_div);

impl Neg for Rational {
    type Output = Rational;

    #[track_caller]
    fn neg(self) -> Self::Output {
        unwrap_arithmetic(self.checked_neg())
    }
}

impl<'a> Neg for &'a Rational {
    type Output = Rational;

    #[track_caller]
    fn neg(self) -> Self::Output {
        unwrap_arithmetic(self.checked_neg())
    }
}

impl Sum for Rational {
    #[track_caller]
    fn sum<I: Iterator<Item = Rational>>(iter: I) -> Self {
        iter.fold(Rational::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Rational> for Rational {
    #[track_caller]
    fn sum<I: Iterator<Item = &'a Rational>>(iter: I) -> Self {
        iter.fold(Rational::zero(), |acc, x| acc + x)
    }
}

#[cfg(test)]
mod test {
    use super::{Rational, RationalError, Scalar};

    fn q(n: i64, d: i64) -> Rational {
        Rational::new(n, d).unwrap()
    }

    #[test]
    fn canonical_form() {
        let r = q(6, -8);
        assert_eq!((r.numerator(), r.denominator()), (-3, 4));

        let r = q(0, -5);
        assert_eq!((r.numerator(), r.denominator()), (0, 1));

        let r = q(-7, -21);
        assert_eq!((r.numerator(), r.denominator()), (1, 3));

        assert_eq!(Rational::new(1, 0), Err(RationalError::DivisionByZero));
        assert_eq!(Rational::new(i64::MIN, -1), Err(RationalError::Overflow));
        assert_eq!(q(i64::MIN, 2).numerator(), i64::MIN / 2);
    }

    #[test]
    fn arithmetic() {
        let a = q(1, 2);
        let b = q(-2, 3);

        assert_eq!(a + b, q(-1, 6));
        assert_eq!(a - b, q(7, 6));
        assert_eq!(a * b, q(-1, 3));
        assert_eq!(a / b, q(-3, 4));
        assert_eq!(-a, q(-1, 2));
        assert_eq!(&a + &a, Rational::one());

        assert_eq!(a + 1, q(3, 2));
        assert_eq!(2 * b, q(-4, 3));
        assert_eq!(1 - a, a);
        assert_eq!(3 / q(3, 4), Rational::from(4));

        let mut c = a;
        c *= q(4, 1);
        c -= 1;
        assert_eq!(c, Rational::one());

        assert_eq!([a, a, b].iter().sum::<Rational>(), q(1, 3));
    }

    #[test]
    fn mixed_operands() {
        let a = q(1, 4);
        assert_eq!(a.checked_add(0.5).unwrap(), q(3, 4));
        assert_eq!(a.checked_mul(2).unwrap(), q(1, 2));
        assert_eq!(a.checked_sub(Scalar::Integer(1)).unwrap(), q(-3, 4));
        assert_eq!(
            a.checked_add(f64::NAN),
            Err(RationalError::NotFinite)
        );

        // a decimal or integer on the left-hand side
        assert_eq!(Scalar::Decimal(0.5).checked_add(a).unwrap(), q(3, 4));
        assert_eq!(Scalar::Decimal(0.5).checked_div(a).unwrap(), Rational::from(2));
        assert_eq!(Scalar::Integer(1).checked_sub(&a).unwrap(), q(3, 4));
        assert_eq!(Scalar::Decimal(2.5).checked_mul(0.5).unwrap(), q(5, 4));
        assert_eq!(
            Scalar::Decimal(f64::NAN).checked_mul(a),
            Err(RationalError::NotFinite)
        );
        assert_eq!(
            Scalar::Integer(1).checked_div(Rational::zero()),
            Err(RationalError::DivisionByZero)
        );
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            q(3, 7).checked_div(Rational::zero()),
            Err(RationalError::DivisionByZero)
        );
        assert_eq!(q(3, 7).checked_div(0), Err(RationalError::DivisionByZero));
        assert_eq!(Rational::zero().inv(), Err(RationalError::DivisionByZero));
    }

    #[test]
    #[should_panic(expected = "Division by zero")]
    fn division_by_zero_operator() {
        let _ = q(1, 2) / Rational::zero();
    }

    #[test]
    fn overflow() {
        let big = Rational::from(i64::MAX);
        assert_eq!(big.checked_add(1), Err(RationalError::Overflow));
        assert_eq!(big.checked_mul(2), Err(RationalError::Overflow));

        // the intermediate product exceeds 64 bits, but the reduced result does not
        let r = q(i64::MAX, 3).checked_mul(q(3, i64::MAX)).unwrap();
        assert_eq!(r, Rational::one());

        let r = q(1, i64::MAX).checked_add(q(1, i64::MAX - 1));
        assert_eq!(r, Err(RationalError::Overflow));
    }

    #[test]
    fn decimal_coercion() {
        assert_eq!(Scalar::Decimal(0.1).to_rational().unwrap(), q(1, 10));
        assert_eq!(Scalar::Decimal(-2.5).to_rational().unwrap(), q(-5, 2));
        assert_eq!(Scalar::Decimal(1. / 3.).to_rational().unwrap(), q(1, 3));
        assert_eq!(Scalar::Decimal(1e-30).to_rational().unwrap(), Rational::zero());
        assert_eq!(Scalar::Decimal(1e300).to_rational(), Err(RationalError::Overflow));
        assert_eq!(
            Scalar::Decimal(f64::INFINITY).to_rational(),
            Err(RationalError::NotFinite)
        );
        assert_eq!(Scalar::Integer(-4).to_rational().unwrap(), Rational::from(-4));
        assert_eq!(
            Rational::from_f64_approx(0.5, 0),
            Err(RationalError::InvalidDenominatorBound(0))
        );
        assert_eq!(Rational::from_f64_approx(0.3, 3).unwrap(), q(1, 3));
    }

    #[test]
    fn to_f64_and_near_zero() {
        assert_eq!(q(3, 4).to_f64(), 0.75);
        assert!(Rational::zero().is_near_zero(1e-10));
        assert!(q(1, 1_000_000_000_000).is_near_zero(1e-10));
        assert!(!q(1, 1_000_000_000_000).is_zero());
        assert!(!q(1, 1000).is_near_zero(1e-10));
    }

    #[test]
    fn display_and_parse() {
        assert_eq!(q(4, 2).to_string(), "2");
        assert_eq!(q(-3, 9).to_string(), "-1/3");
        assert_eq!(Rational::zero().to_string(), "0");

        assert_eq!("5".parse::<Rational>().unwrap(), Rational::from(5));
        assert_eq!(" -6/8 ".parse::<Rational>().unwrap(), q(-3, 4));
        assert_eq!("-2.25".parse::<Rational>().unwrap(), q(-9, 4));
        assert_eq!(".5".parse::<Rational>().unwrap(), q(1, 2));
        assert_eq!("3/0".parse::<Rational>(), Err(RationalError::DivisionByZero));
        assert_eq!(
            "x/2".parse::<Rational>(),
            Err(RationalError::Parse("x/2".to_string()))
        );
        assert!("1.2.3".parse::<Rational>().is_err());
        assert!(".".parse::<Rational>().is_err());
    }

    #[test]
    fn ordering() {
        assert!(q(1, 3) < q(1, 2));
        assert!(q(-1, 2) < q(-1, 3));
        assert_eq!(q(2, 4).cmp(&q(1, 2)), std::cmp::Ordering::Equal);
        assert_eq!(q(-3, 4).abs().unwrap(), q(3, 4));
    }
}
