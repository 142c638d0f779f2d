/// Compute the greatest common divisor of `|a|` and `|b|`.
pub fn gcd_signed(mut a: i64, mut b: i64) -> u64 {
    let mut c;
    while a != 0 {
        c = a;
        // only wraps when i64::MIN % -1 and that still yields 0
        a = b.wrapping_rem(a);
        b = c;
    }
    b.unsigned_abs()
}

pub fn gcd_signed_i128(mut a: i128, mut b: i128) -> u128 {
    let mut c;
    while a != 0 {
        c = a;
        // only wraps when i128::MIN % -1 and that still yields 0
        a = b.wrapping_rem(a);
        b = c;
    }
    b.unsigned_abs()
}

/// Compute the least common multiple of `|a|` and `|b|`.
/// Returns `None` when the result does not fit in a `u64`.
pub fn lcm_signed(a: i64, b: i64) -> Option<u64> {
    if a == 0 || b == 0 {
        return Some(0);
    }

    let g = gcd_signed(a, b);
    (a.unsigned_abs() / g).checked_mul(b.unsigned_abs())
}

#[cfg(test)]
mod test {
    use super::{gcd_signed, gcd_signed_i128, lcm_signed};

    #[test]
    fn gcd() {
        assert_eq!(gcd_signed(-12, 18), 6);
        assert_eq!(gcd_signed(12, -18), 6);
        assert_eq!(gcd_signed(0, 0), 0);
        assert_eq!(gcd_signed(i64::MIN, -1), 1);
        assert_eq!(gcd_signed_i128(-(1 << 100), 1 << 90), 1 << 90);
    }

    #[test]
    fn lcm() {
        assert_eq!(lcm_signed(4, -6), Some(12));
        assert_eq!(lcm_signed(0, 5), Some(0));
        assert_eq!(lcm_signed(i64::MAX, i64::MAX - 1), None);
    }
}
