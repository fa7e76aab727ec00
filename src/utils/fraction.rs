/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Bounded-denominator rational approximation
//!
//! Site occupancies arrive as floats but mcsqs can only realize rational
//! occupancies exactly, so they are rounded to the closest fraction whose
//! denominator does not exceed a given bound. The search walks the continued
//! fraction of the value and compares the last convergent against the best
//! semiconvergent, which yields the optimal bounded-denominator
//! approximation.

/// A reduced rational number with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub numer: i64,
    pub denom: u64,
}

impl Ratio {
    /// The value of the ratio as a float.
    pub fn value(&self) -> f64 {
        self.numer as f64 / self.denom as f64
    }
}

/// Greatest common divisor.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Least common multiple. Returns 0 when either argument is 0.
pub fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

/// Closest rational to `value` with denominator at most `max_denominator`.
///
/// Mirrors the classical `limit_denominator` construction: ties between the
/// semiconvergent and the last convergent resolve to the convergent.
/// Non-finite input collapses to 0/1.
pub fn limit_denominator(value: f64, max_denominator: u64) -> Ratio {
    let max_denominator = max_denominator.max(1);
    if !value.is_finite() {
        return Ratio { numer: 0, denom: 1 };
    }

    let negative = value < 0.0;
    let x = value.abs();

    // Convergents p/q of the continued fraction of x. (p0, q0) trails
    // (p1, q1) by one term.
    let (mut p0, mut q0): (i128, i128) = (0, 1);
    let (mut p1, mut q1): (i128, i128) = (1, 0);
    let mut r = x;

    for _ in 0..64 {
        let a = r.floor() as i128;
        let p2 = a * p1 + p0;
        let q2 = a * q1 + q0;

        if q2 > max_denominator as i128 {
            // q1 >= 1 here: the first convergent always has denominator 1.
            let k = (max_denominator as i128 - q0) / q1;
            let (sp, sq) = (k * p1 + p0, k * q1 + q0);
            let semi_err = (sp as f64 / sq as f64 - x).abs();
            let conv_err = (p1 as f64 / q1 as f64 - x).abs();
            let (bp, bq) = if semi_err < conv_err {
                (sp, sq)
            } else {
                (p1, q1)
            };
            return signed(bp, bq, negative);
        }

        p0 = p1;
        q0 = q1;
        p1 = p2;
        q1 = q2;

        let frac = r - r.floor();
        if frac < 1e-12 {
            break;
        }
        r = 1.0 / frac;
    }

    signed(p1, q1, negative)
}

fn signed(p: i128, q: i128, negative: bool) -> Ratio {
    let numer = if negative { -(p as i64) } else { p as i64 };
    Ratio {
        numer,
        denom: q as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.5, 8, 1, 2)]
    #[case(0.25, 8, 1, 4)]
    #[case(1.0 / 3.0, 8, 1, 3)]
    #[case(0.4, 8, 2, 5)]
    #[case(2.0 / 3.0, 8, 2, 3)]
    #[case(0.123, 100, 8, 65)]
    fn test_limit_denominator(
        #[case] value: f64,
        #[case] max_denominator: u64,
        #[case] numer: i64,
        #[case] denom: u64,
    ) {
        let r = limit_denominator(value, max_denominator);
        assert_eq!(r, Ratio { numer, denom });
    }

    #[test]
    fn test_limit_denominator_prefers_better_convergent() {
        // 22/7 beats the semiconvergent 25/8 for pi with denominators <= 10
        let r = limit_denominator(std::f64::consts::PI, 10);
        assert_eq!(r, Ratio { numer: 22, denom: 7 });
    }

    #[test]
    fn test_limit_denominator_negative_and_exact() {
        let r = limit_denominator(-0.75, 8);
        assert_eq!(r, Ratio { numer: -3, denom: 4 });
        assert_relative_eq!(r.value(), -0.75);

        let r = limit_denominator(2.0, 8);
        assert_eq!(r, Ratio { numer: 2, denom: 1 });
    }

    #[test]
    fn test_gcd_lcm() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(7, 13), 1);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(lcm(4, 6), 12);
        assert_eq!(lcm(0, 6), 0);
    }
}
