//! Tools for building exact fractions from user input.

use fraction::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, Fraction};

use crate::{ScoreError, ScoreResult};

/// Amount of quarter notes in a whole note.
static QUARTERS_IN_WHOLE: u64 = 4;

/// Build fraction in lowest terms, keeping sign on the numerator.
///
/// # Example
///
/// ```
/// # use fraction::Fraction;
/// # use sonic_score::primitives::reduce;
/// assert_eq!(reduce(2, 8).unwrap(), Fraction::new(1u64, 4u64));
/// assert_eq!(reduce(3, -6).unwrap(), -Fraction::new(1u64, 2u64));
/// assert!(reduce(1, 0).is_err());
/// ```
pub fn reduce(numer: i64, denom: i64) -> ScoreResult<Fraction> {
    if denom == 0 {
        return Err(ScoreError::InvalidDuration(format!(
            "{numer}/{denom}"
        )));
    }
    let frac = Fraction::new(numer.unsigned_abs(), denom.unsigned_abs());
    match numer != 0 && (numer < 0) != (denom < 0) {
        true => Ok(-frac),
        false => Ok(frac),
    }
}

pub fn zero() -> Fraction {
    Fraction::new(0_u64, 1_u64)
}

/// Numerator and denominator. None for NaN and infinities.
pub fn parts(frac: &Fraction) -> Option<(u64, u64)> {
    Some((*frac.numer()?, *frac.denom()?))
}

/// `a + b`, or error if numerator or denominator overflows.
///
/// # Example
///
/// ```
/// # use fraction::Fraction;
/// # use sonic_score::primitives::fraction_tools::add;
/// let third = Fraction::new(1u64, 3u64);
/// assert_eq!(add(third, third).unwrap(), Fraction::new(2u64, 3u64));
/// let tiny = Fraction::new(1u64, u64::MAX);
/// assert!(add(tiny, Fraction::new(1u64, u64::MAX - 1)).is_err());
/// ```
pub fn add(a: Fraction, b: Fraction) -> ScoreResult<Fraction> {
    a.checked_add(&b).ok_or_else(|| overflow(a, '+', b))
}

pub fn sub(a: Fraction, b: Fraction) -> ScoreResult<Fraction> {
    a.checked_sub(&b).ok_or_else(|| overflow(a, '-', b))
}

pub fn mul(a: Fraction, b: Fraction) -> ScoreResult<Fraction> {
    a.checked_mul(&b).ok_or_else(|| overflow(a, '*', b))
}

pub fn div(a: Fraction, b: Fraction) -> ScoreResult<Fraction> {
    a.checked_div(&b).ok_or_else(|| overflow(a, '/', b))
}

fn overflow(a: Fraction, op: char, b: Fraction) -> ScoreError {
    ScoreError::InvalidDuration(format!("{a} {op} {b} does not fit in u64"))
}

/// Whole-note fraction converted to quarter notes.
pub fn quarter_length(frac: Fraction) -> ScoreResult<Fraction> {
    mul(frac, Fraction::new(QUARTERS_IN_WHOLE, 1_u64))
}

/// Parse `n`, `n/d`, `n/dr` (ruby rational) or decimal `a.b`.
///
/// # Example
///
/// ```
/// # use fraction::Fraction;
/// # use sonic_score::primitives::parse_rational;
/// assert_eq!(parse_rational("3/8r").unwrap(), Fraction::new(3u64, 8u64));
/// assert_eq!(parse_rational("2").unwrap(), Fraction::new(2u64, 1u64));
/// assert_eq!(parse_rational("0.75").unwrap(), Fraction::new(3u64, 4u64));
/// ```
pub fn parse_rational(text: &str) -> ScoreResult<Fraction> {
    let invalid = || ScoreError::InvalidDuration(text.to_string());
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('r').unwrap_or(trimmed);
    if let Some((numer, denom)) = trimmed.split_once('/') {
        let numer = numer.trim().parse::<i64>().map_err(|_| invalid())?;
        let denom = denom.trim().parse::<i64>().map_err(|_| invalid())?;
        return reduce(numer, denom);
    }
    if let Some((whole, decimals)) = trimmed.split_once('.') {
        if decimals.is_empty() || !decimals.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let denom = 10_i64
            .checked_pow(decimals.len() as u32)
            .ok_or_else(invalid)?;
        let numer = format!("{whole}{decimals}")
            .parse::<i64>()
            .map_err(|_| invalid())?;
        return reduce(numer, denom);
    }
    let numer = trimmed.parse::<i64>().map_err(|_| invalid())?;
    reduce(numer, 1)
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use super::{add, div, mul, parts, sub};
    use crate::{
        primitives::{parse_rational, quarter_length, reduce},
        ScoreError,
    };

    #[test]
    fn test_reduce() {
        for (n, d) in [(4, 8), (6, 9), (-10, 4), (10, -4), (0, 5), (7, 7)] {
            let frac = reduce(n, d).unwrap();
            let (rn, rd) = parts(&frac).unwrap();
            assert_eq!(gcd(rn, rd), 1, "{n}/{d} not coprime: {frac}");
            // same ratio
            assert_eq!(rn as i64 * d.abs(), n.abs() * rd as i64);
            assert_eq!(
                frac.is_sign_negative(),
                n != 0 && (n < 0) != (d < 0)
            );
        }
        assert_eq!(
            reduce(3, 0),
            Err(ScoreError::InvalidDuration("3/0".to_string()))
        );
    }

    fn gcd(a: u64, b: u64) -> u64 {
        match b {
            0 => a,
            _ => gcd(b, a % b),
        }
    }

    #[test]
    fn test_parse_rational() {
        assert_eq!(parse_rational("1/4r").unwrap(), Fraction::new(1u64, 4u64));
        assert_eq!(parse_rational(" 2/8 ").unwrap(), Fraction::new(1u64, 4u64));
        assert_eq!(parse_rational("120").unwrap(), Fraction::new(120u64, 1u64));
        assert_eq!(
            parse_rational("92.5").unwrap(),
            Fraction::new(185u64, 2u64)
        );
        assert!(parse_rational("1/0r").is_err());
        assert!(parse_rational("abc").is_err());
        assert!(parse_rational("1.").is_err());
    }

    #[test]
    fn test_quarter_length() {
        assert_eq!(
            quarter_length(Fraction::new(3u64, 8u64)).unwrap(),
            Fraction::new(3u64, 2u64)
        );
        assert!(quarter_length(Fraction::new(u64::MAX, 1u64)).is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        // largest primes below 2^63 and 2^64: lcm does not fit in u64
        let a = Fraction::new(1u64, 9_223_372_036_854_775_783u64);
        let b = Fraction::new(1u64, 18_446_744_073_709_551_557u64);
        assert!(matches!(add(a, b), Err(ScoreError::InvalidDuration(_))));
        assert!(matches!(sub(b, a), Err(ScoreError::InvalidDuration(_))));
        assert!(matches!(mul(a, b), Err(ScoreError::InvalidDuration(_))));
        let huge = Fraction::new(u64::MAX, 1u64);
        assert!(matches!(
            div(huge, Fraction::new(1u64, 2u64)),
            Err(ScoreError::InvalidDuration(_))
        ));

        let half = Fraction::new(1u64, 2u64);
        let third = Fraction::new(1u64, 3u64);
        assert_eq!(sub(third, half).unwrap(), -Fraction::new(1u64, 6u64));
        assert_eq!(div(third, half).unwrap(), Fraction::new(2u64, 3u64));
    }

    #[test]
    fn test_parts() {
        assert_eq!(parts(&Fraction::new(6u64, 8u64)), Some((3, 4)));
        assert_eq!(parts(&Fraction::nan()), None);
        assert_eq!(parts(&Fraction::infinity()), None);
    }
}
