//! Reduced fractions.
//!
//! Generation and validation both go through [`Fraction::new`], so a problem's
//! canonical answer and a reduced submission are always spelled the same way:
//! the sign lives on the numerator, the denominator is positive, and both are
//! divided by their greatest common divisor.

use std::fmt;
use std::str::FromStr;

/// Why a fraction string was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FractionError {
    #[error("expected the form numerator/denominator")]
    Malformed,
    #[error("'{0}' is not an integer")]
    NotAnInteger(String),
    #[error("denominator is zero")]
    ZeroDenominator,
    #[error("fraction is out of range")]
    Overflow,
}

/// A fraction in lowest terms with a positive denominator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fraction {
    numer: i64,
    denom: i64,
}

/// Greatest common divisor of the absolute values (`gcd(0, n) == |n|`)
pub fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    // Only gcd(i64::MIN, 0) or gcd(i64::MIN, i64::MIN) exceeds i64::MAX.
    i64::try_from(a).unwrap_or(i64::MAX)
}

impl Fraction {
    /// Normalize the sign, then reduce by the gcd
    pub fn new(numer: i64, denom: i64) -> Result<Self, FractionError> {
        if denom == 0 {
            return Err(FractionError::ZeroDenominator);
        }
        let (numer, denom) = if denom < 0 {
            (
                numer.checked_neg().ok_or(FractionError::Overflow)?,
                denom.checked_neg().ok_or(FractionError::Overflow)?,
            )
        } else {
            (numer, denom)
        };
        let g = gcd(numer, denom);
        Ok(Self {
            numer: numer / g,
            denom: denom / g,
        })
    }

    pub fn numer(&self) -> i64 {
        self.numer
    }

    pub fn denom(&self) -> i64 {
        self.denom
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

impl FromStr for Fraction {
    type Err = FractionError;

    /// Parses exactly `a/b` with integer parts; whitespace around each part is
    /// ignored. The result is reduced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        let (numer, denom) = match (parts.next(), parts.next(), parts.next()) {
            (Some(n), Some(d), None) => (parse_part(n)?, parse_part(d)?),
            _ => return Err(FractionError::Malformed),
        };
        Fraction::new(numer, denom)
    }
}

fn parse_part(part: &str) -> Result<i64, FractionError> {
    let part = part.trim();
    part.parse::<i64>()
        .map_err(|_| FractionError::NotAnInteger(part.to_string()))
}

/// Reduce a fraction string to its canonical spelling
///
/// Returns `None` for anything [`Fraction::from_str`] rejects.
pub fn reduce_fraction_str(s: &str) -> Option<String> {
    s.parse::<Fraction>().ok().map(|f| f.to_string())
}
