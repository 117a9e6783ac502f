//! Answer validators.
//!
//! Validators never fail: anything that does not parse is simply a wrong
//! answer.

use crate::fraction::Fraction;
use crate::types::AnswerDomain;

/// Absolute tolerance for numeric answers
pub const NUMERIC_TOLERANCE: f64 = 1e-6;

/// Check a raw submission against a canonical answer in the given domain
pub fn validate(domain: AnswerDomain, raw: &str, canonical: &str) -> bool {
    match domain {
        AnswerDomain::Numeric => validate_numeric(raw, canonical),
        AnswerDomain::Fraction => validate_fraction(raw, canonical),
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric comparison within [`NUMERIC_TOLERANCE`], so "2.0" matches "2"
pub fn validate_numeric(raw: &str, canonical: &str) -> bool {
    match (parse_finite(raw), parse_finite(canonical)) {
        (Some(submitted), Some(expected)) => (submitted - expected).abs() < NUMERIC_TOLERANCE,
        _ => false,
    }
}

/// Reduce the submitted fraction and compare spellings, so "10/12" matches
/// "5/6"
pub fn validate_fraction(raw: &str, canonical: &str) -> bool {
    match raw.parse::<Fraction>() {
        Ok(submitted) => submitted.to_string() == canonical.trim(),
        Err(e) => {
            tracing::debug!("Rejected fraction answer '{}': {}", raw, e);
            false
        }
    }
}
