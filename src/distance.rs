//! Manhattan distances between fingerprints
//!
//! Two variants are kept apart on purpose: interactive re-ranking uses the
//! raw form, which also counts the pixel-count slot, while the normalized
//! form compares bin fractions and ignores image resolution.

use crate::types::{DistancePolicy, Fingerprint};
use crate::{Error, Result};

/// Sum of absolute slot differences, pixel-count slot included.
pub fn manhattan_raw(a: &Fingerprint, b: &Fingerprint) -> Result<f64> {
    check_lengths(a, b)?;

    let distance = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| x.abs_diff(*y))
        .sum::<u64>();

    Ok(distance as f64)
}

/// Sum of absolute differences of per-bin pixel fractions.
///
/// A fingerprint with zero pixels contributes a fraction of 0 for every bin.
pub fn manhattan_normalized(a: &Fingerprint, b: &Fingerprint) -> Result<f64> {
    check_lengths(a, b)?;

    let a_total = a.pixel_count();
    let b_total = b.pixel_count();

    Ok(a
        .bins()
        .iter()
        .zip(b.bins())
        .map(|(&x, &y)| (fraction(x, a_total) - fraction(y, b_total)).abs())
        .sum())
}

impl DistancePolicy {
    /// Distance between two fingerprints under this policy
    pub fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f64> {
        match self {
            DistancePolicy::Raw => manhattan_raw(a, b),
            DistancePolicy::Normalized => manhattan_normalized(a, b),
        }
    }
}

fn fraction(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn check_lengths(a: &Fingerprint, b: &Fingerprint) -> Result<()> {
    if a.method() != b.method() || a.len() != b.len() {
        return Err(Error::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}
