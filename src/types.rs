//! Core types for histoseek

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Image identifier (file name relative to the corpus root)
pub type ImageId = String;

/// Histogram binning method
///
/// Deserialization goes through `FromStr`, so configuration files accept the
/// same spellings as the command line.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Intensity,
    ColorCode,
}

impl Method {
    pub const ALL: [Method; 2] = [Method::Intensity, Method::ColorCode];

    /// Number of histogram bins, excluding the pixel-count slot.
    pub fn num_bins(&self) -> usize {
        match self {
            Method::Intensity => crate::histogram::intensity::NUM_BINS,
            Method::ColorCode => crate::histogram::color_code::NUM_BINS,
        }
    }

    /// Length of a fingerprint produced under this method.
    pub fn fingerprint_len(&self) -> usize {
        self.num_bins() + 1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Intensity => "intensity",
            Method::ColorCode => "colorcode",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "intensity" | "intensity method" => Ok(Method::Intensity),
            "colorcode" | "color-code" | "color_code" | "color code" | "color code method" => {
                Ok(Method::ColorCode)
            }
            other => Err(Error::invalid_config(format!(
                "unknown histogram method: {}",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Which Manhattan distance variant a ranking uses
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistancePolicy {
    /// Absolute bin differences, pixel-count slot included.
    #[default]
    Raw,
    /// Differences of bin fractions, pixel-count slot used as denominator.
    Normalized,
}

impl DistancePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistancePolicy::Raw => "raw",
            DistancePolicy::Normalized => "normalized",
        }
    }
}

impl fmt::Display for DistancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistancePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(DistancePolicy::Raw),
            "normalized" | "normalised" => Ok(DistancePolicy::Normalized),
            other => Err(Error::invalid_config(format!(
                "unknown distance policy: {}",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for DistancePolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Histogram fingerprint of one image.
///
/// Slot 0 holds the total pixel count, slots `1..=num_bins` hold per-bin
/// pixel counts. Deserialized fingerprints are length-checked like
/// [`Fingerprint::from_slots`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawFingerprint")]
pub struct Fingerprint {
    method: Method,
    slots: Vec<u64>,
}

#[derive(Deserialize)]
struct RawFingerprint {
    method: Method,
    slots: Vec<u64>,
}

impl TryFrom<RawFingerprint> for Fingerprint {
    type Error = Error;

    fn try_from(raw: RawFingerprint) -> Result<Self> {
        Self::from_slots(raw.method, raw.slots)
    }
}

impl Fingerprint {
    /// Empty histogram with the pixel-count slot already filled in.
    pub fn new(method: Method, pixel_count: u64) -> Self {
        let mut slots = vec![0; method.fingerprint_len()];
        slots[0] = pixel_count;
        Self { method, slots }
    }

    /// Build from raw slots, checking the length against the method.
    pub fn from_slots(method: Method, slots: Vec<u64>) -> Result<Self> {
        if slots.len() != method.fingerprint_len() {
            return Err(Error::LengthMismatch {
                left: method.fingerprint_len(),
                right: slots.len(),
            });
        }
        Ok(Self { method, slots })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn pixel_count(&self) -> u64 {
        self.slots[0]
    }

    /// Per-bin counts, without the pixel-count slot
    pub fn bins(&self) -> &[u64] {
        &self.slots[1..]
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Count one pixel into `bin` (0-based, excluding the count slot).
    pub(crate) fn record(&mut self, bin: usize) {
        self.slots[bin + 1] += 1;
    }

    /// Whether every pixel landed in exactly one bin.
    pub fn is_complete(&self) -> bool {
        self.bins().iter().sum::<u64>() == self.pixel_count()
    }
}

/// One corpus member with its distance to the query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedEntry {
    pub id: ImageId,
    /// `None` when the member could not be decoded and was ranked last.
    pub distance: Option<f64>,
}

/// Result of ranking a corpus against a query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedResult {
    pub method: Method,
    pub policy: DistancePolicy,
    pub entries: Vec<RankedEntry>,
}

impl RankedResult {
    pub fn ids(&self) -> Vec<ImageId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
