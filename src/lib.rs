//! Histoseek - content-based image retrieval over pixel histograms
//!
//! Histoseek ranks a corpus of images by visual similarity to a query image:
//! - Intensity (luma) and 6-bit color-code histogram fingerprints
//! - Raw and resolution-normalized Manhattan distances
//! - Exhaustive, stable ranking of the whole corpus
//! - Per-session fingerprint cache keyed by image and method

pub mod cache;
pub mod config;
pub mod corpus;
pub mod distance;
pub mod error;
pub mod histogram;
pub mod ranking;
pub mod raster;
pub mod session;
pub mod types;

pub use error::{Error, Result};
