//! Feature extraction
//!
//! Converts a decoded raster into a fixed-length histogram fingerprint.
//! Both methods visit every pixel once; slot 0 of the result always holds
//! `width * height`.

pub mod color_code;
pub mod intensity;

use crate::raster::Raster;
use crate::types::{Fingerprint, Method};

/// Compute the fingerprint of `raster` under `method`
pub fn extract<R: Raster + ?Sized>(raster: &R, method: Method) -> Fingerprint {
    let fingerprint = match method {
        Method::Intensity => intensity::histogram(raster),
        Method::ColorCode => color_code::histogram(raster),
    };

    tracing::debug!(
        method = %method,
        width = raster.width(),
        height = raster.height(),
        "Extracted histogram"
    );

    fingerprint
}
