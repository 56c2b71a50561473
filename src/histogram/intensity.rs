//! Luma intensity histogram

use crate::raster::{PackedRgb, Raster};
use crate::types::{Fingerprint, Method};

pub const NUM_BINS: usize = 25;

/// Width of one bin in intensity units
pub const BIN_WIDTH: f64 = 10.0;

/// Luma intensity of a pixel, in `0.0..=255.0`
pub fn intensity(color: PackedRgb) -> f64 {
    0.299 * color.red() as f64 + 0.587 * color.green() as f64 + 0.114 * color.blue() as f64
}

/// Bin for an intensity value; 250 and above share the last bin.
pub fn bin_index(intensity: f64) -> usize {
    ((intensity / BIN_WIDTH) as usize).min(NUM_BINS - 1)
}

pub fn histogram<R: Raster + ?Sized>(raster: &R) -> Fingerprint {
    let mut fingerprint = Fingerprint::new(Method::Intensity, raster.pixel_count());

    for y in 0..raster.height() {
        for x in 0..raster.width() {
            fingerprint.record(bin_index(intensity(raster.pixel_at(x, y))));
        }
    }

    fingerprint
}
