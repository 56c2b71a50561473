//! 6-bit color code histogram

use crate::raster::Raster;
use crate::types::{Fingerprint, Method};

pub const NUM_BINS: usize = 64;

/// Two most significant bits of each channel, packed as `RRGGBB`.
pub fn color_code(r: u8, g: u8, b: u8) -> usize {
    let r_mib = (r >> 6) & 0b11;
    let g_mib = (g >> 6) & 0b11;
    let b_mib = (b >> 6) & 0b11;

    ((r_mib << 4) | (g_mib << 2) | b_mib) as usize
}

pub fn histogram<R: Raster + ?Sized>(raster: &R) -> Fingerprint {
    let mut fingerprint = Fingerprint::new(Method::ColorCode, raster.pixel_count());

    for y in 0..raster.height() {
        for x in 0..raster.width() {
            let color = raster.pixel_at(x, y);
            fingerprint.record(color_code(color.red(), color.green(), color.blue()));
        }
    }

    fingerprint
}
