//! Raster access layer
//!
//! Provides a unified pixel interface over decoded images, and sources that
//! enumerate and decode corpus images by identifier.

use std::sync::Arc;

use crate::types::ImageId;
use crate::{Error, Result};

pub mod directory;
pub mod memory;

pub use directory::DirectorySource;
pub use memory::MemorySource;

/// Pixel color packed as `0x??RRGGBB`; the top byte is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedRgb(pub u32);

impl PackedRgb {
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn red(&self) -> u8 {
        ((self.0 >> 16) & 0xff) as u8
    }

    pub fn green(&self) -> u8 {
        ((self.0 >> 8) & 0xff) as u8
    }

    pub fn blue(&self) -> u8 {
        (self.0 & 0xff) as u8
    }
}

/// Read access to a decoded image
pub trait Raster {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Color of the pixel at column `x`, row `y`.
    fn pixel_at(&self, x: u32, y: u32) -> PackedRgb;

    fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

impl Raster for image::RgbImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel_at(&self, x: u32, y: u32) -> PackedRgb {
        let [r, g, b] = self.get_pixel(x, y).0;
        PackedRgb::from_rgb(r, g, b)
    }
}

impl<R: Raster + ?Sized> Raster for Arc<R> {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn pixel_at(&self, x: u32, y: u32) -> PackedRgb {
        (**self).pixel_at(x, y)
    }
}

/// Row-major buffer of packed pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedRaster {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PackedRaster {
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::internal(format!(
                "Raster buffer size mismatch: expected {} pixels, got {}",
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Raster where every pixel has the same color
    pub fn filled(width: u32, height: u32, color: PackedRgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color.0; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> PackedRgb) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y).0);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }
}

impl Raster for PackedRaster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel_at(&self, x: u32, y: u32) -> PackedRgb {
        PackedRgb(self.pixels[y as usize * self.width as usize + x as usize])
    }
}

/// Source of corpus images
pub trait RasterSource: Send + Sync {
    /// Enumerate image identifiers in listing order
    fn list(&self) -> Result<Vec<ImageId>>;

    /// Decode the image behind `id`
    fn load(&self, id: &str) -> Result<Box<dyn Raster>>;
}
