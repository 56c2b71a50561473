//! In-memory raster source

use std::sync::Arc;

use crate::types::ImageId;
use crate::{Error, Result};

use super::{PackedRaster, Raster, RasterSource};

/// Rasters held in memory, listed in insertion order.
///
/// Entries inserted with [`MemorySource::insert_unreadable`] are listed but
/// fail to decode, standing in for corrupt files.
#[derive(Default)]
pub struct MemorySource {
    entries: Vec<(ImageId, Option<Arc<PackedRaster>>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an image
    pub fn insert(&mut self, id: impl Into<ImageId>, raster: PackedRaster) {
        self.put(id.into(), Some(Arc::new(raster)));
    }

    pub fn insert_unreadable(&mut self, id: impl Into<ImageId>) {
        self.put(id.into(), None);
    }

    pub fn with(mut self, id: impl Into<ImageId>, raster: PackedRaster) -> Self {
        self.insert(id, raster);
        self
    }

    fn put(&mut self, id: ImageId, raster: Option<Arc<PackedRaster>>) {
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            slot.1 = raster;
        } else {
            self.entries.push((id, raster));
        }
    }
}

impl RasterSource for MemorySource {
    fn list(&self) -> Result<Vec<ImageId>> {
        Ok(self.entries.iter().map(|(id, _)| id.clone()).collect())
    }

    fn load(&self, id: &str) -> Result<Box<dyn Raster>> {
        match self.entries.iter().find(|(existing, _)| existing == id) {
            Some((_, Some(raster))) => Ok(Box::new(raster.clone())),
            Some((_, None)) => Err(Error::decode(id, "unreadable image data")),
            None => Err(Error::decode(id, "no such image")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::PackedRgb;

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new()
            .with("a", PackedRaster::filled(1, 1, PackedRgb(0)))
            .with("b", PackedRaster::filled(2, 2, PackedRgb(0)));
        source.insert_unreadable("c");
        source.insert("a", PackedRaster::filled(3, 1, PackedRgb(0)));

        assert_eq!(source.list().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(source.load("a").unwrap().width(), 3);
        assert!(matches!(source.load("c"), Err(Error::Decode { .. })));
        assert!(matches!(source.load("z"), Err(Error::Decode { .. })));
    }
}
