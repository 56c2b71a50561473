//! Local filesystem raster source

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::types::ImageId;
use crate::{Error, Result};

use super::{Raster, RasterSource};

/// Images stored as files directly under one directory
pub struct DirectorySource {
    root: PathBuf,
    suffix: String,
}

impl DirectorySource {
    /// `extension` is matched against the end of each file name,
    /// case-sensitively and without the leading dot.
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            suffix: format!(".{}", extension.trim_start_matches('.')),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}

impl RasterSource for DirectorySource {
    fn list(&self) -> Result<Vec<ImageId>> {
        if !self.root.is_dir() {
            return Err(Error::MissingCorpusSource(self.root.display().to_string()));
        }

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::MissingCorpusSource(self.root.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(&self.suffix) {
                    ids.push(name.to_string());
                }
            }
        }

        // read_dir order is platform dependent
        ids.sort();
        Ok(ids)
    }

    fn load(&self, id: &str) -> Result<Box<dyn Raster>> {
        let path = self.resolve_path(id);
        let image = image::open(&path).map_err(|e| Error::decode(id, e))?;
        Ok(Box::new(image.to_rgb8()))
    }
}
