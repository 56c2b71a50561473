//! Corpus ordering and the paged window over it

use std::ops::Range;

use crate::raster::RasterSource;
use crate::types::ImageId;

/// Ordered image identifiers; the order is the current result ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    ids: Vec<ImageId>,
}

impl Corpus {
    pub fn new(ids: Vec<ImageId>) -> Self {
        Self { ids }
    }

    /// Enumerate the corpus from `source` in its listing order.
    ///
    /// An absent or unreadable source yields an empty corpus.
    pub fn enumerate(source: &dyn RasterSource) -> Self {
        match source.list() {
            Ok(ids) => {
                tracing::info!(images = ids.len(), "Corpus enumerated");
                Self { ids }
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Corpus source unavailable; starting with an empty corpus"
                );
                Self::default()
            }
        }
    }

    pub fn ids(&self) -> &[ImageId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|existing| existing == id)
    }

    /// Replace the whole ordering
    pub(crate) fn replace(&mut self, ids: Vec<ImageId>) {
        debug_assert_eq!(ids.len(), self.ids.len());
        self.ids = ids;
    }
}

/// How many corpus entries the presentation layer can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationCap {
    pub page_size: usize,
    pub max_pages: usize,
}

impl Default for PresentationCap {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_pages: 5,
        }
    }
}

impl PresentationCap {
    /// Upper bound on browsable entries regardless of corpus size
    pub fn max_visible(&self) -> usize {
        self.page_size * self.max_pages
    }
}

/// Page cursor over a corpus ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    cap: PresentationCap,
    current: usize,
}

impl Pager {
    pub fn new(cap: PresentationCap) -> Self {
        Self { cap, current: 0 }
    }

    pub fn cap(&self) -> PresentationCap {
        self.cap
    }

    /// Zero-based page index
    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn page_count(&self, corpus_len: usize) -> usize {
        corpus_len
            .div_ceil(self.cap.page_size.max(1))
            .min(self.cap.max_pages)
    }

    /// Advance one page; returns whether the cursor moved.
    pub fn next(&mut self, corpus_len: usize) -> bool {
        if self.current + 1 < self.page_count(corpus_len) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page; returns whether the cursor moved.
    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Index range of the corpus shown on the current page
    pub fn visible_range(&self, corpus_len: usize) -> Range<usize> {
        let start = (self.current * self.cap.page_size).min(corpus_len);
        let end = (start + self.cap.page_size).min(corpus_len);
        start..end
    }
}
