//! Query session
//!
//! A session owns the corpus ordering and the page cursor. Selecting an
//! image as the query fingerprints it, ranks the whole corpus against it and
//! replaces the ordering in one step. Nothing is mutated unless the
//! selection succeeds.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::FingerprintCache;
use crate::corpus::{Corpus, Pager, PresentationCap};
use crate::histogram;
use crate::ranking;
use crate::raster::RasterSource;
use crate::types::{DistancePolicy, Fingerprint, ImageId, Method, RankedEntry, RankedResult};
use crate::{Error, Result};

/// Session behaviour knobs
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    pub method: Method,
    pub policy: DistancePolicy,
    pub cap: PresentationCap,
    /// Jump back to the first page after every re-rank.
    pub reset_page_on_rank: bool,
}

pub struct QuerySession {
    source: Arc<dyn RasterSource>,
    cache: Arc<FingerprintCache>,
    corpus: Corpus,
    pager: Pager,
    method: Method,
    policy: DistancePolicy,
    reset_page_on_rank: bool,
    query: Option<ImageId>,
    last_ranking: Option<RankedResult>,
}

impl QuerySession {
    /// Start a session over the images `source` lists
    pub fn new(
        source: Arc<dyn RasterSource>,
        cache: Arc<FingerprintCache>,
        config: SessionConfig,
    ) -> Self {
        let corpus = Corpus::enumerate(source.as_ref());
        Self::with_corpus(source, cache, corpus, config)
    }

    pub fn with_corpus(
        source: Arc<dyn RasterSource>,
        cache: Arc<FingerprintCache>,
        corpus: Corpus,
        config: SessionConfig,
    ) -> Self {
        Self {
            source,
            cache,
            corpus,
            pager: Pager::new(config.cap),
            method: config.method,
            policy: config.policy,
            reset_page_on_rank: config.reset_page_on_rank,
            query: None,
            last_ranking: None,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Use `method` for subsequent selections. Cached fingerprints of either
    /// method stay valid.
    pub fn set_method(&mut self, method: Method) {
        if method != self.method {
            tracing::info!(from = %self.method, to = %method, "Histogram method changed");
            self.method = method;
        }
    }

    pub fn policy(&self) -> DistancePolicy {
        self.policy
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn cache(&self) -> &Arc<FingerprintCache> {
        &self.cache
    }

    /// Identifier of the current query image, if any
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn last_ranking(&self) -> Option<&RankedResult> {
        self.last_ranking.as_ref()
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn page_count(&self) -> usize {
        self.pager.page_count(self.corpus.len())
    }

    pub fn next_page(&mut self) -> bool {
        self.pager.next(self.corpus.len())
    }

    pub fn previous_page(&mut self) -> bool {
        self.pager.previous()
    }

    /// Identifiers shown on the current page
    pub fn visible(&self) -> &[ImageId] {
        &self.corpus.ids()[self.pager.visible_range(self.corpus.len())]
    }

    /// Fingerprint of `id` under `method`, extracted on a cache miss.
    pub fn fingerprint(&self, id: &str, method: Method) -> Result<Arc<Fingerprint>> {
        self.cache.get_or_try_insert_with(id, method, || {
            let raster = self.source.load(id)?;
            Ok(histogram::extract(raster.as_ref(), method))
        })
    }

    /// Fingerprint of corpus member `id` under the active method.
    ///
    /// Identifiers outside the corpus are rejected before the source is
    /// touched.
    pub fn member_fingerprint(&self, id: &str) -> Result<Arc<Fingerprint>> {
        if !self.corpus.contains(id) {
            return Err(Error::UnknownImage(id.to_string()));
        }
        self.fingerprint(id, self.method)
    }

    /// Select the image at `index` on the current page as the query
    pub fn select_visible(&mut self, index: usize) -> Result<&RankedResult> {
        let id = self
            .visible()
            .get(index)
            .cloned()
            .ok_or_else(|| Error::UnknownImage(format!("page position {}", index)))?;
        self.select(&id)
    }

    /// Make `id` the query and re-rank the whole corpus against it.
    ///
    /// Members that fail to decode are placed after every ranked member in
    /// their previous relative order. If the query itself cannot be decoded
    /// the session is left untouched.
    pub fn select(&mut self, id: &str) -> Result<&RankedResult> {
        if !self.corpus.contains(id) {
            return Err(Error::UnknownImage(id.to_string()));
        }

        let method = self.method;
        let query = self.fingerprint(id, method).inspect_err(|err| {
            tracing::warn!(%id, error = %err, "Query image could not be fingerprinted");
        })?;

        let mut members = Vec::with_capacity(self.corpus.len());
        let mut unreadable = Vec::new();
        for member in self.corpus.ids() {
            match self.fingerprint(member, method) {
                Ok(fingerprint) => members.push((member.clone(), fingerprint)),
                Err(err @ Error::Decode { .. }) => {
                    tracing::warn!(id = %member, error = %err, "Skipping undecodable corpus image");
                    unreadable.push(member.clone());
                }
                Err(err) => return Err(err),
            }
        }

        let mut result = ranking::rank(
            &query,
            members.iter().map(|(member, fp)| (member.clone(), fp.as_ref())),
            self.policy,
        )?;
        result.entries.extend(
            unreadable
                .into_iter()
                .map(|id| RankedEntry { id, distance: None }),
        );

        tracing::info!(
            query = %id,
            %method,
            policy = %self.policy,
            corpus = result.len(),
            "Corpus re-ranked"
        );

        self.corpus.replace(result.ids());
        self.query = Some(id.to_string());
        if self.reset_page_on_rank {
            self.pager.reset();
        }

        Ok(&*self.last_ranking.insert(result))
    }
}

/// Session handle that serializes selections from several threads
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<QuerySession>>,
}

impl SharedSession {
    pub fn new(session: QuerySession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run one selection to completion; concurrent callers wait their turn.
    pub fn select(&self, id: &str) -> Result<RankedResult> {
        let mut session = self.inner.lock();
        session.select(id).cloned()
    }

    /// Run `f` with exclusive access to the session
    pub fn with<R>(&self, f: impl FnOnce(&mut QuerySession) -> R) -> R {
        let mut session = self.inner.lock();
        f(&mut session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{MemorySource, PackedRaster, PackedRgb};

    /// `total` pixels in a row, the first `white` of them white, the rest
    /// black. Raw distance between two of these is `2 * |white_a - white_b|`.
    fn mix(white: u32, total: u32) -> PackedRaster {
        PackedRaster::from_fn(total, 1, |x, _| {
            if x < white {
                PackedRgb::from_rgb(255, 255, 255)
            } else {
                PackedRgb::from_rgb(0, 0, 0)
            }
        })
    }

    fn tenth(white: u32) -> PackedRaster {
        mix(white, 10)
    }

    fn session_with(source: MemorySource, config: SessionConfig) -> QuerySession {
        QuerySession::new(
            Arc::new(source),
            Arc::new(FingerprintCache::default()),
            config,
        )
    }

    fn shade_corpus() -> MemorySource {
        MemorySource::new()
            .with("white", tenth(10))
            .with("black", tenth(0))
            .with("dark", tenth(2))
            .with("mid", tenth(5))
    }

    #[test]
    fn test_select_ranks_query_first() {
        let mut session = session_with(shade_corpus(), SessionConfig::default());
        let result = session.select("black").unwrap();

        assert_eq!(result.ids(), vec!["black", "dark", "mid", "white"]);
        let distances: Vec<Option<f64>> = result.entries.iter().map(|e| e.distance).collect();
        assert_eq!(distances, vec![Some(0.0), Some(4.0), Some(10.0), Some(20.0)]);
        assert_eq!(session.query(), Some("black"));
        assert_eq!(session.corpus().ids()[0], "black");
    }

    #[test]
    fn test_reselect_replaces_ordering() {
        let mut session = session_with(shade_corpus(), SessionConfig::default());
        session.select("black").unwrap();
        session.select("white").unwrap();

        assert_eq!(
            session.corpus().ids(),
            &["white", "mid", "dark", "black"].map(String::from)
        );
    }

    #[test]
    fn test_identical_member_before_query_stays_first() {
        let source = MemorySource::new()
            .with("copy", tenth(3))
            .with("other", tenth(8))
            .with("original", tenth(3));
        let mut session = session_with(source, SessionConfig::default());

        let result = session.select("original").unwrap();
        assert_eq!(result.ids(), vec!["copy", "original", "other"]);
    }

    #[test]
    fn test_query_decode_failure_keeps_state() {
        let mut source = shade_corpus();
        source.insert_unreadable("corrupt");
        let mut session = session_with(source, SessionConfig::default());

        session.select("mid").unwrap();
        let before = session.corpus().clone();

        let err = session.select("corrupt").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert_eq!(session.corpus(), &before);
        assert_eq!(session.query(), Some("mid"));
    }

    #[test]
    fn test_undecodable_members_rank_last() {
        let mut source = MemorySource::new().with("a", tenth(1));
        source.insert_unreadable("broken");
        source.insert("b", tenth(9));
        let mut session = session_with(source, SessionConfig::default());

        let result = session.select("b").unwrap();
        assert_eq!(result.ids(), vec!["b", "a", "broken"]);
        assert_eq!(result.entries[2].distance, None);
    }

    #[test]
    fn test_unknown_image_rejected() {
        let mut session = session_with(shade_corpus(), SessionConfig::default());
        assert!(matches!(
            session.select("nope"),
            Err(Error::UnknownImage(_))
        ));
        assert!(session.query().is_none());
    }

    #[test]
    fn test_member_fingerprint_rejects_outside_ids() {
        let source = shade_corpus().with("../outside", tenth(1));
        let corpus = Corpus::new(vec!["white".to_string(), "black".to_string()]);
        let session = QuerySession::with_corpus(
            Arc::new(source),
            Arc::new(FingerprintCache::default()),
            corpus,
            SessionConfig::default(),
        );

        let fp = session.member_fingerprint("white").unwrap();
        assert_eq!(fp.method(), Method::Intensity);
        assert_eq!(fp.pixel_count(), 10);

        assert!(matches!(
            session.member_fingerprint("../outside"),
            Err(Error::UnknownImage(_))
        ));
        assert!(!session.cache().contains("../outside", Method::Intensity));
    }

    #[test]
    fn test_empty_corpus() {
        let mut session = session_with(MemorySource::new(), SessionConfig::default());
        assert!(session.visible().is_empty());
        assert_eq!(session.page_count(), 0);
        assert!(session.select("anything").is_err());
    }

    #[test]
    fn test_method_switch_keeps_cached_fingerprints() {
        let mut session = session_with(shade_corpus(), SessionConfig::default());
        session.select("dark").unwrap();
        assert!(session.cache().contains("dark", Method::Intensity));

        session.set_method(Method::ColorCode);
        let result = session.select("dark").unwrap();
        assert_eq!(result.method, Method::ColorCode);
        assert!(session.cache().contains("dark", Method::Intensity));
        assert!(session.cache().contains("dark", Method::ColorCode));
        assert_eq!(session.cache().len(), 8);
    }

    #[test]
    fn test_normalized_policy_ignores_resolution() {
        let source = MemorySource::new()
            .with("small", PackedRaster::filled(1, 1, PackedRgb::from_rgb(0, 0, 0)))
            .with("red", PackedRaster::filled(2, 2, PackedRgb::from_rgb(255, 0, 0)))
            .with("large", PackedRaster::filled(8, 8, PackedRgb::from_rgb(0, 0, 0)));
        let config = SessionConfig {
            policy: DistancePolicy::Normalized,
            ..Default::default()
        };
        let mut session = session_with(source, config);

        let result = session.select("small").unwrap();
        assert_eq!(result.ids(), vec!["small", "large", "red"]);
        assert_eq!(result.entries[1].distance, Some(0.0));
    }

    fn numbered_corpus(n: usize) -> MemorySource {
        let mut source = MemorySource::new();
        for i in 0..n {
            source.insert(format!("{i:03}"), mix(i as u32, n as u32));
        }
        source
    }

    #[test]
    fn test_page_cursor_kept_after_rank_by_default() {
        let mut session = session_with(numbered_corpus(45), SessionConfig::default());
        assert!(session.next_page());
        assert_eq!(session.visible().len(), 20);

        session.select_visible(0).unwrap();
        assert_eq!(session.query(), Some("020"));
        assert_eq!(session.pager().current_page(), 1);
        assert_eq!(session.corpus().ids()[0], "020");
    }

    #[test]
    fn test_page_cursor_reset_when_configured() {
        let config = SessionConfig {
            reset_page_on_rank: true,
            ..Default::default()
        };
        let mut session = session_with(numbered_corpus(45), config);
        session.next_page();
        session.next_page();
        assert_eq!(session.visible().len(), 5);

        session.select_visible(4).unwrap();
        assert_eq!(session.pager().current_page(), 0);
        assert_eq!(session.visible()[0], "044");
    }

    #[test]
    fn test_select_visible_out_of_range() {
        let mut session = session_with(shade_corpus(), SessionConfig::default());
        assert!(matches!(
            session.select_visible(10),
            Err(Error::UnknownImage(_))
        ));
    }

    #[test]
    fn test_shared_session_serializes_selections() {
        let session = session_with(numbered_corpus(30), SessionConfig::default());
        let shared = SharedSession::new(session);

        let handles: Vec<_> = ["000", "010", "029"]
            .into_iter()
            .map(|id| {
                let shared = shared.clone();
                std::thread::spawn(move || shared.select(id).unwrap())
            })
            .collect();

        for handle in handles {
            let result = handle.join().unwrap();
            assert_eq!(result.len(), 30);
            assert_eq!(result.entries[0].distance, Some(0.0));
        }

        shared.with(|session| {
            let query = session.query().unwrap().to_string();
            assert_eq!(session.corpus().ids()[0], query);
        });
    }
}
