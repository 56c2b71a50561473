//! Fingerprint cache
//!
//! Holds at most one fingerprint per (image, method) pair. Unbounded by
//! default; with a capacity set, the least recently used entry is evicted
//! once the bound is exceeded. Lookup and insert behave the same either way.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, gauge};
use parking_lot::Mutex;

use crate::types::{Fingerprint, ImageId, Method};
use crate::Result;

/// Cache configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheConfig {
    /// Maximum number of entries; `None` never evicts.
    pub capacity: Option<usize>,
}

impl CacheConfig {
    pub fn unbounded() -> Self {
        Self { capacity: None }
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    id: ImageId,
    method: Method,
}

struct CacheEntry {
    fingerprint: Arc<Fingerprint>,
    last_access: u64,
}

struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    clock: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Runtime statistics for the cache
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    pub intensity_entries: usize,
    pub color_code_entries: usize,
}

/// Session-scoped fingerprint store, safe to share behind an `Arc`
pub struct FingerprintCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl Default for FingerprintCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl FingerprintCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                clock: 0,
            }),
        }
    }

    /// Look up the fingerprint of `id` under `method`
    pub fn get(&self, id: &str, method: Method) -> Option<Arc<Fingerprint>> {
        let key = CacheKey {
            id: id.to_string(),
            method,
        };
        let mut guard = self.state.lock();
        let now = guard.tick();

        match guard.entries.get_mut(&key) {
            Some(entry) => {
                entry.last_access = now;
                counter!("histoseek_cache_hits_total", 1, "method" => method.as_str());
                tracing::debug!(%id, %method, "Fingerprint cache hit");
                Some(entry.fingerprint.clone())
            }
            None => {
                counter!("histoseek_cache_misses_total", 1, "method" => method.as_str());
                tracing::debug!(%id, %method, "Fingerprint cache miss");
                None
            }
        }
    }

    /// Store a fingerprint under its own method, replacing any previous one.
    pub fn insert(&self, id: impl Into<ImageId>, fingerprint: Fingerprint) -> Arc<Fingerprint> {
        let key = CacheKey {
            id: id.into(),
            method: fingerprint.method(),
        };
        let fingerprint = Arc::new(fingerprint);

        let mut guard = self.state.lock();
        let now = guard.tick();
        guard.entries.insert(
            key,
            CacheEntry {
                fingerprint: fingerprint.clone(),
                last_access: now,
            },
        );
        self.evict_if_needed(&mut guard);
        gauge!("histoseek_cache_entries", guard.entries.len() as f64);

        fingerprint
    }

    /// Return the cached fingerprint, computing and storing it on a miss.
    ///
    /// `compute` runs without the cache lock held.
    pub fn get_or_try_insert_with<F>(
        &self,
        id: &str,
        method: Method,
        compute: F,
    ) -> Result<Arc<Fingerprint>>
    where
        F: FnOnce() -> Result<Fingerprint>,
    {
        if let Some(fingerprint) = self.get(id, method) {
            return Ok(fingerprint);
        }
        let fingerprint = compute()?;
        debug_assert_eq!(fingerprint.method(), method);
        Ok(self.insert(id, fingerprint))
    }

    pub fn contains(&self, id: &str, method: Method) -> bool {
        let key = CacheKey {
            id: id.to_string(),
            method,
        };
        self.state.lock().entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let guard = self.state.lock();
        let intensity_entries = guard
            .entries
            .keys()
            .filter(|key| key.method == Method::Intensity)
            .count();
        CacheStats {
            entry_count: guard.entries.len(),
            intensity_entries,
            color_code_entries: guard.entries.len() - intensity_entries,
        }
    }

    fn evict_if_needed(&self, guard: &mut CacheState) {
        let Some(capacity) = self.config.capacity else {
            return;
        };

        while guard.entries.len() > capacity {
            let victim = guard
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone());

            match victim {
                Some(key) => {
                    guard.entries.remove(&key);
                    counter!(
                        "histoseek_cache_evictions_total",
                        1,
                        "method" => key.method.as_str()
                    );
                    tracing::debug!(id = %key.id, method = %key.method, "Evicted fingerprint");
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn fingerprint(method: Method, pixels: u64) -> Fingerprint {
        Fingerprint::new(method, pixels)
    }

    #[test]
    fn insert_and_get_round_trip() {
        let cache = FingerprintCache::default();
        assert!(cache.get("a.jpg", Method::Intensity).is_none());

        cache.insert("a.jpg", fingerprint(Method::Intensity, 4));
        let hit = cache.get("a.jpg", Method::Intensity).expect("cached");
        assert_eq!(hit.pixel_count(), 4);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn methods_are_cached_separately() {
        let cache = FingerprintCache::default();
        cache.insert("a.jpg", fingerprint(Method::Intensity, 4));
        assert!(cache.get("a.jpg", Method::ColorCode).is_none());

        cache.insert("a.jpg", fingerprint(Method::ColorCode, 9));
        assert_eq!(cache.get("a.jpg", Method::Intensity).unwrap().pixel_count(), 4);
        assert_eq!(cache.get("a.jpg", Method::ColorCode).unwrap().pixel_count(), 9);
        assert_eq!(
            cache.stats(),
            CacheStats {
                entry_count: 2,
                intensity_entries: 1,
                color_code_entries: 1,
            }
        );
    }

    #[test]
    fn get_or_try_insert_with_computes_once() {
        let cache = FingerprintCache::default();
        let mut calls = 0;
        for _ in 0..3 {
            let fp = cache
                .get_or_try_insert_with("a.jpg", Method::ColorCode, || {
                    calls += 1;
                    Ok(fingerprint(Method::ColorCode, 1))
                })
                .unwrap();
            assert_eq!(fp.method(), Method::ColorCode);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn failed_compute_leaves_cache_untouched() {
        let cache = FingerprintCache::default();
        let result = cache.get_or_try_insert_with("bad.jpg", Method::Intensity, || {
            Err(Error::decode("bad.jpg", "truncated"))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn unbounded_cache_never_evicts() {
        let cache = FingerprintCache::new(CacheConfig::unbounded());
        for idx in 0..500 {
            cache.insert(format!("img-{idx}"), fingerprint(Method::Intensity, 1));
        }
        assert_eq!(cache.len(), 500);
    }

    #[test]
    fn evicts_least_recently_used_when_bounded() {
        let cache = FingerprintCache::new(CacheConfig::bounded(2));
        cache.insert("first", fingerprint(Method::Intensity, 1));
        cache.insert("second", fingerprint(Method::Intensity, 2));

        // touch "first" so "second" becomes the victim
        cache.get("first", Method::Intensity);
        cache.insert("third", fingerprint(Method::Intensity, 3));

        assert!(cache.contains("first", Method::Intensity));
        assert!(!cache.contains("second", Method::Intensity));
        assert!(cache.contains("third", Method::Intensity));
        assert_eq!(cache.len(), 2);
    }
}
