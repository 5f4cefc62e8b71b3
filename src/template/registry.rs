//! Time-based cache of parsed template fragments
//!
//! Entries are keyed by `extension + "." + qualified name` and stay fresh
//! for the refresh interval, never less than [`MIN_FRESHNESS`]. Freshness is
//! judged against wall-clock time, so adjusting the system clock can expire
//! entries early or keep them late.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::{Mutex, RwLock};

/// Shortest time a parsed fragment is served from cache. Keeps a file with
/// many fragments from being parsed once per fragment in a burst of lookups.
pub const MIN_FRESHNESS: Duration = Duration::from_secs(5);

/// Source of the current time for freshness checks
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> SystemTime;
}

/// The system wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    /// Start the clock at `start`
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}

/// Build the cache key for a fragment; `#` separators count as dots
pub fn fragment_key(extension: &str, name: &str) -> String {
    format!("{}.{}", extension, name.replace('#', "."))
}

/// A cached fragment body and when it was stored
#[derive(Debug, Clone)]
pub struct CachedFragment {
    /// Expanded fragment text
    pub content: String,
    /// When the fragment was parsed
    pub fetched_at: SystemTime,
}

impl CachedFragment {
    /// Check whether the entry is still within `window` at `now`
    pub fn is_fresh(&self, now: SystemTime, window: Duration) -> bool {
        match self.fetched_at.checked_add(window) {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }
}

/// Thread-safe fragment cache
pub struct FragmentCache {
    entries: RwLock<HashMap<String, CachedFragment>>,
    refresh_secs: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl FragmentCache {
    /// Create an empty cache with the given refresh interval
    pub fn new(refresh: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            refresh_secs: AtomicU64::new(refresh.as_secs()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a different time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get the configured refresh interval
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.load(Ordering::Relaxed))
    }

    /// Change the refresh interval; applies to existing entries too
    pub fn set_refresh_interval(&self, refresh: Duration) {
        self.refresh_secs.store(refresh.as_secs(), Ordering::Relaxed);
    }

    /// How long an entry is served before it goes stale
    pub fn freshness_window(&self) -> Duration {
        self.refresh_interval().max(MIN_FRESHNESS)
    }

    /// Get a fragment if it is present and fresh.
    ///
    /// Stale entries are left in place; the next parse overwrites them.
    pub fn get(&self, extension: &str, name: &str) -> Option<String> {
        let key = fragment_key(extension, name);
        let now = self.clock.now();
        let window = self.freshness_window();

        let entries = self.entries.read();
        let entry = entries.get(&key)?;
        if entry.is_fresh(now, window) {
            Some(entry.content.clone())
        } else {
            tracing::debug!(key = %key, "cached fragment is stale");
            None
        }
    }

    /// Check whether a fresh entry exists
    pub fn contains_fresh(&self, extension: &str, name: &str) -> bool {
        let key = fragment_key(extension, name);
        let now = self.clock.now();
        let window = self.freshness_window();
        self.entries
            .read()
            .get(&key)
            .is_some_and(|entry| entry.is_fresh(now, window))
    }

    /// Store a fragment, replacing any previous entry, stamped with the
    /// current time
    pub fn put(&self, extension: &str, name: &str, content: String) {
        let key = fragment_key(extension, name);
        let fragment = CachedFragment {
            content,
            fetched_at: self.clock.now(),
        };
        self.entries.write().insert(key, fragment);
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        tracing::debug!(entries = entries.len(), "clearing fragment cache");
        entries.clear();
    }

    /// Number of entries, fresh or stale
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for FragmentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentCache")
            .field("entries", &self.len())
            .field("refresh", &self.refresh_interval())
            .field("clock", &self.clock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_clock(refresh: Duration) -> (FragmentCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = FragmentCache::new(refresh).with_clock(clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_put_and_get() {
        let (cache, _) = cache_with_clock(Duration::from_secs(60));
        cache.put("html", "page.row", "<tr/>".to_string());
        assert_eq!(cache.get("html", "page.row"), Some("<tr/>".to_string()));
        assert_eq!(cache.get("xml", "page.row"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_hash_separator_is_normalized() {
        let (cache, _) = cache_with_clock(Duration::from_secs(60));
        cache.put("html", "page.outer.inner", "x".to_string());
        assert_eq!(cache.get("html", "page#outer#inner"), Some("x".to_string()));
        assert_eq!(fragment_key("html", "page#row"), "html.page.row");
    }

    #[test]
    fn test_entry_expires_after_window() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(60));
        cache.put("html", "page", "v1".to_string());

        clock.advance(Duration::from_secs(59));
        assert!(cache.contains_fresh("html", "page"));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("html", "page"), None);
        // Stale entries stay until overwritten
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_minimum_freshness_floor() {
        let (cache, clock) = cache_with_clock(Duration::ZERO);
        assert_eq!(cache.freshness_window(), MIN_FRESHNESS);

        cache.put("html", "page", "v1".to_string());
        clock.advance(Duration::from_secs(4));
        assert_eq!(cache.get("html", "page"), Some("v1".to_string()));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("html", "page"), None);
    }

    #[test]
    fn test_put_supersedes_and_restamps() {
        let (cache, clock) = cache_with_clock(Duration::ZERO);
        cache.put("html", "page", "v1".to_string());
        clock.advance(Duration::from_secs(10));
        cache.put("html", "page", "v2".to_string());
        assert_eq!(cache.get("html", "page"), Some("v2".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let (cache, _) = cache_with_clock(Duration::from_secs(60));
        cache.put("html", "a", "1".to_string());
        cache.put("html", "b", "2".to_string());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("html", "a"), None);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(FragmentCache::new(Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        let name = format!("page.f{}", j % 10);
                        cache.put("html", &name, format!("{}-{}", i, j));
                        assert!(cache.get("html", &name).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 10);
    }
}
