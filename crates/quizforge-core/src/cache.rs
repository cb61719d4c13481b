//! Response cache for model-assisted scoring.
//!
//! Keeps previously computed verdicts keyed by a request fingerprint so
//! identical submissions inside the idle window skip the model round trip.
//! Expiration is sliding: every read refreshes the idle timer. Eviction is
//! best-effort — expired entries are dropped when read, and swept in bulk
//! once the map outgrows its capacity hint. Entries written but never
//! re-read do not survive the idle window.
//!
//! There is no per-key call coalescing: concurrent misses for the same key
//! each pay the external call. The last writer wins, which is harmless since
//! identical requests produce equivalent verdicts.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default entry count the map is sized for.
pub const DEFAULT_CAPACITY_HINT: usize = 1024;

/// Default idle window before an unread entry expires.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    value: String,
    last_access: Instant,
}

/// Bounded, time-expiring key/value store shared by concurrent scoring calls.
///
/// The capacity hint is a sizing hint, not a hard cap; the map may grow
/// under load between sweeps.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity_hint: usize,
    idle_ttl: Duration,
}

impl ResponseCache {
    pub fn new(capacity_hint: usize, idle_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_capacity(capacity_hint)),
            capacity_hint,
            idle_ttl,
        }
    }

    /// Look up a value, refreshing its idle timer. An entry found expired is
    /// removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(key) {
            Some(entry) if now.duration_since(entry.last_access) < self.idle_ttl => {
                entry.last_access = now;
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or replace a value. Sweeps expired entries once the map has
    /// outgrown its capacity hint.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.into(),
            CacheEntry {
                value: value.into(),
                last_access: now,
            },
        );
        if entries.len() > self.capacity_hint {
            let ttl = self.idle_ttl;
            entries.retain(|_, entry| now.duration_since(entry.last_access) < ttl);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_HINT, DEFAULT_IDLE_TTL)
    }
}

/// Canonical serialization of a choice list, shared by fingerprinting and
/// the `choices` field of a `ScoredAnswer`. Stable ordering and separators
/// keep fingerprints reproducible across processes.
pub fn serialize_choices(choices: &[String]) -> String {
    serde_json::to_string(choices).expect("string list serialization is infallible")
}

/// Cache key for a scoring request: hex md5 over `"{app_id}:{choices}"`.
///
/// A compact, deterministic digest with an astronomically unlikely collision
/// rate; not used for anything security-relevant.
pub fn fingerprint(app_id: u64, serialized_choices: &str) -> String {
    format!("{:x}", md5::compute(format!("{app_id}:{serialized_choices}")))
}
