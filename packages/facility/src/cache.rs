//! TTL cache for facility search results.
//!
//! Keys round the query point to 3 decimal places (roughly 100 m) so
//! repeated lookups from nearly the same spot reuse one provider call.
//! Expired entries are evicted lazily on access and on insert.

use std::collections::BTreeMap;
use std::time::Duration;

use incident_map_facility_models::Facility;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    facilities: Vec<Facility>,
    stored_at: Instant,
}

/// Shared, synchronised facility search cache.
pub struct FacilityCache {
    ttl: Duration,
    entries: Mutex<BTreeMap<String, CacheEntry>>,
}

impl Default for FacilityCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl FacilityCache {
    /// Creates an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Cache key for a search: coordinates rounded to 3 decimals plus the
    /// radius.
    #[must_use]
    pub fn key(latitude: f64, longitude: f64, radius_km: f64) -> String {
        format!("{latitude:.3}_{longitude:.3}_{radius_km}")
    }

    /// Unexpired facilities stored under `key`.
    pub async fn get(&self, key: &str) -> Option<Vec<Facility>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.facilities.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `facilities` under `key`, replacing any previous entry.
    pub async fn insert(&self, key: String, facilities: Vec<Facility>) {
        let mut entries = self.entries.lock().await;
        let ttl = self.ttl;
        entries.retain(|_, e| e.stored_at.elapsed() < ttl);
        entries.insert(
            key,
            CacheEntry {
                facilities,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently held (expired or not).
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
        log::debug!("Facility cache cleared");
    }
}
