use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use crate::constants::{CACHE_EXPIRY_KEY, MOVIES_CACHE_KEY};
use crate::models::MovieRecord;

/// File-backed snapshot cache for the movie collection
///
/// Two string keys, each one file under the cache directory: the
/// JSON-serialized movie array and its expiry timestamp (Unix millis).
/// Write failures are logged and swallowed; a cache that cannot be
/// written must never fail the read path that produced the data.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
    ttl_minutes: u64,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>, ttl_minutes: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl_minutes,
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Read the cached snapshot, if present and fresh
    ///
    /// Returns None when either key is missing, the payload fails to
    /// parse, or the expiry has passed. An expired snapshot is removed
    /// as a side effect.
    pub fn read(&self) -> Option<Vec<MovieRecord>> {
        let expiry_raw = fs::read_to_string(self.key_path(CACHE_EXPIRY_KEY)).ok()?;
        let payload = fs::read_to_string(self.key_path(MOVIES_CACHE_KEY)).ok()?;

        let expires_at: i64 = match expiry_raw.trim().parse() {
            Ok(ts) => ts,
            Err(_) => {
                tracing::warn!("Unparseable cache expiry, discarding snapshot");
                self.clear();
                return None;
            }
        };

        if Utc::now().timestamp_millis() >= expires_at {
            // Expired cache, clear it
            self.clear();
            return None;
        }

        match serde_json::from_str(&payload) {
            Ok(movies) => Some(movies),
            Err(e) => {
                tracing::warn!("Unparseable cache payload, discarding snapshot: {}", e);
                self.clear();
                None
            }
        }
    }

    /// Overwrite the snapshot and stamp a fresh expiry
    pub fn write(&self, movies: &[MovieRecord]) {
        let payload = match serde_json::to_string(movies) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Failed to serialize movie snapshot: {}", e);
                return;
            }
        };

        let expires_at =
            Utc::now().timestamp_millis() + (self.ttl_minutes as i64) * 60 * 1000;

        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!("Failed to create cache directory: {}", e);
            return;
        }
        if let Err(e) = fs::write(self.key_path(MOVIES_CACHE_KEY), payload) {
            tracing::warn!("Failed to write movie snapshot: {}", e);
            return;
        }
        if let Err(e) = fs::write(self.key_path(CACHE_EXPIRY_KEY), expires_at.to_string()) {
            tracing::warn!("Failed to write snapshot expiry: {}", e);
            return;
        }

        tracing::debug!("Cached {} movies", movies.len());
    }

    /// Remove both keys
    pub fn clear(&self) {
        let _ = fs::remove_file(self.key_path(MOVIES_CACHE_KEY));
        let _ = fs::remove_file(self.key_path(CACHE_EXPIRY_KEY));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_movies() -> Vec<MovieRecord> {
        vec![
            MovieRecord {
                id: "a".repeat(64),
                name: "Dune".to_string(),
                name_lower: "dune".to_string(),
                year: 2021,
                created_at: 1_700_000_100,
            },
            MovieRecord {
                id: "b".repeat(64),
                name: "The Dark Knight".to_string(),
                name_lower: "the dark knight".to_string(),
                year: 2008,
                created_at: 1_700_000_000,
            },
        ]
    }

    #[test]
    fn test_round_trip_before_expiry() {
        let tmp = TempDir::new().unwrap();
        let cache = SnapshotCache::new(tmp.path(), 30);

        let movies = sample_movies();
        cache.write(&movies);

        assert_eq!(cache.read(), Some(movies));
    }

    #[test]
    fn test_read_absent_when_empty() {
        let tmp = TempDir::new().unwrap();
        let cache = SnapshotCache::new(tmp.path(), 30);

        assert_eq!(cache.read(), None);
    }

    #[test]
    fn test_expired_snapshot_clears_both_keys() {
        let tmp = TempDir::new().unwrap();
        // Zero TTL: expiry stamp is already in the past by read time
        let cache = SnapshotCache::new(tmp.path(), 0);

        cache.write(&sample_movies());
        assert_eq!(cache.read(), None);

        assert!(!tmp.path().join(MOVIES_CACHE_KEY).exists());
        assert!(!tmp.path().join(CACHE_EXPIRY_KEY).exists());
    }

    #[test]
    fn test_corrupt_payload_reads_as_absent() {
        let tmp = TempDir::new().unwrap();
        let cache = SnapshotCache::new(tmp.path(), 30);

        cache.write(&sample_movies());
        fs::write(tmp.path().join(MOVIES_CACHE_KEY), "not json").unwrap();

        assert_eq!(cache.read(), None);
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let tmp = TempDir::new().unwrap();
        let cache = SnapshotCache::new(tmp.path(), 30);

        cache.write(&sample_movies());
        cache.clear();

        assert_eq!(cache.read(), None);
    }
}
