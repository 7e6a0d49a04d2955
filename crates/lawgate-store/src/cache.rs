//! Content-addressed, TTL-expiring result cache persisted as one JSON file.
//!
//! Keys are derived from the normalised subject and reference texts, so the
//! same question over the same context hits across restarts. Stale entries
//! are dropped lazily on lookup or in bulk by [`ResultCache::purge_expired`].

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use lawgate_core::normalize_text;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    value: Value,
    created_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }
}

pub struct ResultCache {
    path: Option<PathBuf>,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    /// Open a file-backed cache. A missing file starts empty; so does a
    /// corrupt one, after a warning.
    pub fn open(path: &Path, ttl: Duration) -> Result<Self, StoreError> {
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };
        info!(path = %path.display(), entries = entries.len(), "opened result cache");
        Ok(Self {
            path: Some(path.to_path_buf()),
            ttl,
            entries: Mutex::new(entries),
        })
    }

    /// Cache that never touches disk.
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            path: None,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// `sha256(subject) + "_" + sha256(reference)`, both normalised first.
    pub fn key(subject: &str, reference: &str) -> String {
        format!(
            "{}_{}",
            sha256_hex(&normalize_text(subject)),
            sha256_hex(&normalize_text(reference))
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get<T: DeserializeOwned>(&self, subject: &str, reference: &str) -> Option<T> {
        self.get_at(subject, reference, Utc::now())
    }

    /// Lookup as of `now`. An expired entry is removed and reported absent.
    pub fn get_at<T: DeserializeOwned>(
        &self,
        subject: &str,
        reference: &str,
        now: DateTime<Utc>,
    ) -> Option<T> {
        let key = Self::key(subject, reference);
        let mut entries = self.lock();

        let entry = match entries.get(&key) {
            Some(entry) => entry,
            None => {
                debug!(key = %key, "cache miss");
                return None;
            }
        };

        if entry.is_expired(now, self.ttl) {
            debug!(key = %key, "cache entry expired");
            entries.remove(&key);
            return None;
        }

        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cached value has unexpected shape");
                None
            }
        }
    }

    pub fn put<T: Serialize>(&self, subject: &str, reference: &str, value: &T) -> Result<(), StoreError> {
        self.put_at(subject, reference, value, Utc::now())
    }

    /// Store `value` stamped with `now` and persist the whole cache.
    pub fn put_at<T: Serialize>(
        &self,
        subject: &str,
        reference: &str,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let entry = CacheEntry {
            value: serde_json::to_value(value)?,
            created_at: now,
        };
        let mut entries = self.lock();
        entries.insert(Self::key(subject, reference), entry);
        self.persist(&entries)
    }

    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        self.purge_expired_at(Utc::now())
    }

    /// Drop every entry older than the TTL, persisting if anything went.
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
        let removed = before - entries.len();
        if removed > 0 {
            self.persist(&entries)?;
            info!(removed, remaining = entries.len(), "purged expired cache entries");
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write to a temp file beside the target, then rename over it.
    fn persist(&self, entries: &HashMap<String, CacheEntry>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, entries)?;
        tmp.flush()?;
        tmp.persist(path)?;
        Ok(())
    }
}

fn sha256_hex(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn at(days: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::days(days)
    }

    #[test]
    fn key_is_normalised_and_stable() {
        let a = ResultCache::key("  Age  Verification ", "COPPA\ntext");
        let b = ResultCache::key("age verification", "coppa text");
        assert_eq!(a, b);
        let (left, right) = a.split_once('_').unwrap();
        assert_eq!(left.len(), 64);
        assert_eq!(right.len(), 64);
        assert_ne!(a, ResultCache::key("age verification", "gdpr text"));
    }

    #[test]
    fn put_then_get() {
        let cache = ResultCache::in_memory(Duration::days(30));
        cache.put_at("feature", "context", &json!({"risk": "high"}), at(0)).unwrap();
        let value: Value = cache.get_at("feature", "context", at(1)).unwrap();
        assert_eq!(value["risk"], "high");
        assert!(cache.get_at::<Value>("feature", "other", at(1)).is_none());
    }

    #[test]
    fn repeated_put_is_idempotent() {
        let cache = ResultCache::in_memory(Duration::days(30));
        cache.put_at("f", "c", &1u32, at(0)).unwrap();
        cache.put_at("f", "c", &1u32, at(0)).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at::<u32>("f", "c", at(0)), Some(1));
    }

    #[test]
    fn expired_entry_is_removed_on_lookup() {
        let cache = ResultCache::in_memory(Duration::days(30));
        cache.put_at("f", "c", &"v", at(0)).unwrap();
        assert_eq!(cache.get_at::<String>("f", "c", at(30)).as_deref(), Some("v"));
        assert!(cache.get_at::<String>("f", "c", at(31)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_removes_only_stale_entries() {
        let cache = ResultCache::in_memory(Duration::days(30));
        cache.put_at("old", "c", &1u32, at(0)).unwrap();
        cache.put_at("new", "c", &2u32, at(20)).unwrap();
        assert_eq!(cache.purge_expired_at(at(40)).unwrap(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at::<u32>("new", "c", at(40)), Some(2));
    }

    #[test]
    fn persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache").join("results.json");

        let cache = ResultCache::open(&path, Duration::days(30)).unwrap();
        cache.put("Age gate", "COPPA", &json!({"regulations": ["COPPA"]})).unwrap();
        drop(cache);

        let reopened = ResultCache::open(&path, Duration::days(30)).unwrap();
        let value: Value = reopened.get("age gate", "coppa").unwrap();
        assert_eq!(value["regulations"][0], "COPPA");
    }

    #[test]
    fn file_uses_camel_case_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.json");
        let cache = ResultCache::open(&path, Duration::days(30)).unwrap();
        cache.put_at("f", "c", &true, at(0)).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &raw[ResultCache::key("f", "c")];
        assert_eq!(entry["value"], true);
        assert!(entry["createdAt"].is_string());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cache = ResultCache::open(&path, Duration::days(30)).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn wrong_shape_is_a_miss() {
        let cache = ResultCache::in_memory(Duration::days(30));
        cache.put_at("f", "c", &"text", at(0)).unwrap();
        assert!(cache.get_at::<u32>("f", "c", at(0)).is_none());
    }
}
