use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// Snapshots of table contents, one JSON file per table.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        let cache_dir = cache_dir.join("tables");
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, table: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", table))
    }

    pub fn load_table<T: DeserializeOwned>(&self, table: &str) -> Result<Option<CachedData<Vec<T>>>> {
        let path = self.cache_path(table);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", table))?;

        let cached: CachedData<Vec<T>> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", table))?;

        Ok(Some(cached))
    }

    pub fn save_table<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<()> {
        let cached = CachedData::new(rows);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.cache_path(table), contents)
            .with_context(|| format!("Failed to write cache file: {}", table))?;
        debug!(table = table, rows = rows.len(), "Cached table snapshot");
        Ok(())
    }

    /// Remove every snapshot, e.g. after signing out
    pub fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn load_meta(&self, table: &str) -> Option<CachedData<serde_json::Value>> {
        let contents = std::fs::read_to_string(self.cache_path(table)).ok()?;
        serde_json::from_str(&contents).ok()
    }

    pub fn get_cache_ages(&self, tables: &[&str]) -> CacheAges {
        CacheAges {
            entries: tables
                .iter()
                .map(|t| (t.to_string(), self.load_meta(t).map(|c| c.age_display())))
                .collect(),
        }
    }

    /// True when any table has no snapshot or an old one
    pub fn any_stale(&self, tables: &[&str]) -> bool {
        tables
            .iter()
            .any(|t| self.load_meta(t).map(|c| c.is_stale()).unwrap_or(true))
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub entries: Vec<(String, Option<String>)>,
}

impl CacheAges {
    pub fn age_of(&self, table: &str) -> String {
        self.entries
            .iter()
            .find(|(t, _)| t == table)
            .and_then(|(_, age)| age.clone())
            .unwrap_or_else(|| "never".to_string())
    }

    /// Age of the first table that has a snapshot
    pub fn last_updated(&self) -> String {
        self.entries
            .iter()
            .find_map(|(_, age)| age.clone())
            .unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_cached_data_age_display() {
        let mut cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");

        cached.cached_at = Utc::now() - Duration::minutes(90);
        assert_eq!(cached.age_display(), "2h ago");

        cached.cached_at = Utc::now() - Duration::hours(30);
        assert_eq!(cached.age_display(), "1d ago");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale());
    }

    #[test]
    fn test_table_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();

        assert!(cache.load_table::<String>("members").unwrap().is_none());
        assert!(cache.any_stale(&["members"]));

        cache
            .save_table("members", &["Ada".to_string(), "Grace".to_string()])
            .unwrap();
        let loaded = cache.load_table::<String>("members").unwrap().unwrap();
        assert_eq!(loaded.data, vec!["Ada", "Grace"]);
        assert!(!cache.any_stale(&["members"]));

        let ages = cache.get_cache_ages(&["bookings", "members"]);
        assert_eq!(ages.age_of("bookings"), "never");
        assert_eq!(ages.last_updated(), "just now");

        cache.clear().unwrap();
        assert!(cache.load_table::<String>("members").unwrap().is_none());
    }

    #[test]
    fn test_cache_ages_empty() {
        let ages = CacheAges::default();
        assert_eq!(ages.last_updated(), "never");
    }
}
