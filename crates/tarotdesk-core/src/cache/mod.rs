//! Local caching module so the panel can show data before the backend answers.
//!
//! `CacheManager` stores the last loaded contents of each table as JSON under
//! the cache directory. Snapshots are considered stale after 60 minutes.

pub mod manager;

pub use manager::{CacheAges, CacheManager, CachedData};
