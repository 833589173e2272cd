use crate::error::{CampuscalError, Result};
use crate::event::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// Storage key of the single cache slot
pub const CACHE_KEY: &str = "campuscal-events";

/// String key-value storage backing the event cache
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// One JSON file per key inside a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<cache dir>/campuscal`
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("campuscal")
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process store, handy for tests and one-shot runs
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CampuscalError::Storage("memory store poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CampuscalError::Storage("memory store poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CampuscalError::Storage("memory store poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntryRef<'a> {
    events: &'a [DomainEvent],
    ics_url: &'a str,
    cached_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    events: Vec<DomainEvent>,
    ics_url: String,
    cached_at: DateTime<Utc>,
}

/// Events read back from the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEvents {
    pub events: Vec<DomainEvent>,
    pub cached_at: DateTime<Utc>,
}

/// Last successfully loaded event list, for offline use.
///
/// Single slot: every write replaces the previous entry whatever its URL.
/// Storage failures are logged and read as a miss.
pub struct CacheStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> CacheStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn cache_events(&self, events: &[DomainEvent], url: &str) {
        if let Err(e) = self.write(events, url) {
            log::warn!("Failed to cache events: {}", e);
        }
    }

    /// Cached events for exactly `url`, if any
    pub fn load_cached_events(&self, url: &str) -> Option<CachedEvents> {
        match self.read() {
            Ok(Some(entry)) if entry.ics_url == url => Some(CachedEvents {
                events: entry.events,
                cached_at: entry.cached_at,
            }),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to read event cache: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.delete(CACHE_KEY) {
            log::warn!("Failed to clear event cache: {}", e);
        }
    }

    fn write(&self, events: &[DomainEvent], url: &str) -> Result<()> {
        let entry = CacheEntryRef {
            events,
            ics_url: url,
            cached_at: Utc::now(),
        };
        let json = serde_json::to_string(&entry)?;
        self.store.set(CACHE_KEY, &json)
    }

    fn read(&self) -> Result<Option<CacheEntry>> {
        let Some(content) = self.store.get(CACHE_KEY)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&content)?))
    }
}
