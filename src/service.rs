use crate::cache::{CacheStore, CachedEvents, KeyValueStore};
use crate::error::{CampuscalError, Result};
use crate::event::DomainEvent;
use crate::fetch::{FetchPipeline, Transport};
use crate::merge::merge_feeds;
use chrono::{DateTime, Utc};

/// Where a loaded event list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Network,
    /// Fetch failed; these are the events cached at `cached_at`
    Cache { cached_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCalendar {
    pub events: Vec<DomainEvent>,
    pub source: LoadSource,
}

/// Fetches, merges and caches the configured feeds
pub struct CalendarService<T: Transport, S: KeyValueStore> {
    pipeline: FetchPipeline<T>,
    cache: CacheStore<S>,
}

impl<T: Transport, S: KeyValueStore> CalendarService<T, S> {
    pub fn new(pipeline: FetchPipeline<T>, cache: CacheStore<S>) -> Self {
        Self { pipeline, cache }
    }

    /// Last cached events for `url`, without touching the network
    pub fn cached(&self, url: &str) -> Option<CachedEvents> {
        self.cache.load_cached_events(url)
    }

    /// Load the primary feed and, once it succeeded, the secondary one.
    ///
    /// A failing secondary feed is logged and left out. A failing primary
    /// feed falls back to the cache for the same URL; without a cache hit
    /// the fetch error is returned.
    pub async fn load(&self, primary: &str, secondary: Option<&str>) -> Result<LoadedCalendar> {
        let primary_events = match self.pipeline.fetch_events(primary).await {
            Ok(events) => events,
            Err(e @ CampuscalError::Config(_)) => return Err(e),
            Err(e) => return self.fall_back(primary, e),
        };

        let secondary_events = match secondary {
            Some(url) => match self.pipeline.fetch_events(url).await {
                Ok(events) => Some(events),
                Err(e) => {
                    log::warn!("Secondary feed unavailable, showing primary only: {}", e);
                    None
                }
            },
            None => None,
        };

        let events = merge_feeds(primary_events, secondary_events);
        self.cache.cache_events(&events, primary);

        Ok(LoadedCalendar {
            events,
            source: LoadSource::Network,
        })
    }

    fn fall_back(&self, url: &str, error: CampuscalError) -> Result<LoadedCalendar> {
        match self.cache.load_cached_events(url) {
            Some(cached) => {
                log::warn!(
                    "Using cached events from {} after fetch failure: {}",
                    cached.cached_at,
                    error
                );
                Ok(LoadedCalendar {
                    events: cached.events,
                    source: LoadSource::Cache {
                        cached_at: cached.cached_at,
                    },
                })
            }
            None => Err(error),
        }
    }
}
