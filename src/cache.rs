use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::domain::Category;
use crate::error::CatalogError;

pub const DEFAULT_TTL_SECS: i64 = 3600;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub trait DurableTier: Send + Sync {
    fn load(&self) -> Result<Option<CacheEntry>, CatalogError>;
    fn save(&self, entry: &CacheEntry) -> Result<(), CatalogError>;
    fn clear(&self) -> Result<(), CatalogError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDurableTier;

impl DurableTier for NoDurableTier {
    fn load(&self) -> Result<Option<CacheEntry>, CatalogError> {
        Ok(None)
    }

    fn save(&self, _entry: &CacheEntry) -> Result<(), CatalogError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub data: Vec<Category>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLookup {
    pub data: Option<Vec<Category>>,
    pub is_fresh: bool,
}

impl CacheLookup {
    fn miss() -> Self {
        Self {
            data: None,
            is_fresh: false,
        }
    }

    fn hit(data: Vec<Category>) -> Self {
        Self {
            data: Some(data),
            is_fresh: true,
        }
    }
}

pub struct CacheStore {
    durable: Box<dyn DurableTier>,
    volatile: Mutex<Option<CacheEntry>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(durable: Box<dyn DurableTier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            durable,
            volatile: Mutex::new(None),
            clock,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(NoDurableTier), Arc::new(SystemClock))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now() - entry.timestamp < self.ttl
    }

    // Fresh durable data is promoted into memory.
    pub fn get(&self) -> CacheLookup {
        match self.durable.load() {
            Ok(Some(entry)) if self.is_fresh(&entry) => {
                debug!(timestamp = %entry.timestamp, "cache hit (durable)");
                let data = entry.data.clone();
                *self.volatile() = Some(entry);
                return CacheLookup::hit(data);
            }
            Ok(Some(entry)) => debug!(timestamp = %entry.timestamp, "durable cache is stale"),
            Ok(None) => debug!("durable cache is empty"),
            Err(err) => debug!("durable cache unreadable: {err}"),
        }

        match self.volatile().as_ref() {
            Some(entry) if self.is_fresh(entry) => {
                debug!(timestamp = %entry.timestamp, "cache hit (memory)");
                CacheLookup::hit(entry.data.clone())
            }
            _ => {
                debug!("cache miss");
                CacheLookup::miss()
            }
        }
    }

    pub fn set(&self, data: Vec<Category>) {
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now(),
        };
        if let Err(err) = self.durable.save(&entry) {
            warn!("durable cache write failed, keeping memory copy only: {err}");
        }
        *self.volatile() = Some(entry);
    }

    pub fn clear(&self) -> Result<(), CatalogError> {
        *self.volatile() = None;
        self.durable.clear()
    }

    fn volatile(&self) -> MutexGuard<'_, Option<CacheEntry>> {
        self.volatile
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
