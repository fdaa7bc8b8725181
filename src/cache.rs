//! Time-bounded memoization in front of a [`DataSource`].
//!
//! Entries are keyed by the call name and the region actually served, so
//! unknown codes that fall back to the default share one entry. Entries expire
//! after the configured TTL and are dropped once seen stale. Cached tables are handed out as shared `Arc`s; nothing in
//! them is ever mutated.

use crate::aggregate::RegionTables;
use crate::error::ReportError;
use crate::source::DataSource;
use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

type Key = (&'static str, u32);

struct Entry<T> {
    stored_at: Instant,
    value: T,
}

pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    tables: RefCell<HashMap<Key, Entry<Arc<RegionTables>>>>,
    names: RefCell<HashMap<Key, Entry<String>>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<S: DataSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        CachedSource {
            inner,
            ttl,
            tables: RefCell::new(HashMap::new()),
            names: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    pub fn clear(&self) {
        self.tables.borrow_mut().clear();
        self.names.borrow_mut().clear();
    }

    fn lookup<T: Clone>(&self, map: &RefCell<HashMap<Key, Entry<T>>>, key: Key) -> Option<T> {
        let mut map = map.borrow_mut();
        let fresh = map.get(&key)?.stored_at.elapsed() < self.ttl;
        if !fresh {
            debug!("cache expired for {}({})", key.0, key.1);
            map.remove(&key);
            return None;
        }
        self.hits.set(self.hits.get() + 1);
        debug!("cache hit for {}({})", key.0, key.1);
        map.get(&key).map(|entry| entry.value.clone())
    }

    fn store<T>(&self, map: &RefCell<HashMap<Key, Entry<T>>>, key: Key, value: T) {
        self.misses.set(self.misses.get() + 1);
        debug!("cache miss for {}({})", key.0, key.1);
        let mut map = map.borrow_mut();
        map.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        map.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                value,
            },
        );
    }
}

impl<S: DataSource> DataSource for CachedSource<S> {
    fn resolve_region(&self, region_id: u32) -> Result<u32, ReportError> {
        self.inner.resolve_region(region_id)
    }

    fn get_data(&self, region_id: u32) -> Result<Arc<RegionTables>, ReportError> {
        // Errors are not cached; the next call retries.
        let region = self.inner.resolve_region(region_id)?;
        let key = ("get_data", region);
        if let Some(tables) = self.lookup(&self.tables, key) {
            return Ok(tables);
        }
        let tables = self.inner.get_data(region)?;
        self.store(&self.tables, key, Arc::clone(&tables));
        Ok(tables)
    }

    fn get_region_name(&self, region_id: u32) -> String {
        let key = ("get_region_name", region_id);
        if let Some(name) = self.lookup(&self.names, key) {
            return name;
        }
        let name = self.inner.get_region_name(region_id);
        self.store(&self.names, key, name.clone());
        name
    }

    fn skipped_records(&self, region_id: u32) -> usize {
        self.inner.skipped_records(region_id)
    }
}
