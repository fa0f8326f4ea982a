//! In-memory TTL cache.

use arc_swap::ArcSwapOption;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::janitor::Janitor;
use super::numeric::{self, Step};
use super::persistence;
use super::{with_numeric_types, CacheEngine, EvictionCallback, Item, Ttl, Value};
use crate::config::EngineConfig;
use crate::error::{CacheError, Result};

struct EvictionHook(EvictionCallback);

/// Shared state, also reachable from the janitor thread.
pub(crate) struct Store {
    default_ttl: Option<Duration>,
    pub(crate) items: DashMap<String, Item>,
    on_evicted: ArcSwapOption<EvictionHook>,
}

impl Store {
    pub(crate) fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            default_ttl,
            items: DashMap::new(),
            on_evicted: ArcSwapOption::empty(),
        }
    }

    fn item(&self, value: Value, ttl: Ttl) -> Item {
        Item {
            value,
            expiration: ttl.deadline(self.default_ttl, SystemTime::now()),
        }
    }

    /// Remove every expired entry, then notify the eviction callback.
    pub(crate) fn delete_expired(&self) {
        let now = SystemTime::now();
        let hook = self.on_evicted.load_full();
        let mut evicted = Vec::new();
        self.items.retain(|key, item| {
            if !item.is_expired_at(now) {
                return true;
            }
            if hook.is_some() {
                evicted.push((key.clone(), item.value.clone()));
            }
            false
        });
        if let Some(hook) = hook {
            for (key, value) in evicted {
                (hook.0)(key.as_str(), value);
            }
        }
    }

    fn update<T>(&self, key: &str, apply: impl FnOnce(&mut Value) -> Result<T>) -> Result<T> {
        match self.items.get_mut(key) {
            Some(mut entry) if !entry.is_expired() => apply(&mut entry.value),
            _ => Err(CacheError::NotFound(key.to_string())),
        }
    }
}

/// A concurrent key/value cache with per-entry expiration.
///
/// Entries live in a sharded `DashMap`. When a cleanup interval is given a
/// janitor thread sweeps expired entries until the cache is dropped.
pub struct MemoryCache {
    store: Arc<Store>,
    _janitor: Option<Janitor>,
}

impl MemoryCache {
    /// Create a cache. `default_ttl` of `None` means entries written with
    /// [`Ttl::Default`] never expire; `cleanup_interval` of `None` disables
    /// the janitor.
    pub fn new(default_ttl: Option<Duration>, cleanup_interval: Option<Duration>) -> Self {
        Self::from_items(default_ttl, cleanup_interval, HashMap::new())
    }

    /// Create a cache pre-populated with `items`.
    pub fn from_items(
        default_ttl: Option<Duration>,
        cleanup_interval: Option<Duration>,
        items: HashMap<String, Item>,
    ) -> Self {
        let store = Arc::new(Store::new(default_ttl));
        for (key, item) in items {
            store.items.insert(key, item);
        }

        let janitor = cleanup_interval.and_then(|interval| {
            Janitor::spawn(store.clone(), interval)
                .map_err(|e| tracing::warn!(error = %e, "failed to start cache janitor"))
                .ok()
        });

        Self {
            store,
            _janitor: janitor,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.default_ttl(), config.cleanup_interval())
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("default_ttl", &self.store.default_ttl)
            .field("items", &self.store.items.len())
            .field("janitor", &self._janitor.is_some())
            .finish()
    }
}

macro_rules! typed_arithmetic {
    ($($inc:ident, $dec:ident, $ty:ty, $inc_op:ident, $dec_op:ident;)*) => {
        $(
            fn $inc(&self, key: &str, n: $ty) -> Result<$ty> {
                self.store.update(key, |v| numeric::apply_typed(key, v, n, Step::Up))
            }

            fn $dec(&self, key: &str, n: $ty) -> Result<$ty> {
                self.store.update(key, |v| numeric::apply_typed(key, v, n, Step::Down))
            }
        )*
    };
}

impl CacheEngine for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.store
            .items
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    fn get_with_expiration(&self, key: &str) -> Option<(Value, Option<SystemTime>)> {
        self.store
            .items
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| (entry.value.clone(), entry.expiration))
    }

    fn set(&self, key: &str, value: Value, ttl: Ttl) {
        let item = self.store.item(value, ttl);
        self.store.items.insert(key.to_string(), item);
    }

    fn set_default(&self, key: &str, value: Value) {
        self.set(key, value, Ttl::Default)
    }

    fn add(&self, key: &str, value: Value, ttl: Ttl) -> Result<()> {
        let item = self.store.item(value, ttl);
        match self.store.items.entry(key.to_string()) {
            Entry::Occupied(entry) if !entry.get().is_expired() => {
                Err(CacheError::AlreadyExists(key.to_string()))
            }
            Entry::Occupied(mut entry) => {
                entry.insert(item);
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(item);
                Ok(())
            }
        }
    }

    fn replace(&self, key: &str, value: Value, ttl: Ttl) -> Result<()> {
        let item = self.store.item(value, ttl);
        match self.store.items.get_mut(key) {
            Some(mut entry) if !entry.is_expired() => {
                *entry = item;
                Ok(())
            }
            _ => Err(CacheError::NotFound(key.to_string())),
        }
    }

    fn delete(&self, key: &str) {
        // The shard lock is released once `remove` returns.
        let removed = self.store.items.remove(key);
        if let (Some((key, item)), Some(hook)) = (removed, self.store.on_evicted.load_full()) {
            (hook.0)(key.as_str(), item.value);
        }
    }

    fn delete_expired(&self) {
        self.store.delete_expired()
    }

    fn flush(&self) {
        self.store.items.clear()
    }

    fn increment(&self, key: &str, n: i64) -> Result<()> {
        self.store.update(key, |v| numeric::apply_integer(key, v, n, Step::Up))
    }

    fn increment_float(&self, key: &str, n: f64) -> Result<()> {
        self.store.update(key, |v| numeric::apply_float(key, v, n, Step::Up))
    }

    fn decrement(&self, key: &str, n: i64) -> Result<()> {
        self.store.update(key, |v| numeric::apply_integer(key, v, n, Step::Down))
    }

    fn decrement_float(&self, key: &str, n: f64) -> Result<()> {
        self.store.update(key, |v| numeric::apply_float(key, v, n, Step::Down))
    }

    with_numeric_types!(typed_arithmetic);

    fn item_count(&self) -> usize {
        self.store.items.len()
    }

    fn items(&self) -> HashMap<String, Item> {
        let now = SystemTime::now();
        self.store
            .items
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        persistence::save(&self.store.items, writer)
    }

    fn save_file(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        persistence::save(&self.store.items, &mut file)?;
        tracing::debug!(path = %path.display(), "cache snapshot written");
        Ok(())
    }

    fn load(&self, reader: &mut dyn Read) -> Result<()> {
        persistence::load(&self.store.items, reader)
    }

    fn load_file(&self, path: &Path) -> Result<()> {
        let mut file = File::open(path)?;
        persistence::load(&self.store.items, &mut file)?;
        tracing::debug!(path = %path.display(), "cache snapshot restored");
        Ok(())
    }

    fn on_evicted(&self, callback: EvictionCallback) {
        self.store.on_evicted.store(Some(Arc::new(EvictionHook(callback))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_add_over_expired_entry() {
        let cache = MemoryCache::default();
        cache.set("k", Value::from(1_i32), Ttl::After(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.add("k", Value::from(2_i32), Ttl::Never).is_ok());
        assert_eq!(cache.get("k"), Some(Value::I32(2)));
    }

    #[test]
    fn test_replace_requires_live_entry() {
        let cache = MemoryCache::default();
        assert!(matches!(
            cache.replace("k", Value::from("v"), Ttl::Never),
            Err(CacheError::NotFound(_))
        ));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_arithmetic_on_missing_key() {
        let cache = MemoryCache::default();
        assert_eq!(cache.increment("nope", 1).unwrap_err().to_string(), "item nope not found");
        assert!(matches!(cache.decrement_u32("nope", 1), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_delete_expired_notifies_once_per_entry() {
        let cache = MemoryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        cache.on_evicted(Box::new(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        cache.set("a", Value::from(1_u8), Ttl::After(Duration::ZERO));
        cache.set("b", Value::from(1_u8), Ttl::After(Duration::ZERO));
        cache.set("c", Value::from(1_u8), Ttl::Never);
        std::thread::sleep(Duration::from_millis(2));

        assert_eq!(cache.item_count(), 3);
        assert_eq!(cache.items().len(), 1);
        cache.delete_expired();
        assert_eq!(cache.item_count(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_flush_skips_eviction_callback() {
        let cache = MemoryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        cache.on_evicted(Box::new(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        cache.set("a", Value::from(1_u8), Ttl::Never);
        cache.flush();
        assert_eq!(cache.item_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_ttl_applies() {
        let cache = MemoryCache::new(Some(Duration::from_secs(60)), None);
        cache.set_default("k", Value::from("v"));
        let (_, expiration) = cache.get_with_expiration("k").unwrap();
        assert!(expiration.unwrap() > SystemTime::now());
    }
}
