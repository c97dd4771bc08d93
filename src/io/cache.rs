//! Process-wide memoization of loaded datasets.
//!
//! A workbook is read once per `SourceKey`; every later lookup hands out the
//! same `Arc<Dataset>` until an operator explicitly invalidates it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, info};

use crate::domain::{Dataset, SourceKey};

/// Loader signature used by the cache. Production code passes
/// [`crate::io::ingest::load_dataset`].
pub type LoadFn = fn(&SourceKey) -> Dataset;

pub struct DatasetCache {
    loader: LoadFn,
    entries: Mutex<HashMap<SourceKey, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new(loader: LoadFn) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cache shared by the whole process, backed by the workbook loader.
    pub fn global() -> &'static DatasetCache {
        static GLOBAL: OnceLock<DatasetCache> = OnceLock::new();
        GLOBAL.get_or_init(|| DatasetCache::new(crate::io::ingest::load_dataset))
    }

    /// Return the cached dataset for `source`, loading it on first use.
    ///
    /// Failed loads are cached as the empty dataset, same as successful ones.
    pub fn get_or_load(&self, source: &SourceKey) -> Arc<Dataset> {
        let mut entries = self.lock();
        if let Some(hit) = entries.get(source) {
            debug!(source = %source, "dataset cache hit");
            return Arc::clone(hit);
        }
        let dataset = Arc::new((self.loader)(source));
        entries.insert(source.clone(), Arc::clone(&dataset));
        dataset
    }

    /// Drop the cached dataset for `source`. Returns whether one was cached.
    pub fn invalidate(&self, source: &SourceKey) -> bool {
        let removed = self.lock().remove(source).is_some();
        info!(source = %source, removed, "dataset cache invalidated");
        removed
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SourceKey, Arc<Dataset>>> {
        // Nothing panics while holding the lock, but a poisoned map is still valid.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal::Decimal;

    use crate::domain::Record;

    static LOADS: AtomicUsize = AtomicUsize::new(0);

    fn counting_loader(source: &SourceKey) -> Dataset {
        LOADS.fetch_add(1, Ordering::SeqCst);
        Dataset::new(vec![Record {
            agent: source.sheet.clone(),
            week: "W1".to_string(),
            manager: "Ana".to_string(),
            amount: Decimal::ONE,
            units: 1,
            purchase_date: None,
            sale_date: None,
            return_date: None,
        }])
    }

    fn failing_loader(_: &SourceKey) -> Dataset {
        Dataset::empty()
    }

    #[test]
    fn repeated_lookups_share_one_instance_until_invalidated() {
        let cache = DatasetCache::new(counting_loader);
        let key = SourceKey::new("book.xlsx", "cache-identity");
        let before = LOADS.load(Ordering::SeqCst);

        let a = cache.get_or_load(&key);
        let b = cache.get_or_load(&key);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(LOADS.load(Ordering::SeqCst) - before, 1);

        assert!(cache.invalidate(&key));
        let c = cache.get_or_load(&key);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(*a, *c);
        assert_eq!(LOADS.load(Ordering::SeqCst) - before, 2);
    }

    #[test]
    fn sources_are_cached_independently() {
        let cache = DatasetCache::new(counting_loader);
        let a = cache.get_or_load(&SourceKey::new("book.xlsx", "one"));
        let b = cache.get_or_load(&SourceKey::new("book.xlsx", "two"));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.invalidate(&SourceKey::new("book.xlsx", "one")));
    }

    #[test]
    fn failed_loads_are_cached_as_empty() {
        let cache = DatasetCache::new(failing_loader);
        let key = SourceKey::new("missing.xlsx", "Sheet1");
        let a = cache.get_or_load(&key);
        let b = cache.get_or_load(&key);
        assert!(a.is_empty());
        assert!(Arc::ptr_eq(&a, &b));
    }
}
