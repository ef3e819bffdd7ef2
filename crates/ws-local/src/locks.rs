//! Keyed lock tables.
//!
//! Locks are created on first use and dropped from the table once no caller
//! holds or waits on them, so the table only tracks keys currently in use.
//! The guarded data is `()`, so a poisoned lock carries no broken state and is
//! simply taken over.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Table of reader/writer locks keyed by `K`.
pub(crate) struct RwLockTable<K> {
    locks: Mutex<HashMap<K, Arc<RwLock<()>>>>,
}

impl<K: Eq + Hash + Clone> RwLockTable<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` holding the shared lock for `key`.
    pub fn read<T>(&self, key: &K, f: impl FnOnce() -> T) -> T {
        let lock = self.acquire(key);
        let result = {
            let _guard = lock.read().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(key, lock);
        result
    }

    /// Run `f` holding the exclusive lock for `key`.
    pub fn write<T>(&self, key: &K, f: impl FnOnce() -> T) -> T {
        let lock = self.acquire(key);
        let result = {
            let _guard = lock.write().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(key, lock);
        result
    }

    fn acquire(&self, key: &K) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    fn release(&self, key: &K, lock: Arc<RwLock<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Table + this handle: nobody else is holding or waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Table of exclusive locks keyed by `K`.
pub(crate) struct MutexTable<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> MutexTable<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` holding the lock for `key`.
    pub fn with<T>(&self, key: &K, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn test_table_is_emptied_after_use() {
        let table = RwLockTable::new();

        table.write(&"a".to_owned(), || ());
        table.read(&"b".to_owned(), || ());

        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_write_is_exclusive_per_key() {
        let table = Arc::new(MutexTable::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    table.with(&"doc".to_owned(), || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_distinct_keys_do_not_block() {
        let table = MutexTable::new();

        let result = table.with(&"a".to_owned(), || table.with(&"b".to_owned(), || 7));

        assert_eq!(result, 7);
    }
}
