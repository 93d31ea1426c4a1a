//! Mock key-value store for testing.

use crate::error::{Result, SessionError};
use crate::providers::KeyValueStore;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock key-value store.
///
/// Uses in-memory storage for testing. Clones share the same map, so a test
/// can keep a handle after moving the store into the manager.
#[derive(Debug, Clone, Default)]
pub struct MockKeyValueStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    writes: Arc<AtomicUsize>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    write_budget: Arc<Mutex<Option<usize>>>,
}

fn lock_failed() -> SessionError {
    SessionError::Internal("Mutex lock failed".to_string())
}

impl MockKeyValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `entries`.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.entries.lock() {
            for (key, value) in entries {
                map.insert(key.to_string(), value.to_string());
            }
        }
        store
    }

    /// Copy of every stored entry (for testing).
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .map(|map| map.clone())
            .unwrap_or_default()
    }

    /// Number of successful `set`/`remove` calls (for testing).
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent `get` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set`/`remove` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Let the next `successful` writes through and fail the one after.
    ///
    /// Later writes succeed again. Simulates a write that dies halfway
    /// through a multi-key save.
    pub fn fail_write_after(&self, successful: usize) {
        if let Ok(mut budget) = self.write_budget.lock() {
            *budget = Some(successful);
        }
    }

    /// Count one write against the budget. `false` for the write that fails.
    fn take_write(budget: &Mutex<Option<usize>>) -> Result<bool> {
        let mut budget = budget.lock().map_err(|_| lock_failed())?;
        Ok(match budget.as_mut() {
            None => true,
            Some(0) => {
                *budget = None;
                false
            }
            Some(remaining) => {
                *remaining -= 1;
                true
            }
        })
    }
}

impl KeyValueStore for MockKeyValueStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let entries = Arc::clone(&self.entries);
        let fail = self.fail_reads.load(Ordering::SeqCst);
        let key = key.to_string();

        async move {
            if fail {
                return Err(SessionError::Storage("read failure injected".to_string()));
            }
            let entries = entries.lock().map_err(|_| lock_failed())?;
            Ok(entries.get(&key).cloned())
        }
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send {
        let entries = Arc::clone(&self.entries);
        let writes = Arc::clone(&self.writes);
        let fail = self.fail_writes.load(Ordering::SeqCst);
        let key = key.to_string();
        let value = value.to_string();
        let budget = Arc::clone(&self.write_budget);

        async move {
            if fail || !Self::take_write(&budget)? {
                return Err(SessionError::Storage("write failure injected".to_string()));
            }
            entries.lock().map_err(|_| lock_failed())?.insert(key, value);
            writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        let entries = Arc::clone(&self.entries);
        let writes = Arc::clone(&self.writes);
        let fail = self.fail_writes.load(Ordering::SeqCst);
        let key = key.to_string();
        let budget = Arc::clone(&self.write_budget);

        async move {
            if fail || !Self::take_write(&budget)? {
                return Err(SessionError::Storage("write failure injected".to_string()));
            }
            entries.lock().map_err(|_| lock_failed())?.remove(&key);
            writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
