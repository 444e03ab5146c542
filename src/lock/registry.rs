//! Lock Registry
//!
//! Reference-counted directory of file access locks, one per filename that
//! at least one session currently references.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::FileAccessLock;

/// A lock plus the number of handles that reference it
#[derive(Debug)]
struct RegistryEntry {
    lock: Arc<FileAccessLock>,

    /// Live `LockHandle`s for this filename
    refs: usize,
}

/// Shared registry of per-filename locks
///
/// Cloning is cheap and yields another view of the same registry. Separate
/// `LockRegistry::new()` calls produce fully independent registries.
///
/// ## Concurrency:
/// - `entries`: one mutex serializes lookup, insert, remove and every
///   reference-count change
/// - The mutex is held only for map mutation, never across file I/O
/// - Reader/writer acquisition happens on the returned lock, outside this
///   mutex
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    entries: Arc<Mutex<HashMap<String, RegistryEntry>>>,
}

impl LockRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the lock for `filename`, creating it if absent
    ///
    /// Bumps the reference count whether or not the caller later manages to
    /// acquire read or write access. The count drops again when the returned
    /// handle is released or dropped.
    pub fn acquire_or_create(&self, filename: &str) -> LockHandle {
        let mut entries = self.entries.lock();

        let lock = match entries.get_mut(filename) {
            Some(entry) => {
                entry.refs += 1;
                Arc::clone(&entry.lock)
            }
            None => {
                let lock = Arc::new(FileAccessLock::new(filename));
                entries.insert(
                    filename.to_string(),
                    RegistryEntry {
                        lock: Arc::clone(&lock),
                        refs: 1,
                    },
                );
                tracing::trace!("Created lock for {}", filename);
                lock
            }
        };

        LockHandle {
            registry: self.clone(),
            lock,
        }
    }

    /// Drop one reference to `lock`
    ///
    /// The entry is removed once no references remain and the lock has no
    /// readers and no writer. An unreferenced lock that is still held stays
    /// in place.
    fn release(&self, lock: &Arc<FileAccessLock>) {
        let mut entries = self.entries.lock();

        let Some(entry) = entries.get_mut(lock.filename()) else {
            tracing::warn!("Released unknown lock {}", lock.filename());
            return;
        };
        if !Arc::ptr_eq(&entry.lock, lock) {
            tracing::warn!("Released stale lock {}", lock.filename());
            return;
        }

        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs > 0 {
            return;
        }

        if entry.lock.is_idle() {
            entries.remove(lock.filename());
            tracing::trace!("Removed lock for {}", lock.filename());
        } else {
            tracing::warn!(
                "Lock for {} has no references but is still held",
                lock.filename()
            );
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of filenames with a live entry
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether `filename` has a live entry
    pub fn contains(&self, filename: &str) -> bool {
        self.entries.lock().contains_key(filename)
    }

    /// Reference count for `filename`, if it has an entry
    pub fn ref_count(&self, filename: &str) -> Option<usize> {
        self.entries.lock().get(filename).map(|entry| entry.refs)
    }

    /// Peek at the lock for `filename` without taking a reference
    pub fn peek(&self, filename: &str) -> Option<Arc<FileAccessLock>> {
        self.entries
            .lock()
            .get(filename)
            .map(|entry| Arc::clone(&entry.lock))
    }
}

/// One counted reference to a registry entry
///
/// Dropping the handle releases the reference exactly once. Any read or
/// write access taken through [`LockHandle::lock`] must be given back before
/// the handle goes away, otherwise the entry outlives its last reference.
#[derive(Debug)]
pub struct LockHandle {
    registry: LockRegistry,
    lock: Arc<FileAccessLock>,
}

impl LockHandle {
    /// The referenced lock
    pub fn lock(&self) -> &FileAccessLock {
        &self.lock
    }

    /// Filename of the referenced lock
    pub fn filename(&self) -> &str {
        self.lock.filename()
    }

    /// Give the reference back to the registry now
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.registry.release(&self.lock);
    }
}
