//! File Access Lock
//!
//! Non-blocking readers/writer lock for a single filename.

use parking_lot::Mutex;

use super::ConnectionId;

/// Reader/writer state guarded by the lock's own mutex
#[derive(Debug, Default)]
struct AccessState {
    /// Number of sessions holding read access
    readers: usize,

    /// Session holding write access, if any
    writer: Option<ConnectionId>,
}

/// Readers/writer lock for one filename
///
/// ## Concurrency:
/// - `state`: own mutex, held only while fields are inspected or mutated
/// - Operations on two different locks never contend
///
/// Invariant: `writer.is_some()` and `readers > 0` never hold together.
#[derive(Debug)]
pub struct FileAccessLock {
    /// Registry key this lock belongs to
    filename: String,

    state: Mutex<AccessState>,
}

impl FileAccessLock {
    /// Create an idle lock for `filename`
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            state: Mutex::new(AccessState::default()),
        }
    }

    /// Filename this lock guards
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Try to take shared access
    ///
    /// Fails without changing state if a writer holds the lock.
    pub fn try_acquire_read(&self) -> bool {
        let mut state = self.state.lock();
        if state.writer.is_some() {
            return false;
        }
        state.readers += 1;
        true
    }

    /// Try to take exclusive access on behalf of `owner`
    ///
    /// Fails without changing state if there is a writer or any reader.
    pub fn try_acquire_write(&self, owner: ConnectionId) -> bool {
        let mut state = self.state.lock();
        if state.writer.is_some() || state.readers > 0 {
            return false;
        }
        state.writer = Some(owner);
        true
    }

    /// Give back shared access
    pub fn release_read(&self) {
        let mut state = self.state.lock();
        if state.readers == 0 {
            tracing::warn!("release_read on {} with no readers", self.filename);
            return;
        }
        state.readers -= 1;
    }

    /// Give back exclusive access
    pub fn release_write(&self) {
        self.state.lock().writer = None;
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of active readers
    pub fn readers(&self) -> usize {
        self.state.lock().readers
    }

    /// Whether a writer holds the lock
    pub fn is_write_locked(&self) -> bool {
        self.state.lock().writer.is_some()
    }

    /// Current writer, if any
    pub fn writer(&self) -> Option<ConnectionId> {
        self.state.lock().writer
    }

    /// No readers and no writer
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.readers == 0 && state.writer.is_none()
    }
}
