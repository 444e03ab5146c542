//! Lock Module
//!
//! Per-filename readers/writer locks and the registry that owns them.
//!
//! ## Responsibilities
//! - Enforce single-writer/multi-reader access per filename
//! - Create locks on first reference, destroy them when unreferenced and idle
//! - Never block: every acquisition is try-style and fails fast on conflict
//!
//! ## Lock Ordering
//! The registry mutex may be held while a lock's own mutex is taken (the
//! idle check on release). Lock operations never touch the registry, so the
//! order is always registry → lock.

mod file_lock;
mod registry;

pub use file_lock::FileAccessLock;
pub use registry::{LockHandle, LockRegistry};

use std::fmt;

/// Identity of one accepted connection
///
/// Recorded as the owner of a write lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Kind of access a session holds on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Shared, any number of holders
    Read,

    /// Exclusive, one holder and no readers
    Append,
}
