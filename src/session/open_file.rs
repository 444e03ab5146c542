//! Open file ownership
//!
//! Bundles an open file with the lock access that permits it.

use std::fs::File;

use crate::lock::{AccessMode, ConnectionId, LockHandle};

/// Read or write access held on a registry lock
///
/// Dropping the slot gives the access back and then releases the registry
/// reference, in that order.
#[derive(Debug)]
pub(crate) struct AccessSlot {
    mode: AccessMode,
    handle: LockHandle,
}

impl AccessSlot {
    /// Try to take `mode` access through `handle`
    ///
    /// On conflict the handle is dropped here, so the reference taken by the
    /// lookup is released before the caller reports the error.
    pub(crate) fn acquire(handle: LockHandle, mode: AccessMode, owner: ConnectionId) -> Option<Self> {
        let acquired = match mode {
            AccessMode::Read => handle.lock().try_acquire_read(),
            AccessMode::Append => handle.lock().try_acquire_write(owner),
        };
        acquired.then(|| Self { mode, handle })
    }

    pub(crate) fn mode(&self) -> AccessMode {
        self.mode
    }
}

impl Drop for AccessSlot {
    fn drop(&mut self) {
        match self.mode {
            AccessMode::Read => self.handle.lock().release_read(),
            AccessMode::Append => self.handle.lock().release_write(),
        }
        // `handle` drops after this, returning the registry reference
    }
}

/// The one file a session has open
///
/// Field order matters: the file closes before the access slot is freed.
#[derive(Debug)]
pub(crate) struct OpenFile {
    pub(crate) file: File,
    pub(crate) slot: AccessSlot,
    pub(crate) filename: String,
}

impl OpenFile {
    pub(crate) fn mode(&self) -> AccessMode {
        self.slot.mode()
    }
}
