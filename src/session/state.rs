//! Session state machine
//!
//! Maps protocol commands onto lock acquisition, file I/O and release.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

use bytes::Bytes;

use super::open_file::{AccessSlot, OpenFile};
use super::{OpenMode, Reply};
use crate::config::Config;
use crate::error::SessionError;
use crate::lock::{AccessMode, ConnectionId, LockRegistry};
use crate::protocol::Command;

/// Open-file state for one connection
///
/// Owned by exactly one connection handler. Dropping the session releases
/// whatever it holds.
#[derive(Debug)]
pub struct Session {
    /// Connection this session belongs to (write-lock owner id)
    id: ConnectionId,

    /// Registry shared with every other session
    registry: LockRegistry,

    /// Directory filenames are resolved against
    root_dir: PathBuf,

    /// Max bytes per read/append
    transfer_cap: usize,

    /// The open file, `None` when closed
    open: Option<OpenFile>,
}

impl Session {
    /// Create a closed session
    pub fn new(id: ConnectionId, registry: LockRegistry, config: &Config) -> Self {
        Self {
            id,
            registry,
            root_dir: config.root_dir.clone(),
            transfer_cap: config.transfer_cap,
            open: None,
        }
    }

    /// Execute a command
    ///
    /// Protocol misuse comes back as `Err` and leaves the session usable.
    pub fn execute(&mut self, command: Command) -> Result<Reply, SessionError> {
        match command {
            Command::OpenRead { filename } => self.open(filename, AccessMode::Read),
            Command::OpenAppend { filename } => self.open(filename, AccessMode::Append),
            Command::Read { count } => self.read(count),
            Command::Append { payload } => self.append(&payload),
            Command::Close => self.close(),
            Command::Quit => {
                self.release();
                Ok(Reply::Quit)
            }
        }
    }

    /// Open `filename` with `mode` access
    ///
    /// Steps:
    /// 1. Reject if a file is already open
    /// 2. Take a registry reference
    /// 3. Try to take the read or write slot (fail fast)
    /// 4. Open the file; on failure give everything back and stay closed
    fn open(&mut self, filename: String, mode: AccessMode) -> Result<Reply, SessionError> {
        if let Some(open) = &self.open {
            return Err(match (open.mode(), mode) {
                (AccessMode::Read, AccessMode::Read) => SessionError::AlreadyOpenForReading,
                (AccessMode::Append, AccessMode::Append) => SessionError::AlreadyOpenForAppending,
                _ => SessionError::AlreadyOpen,
            });
        }

        let handle = self.registry.acquire_or_create(&filename);
        let Some(slot) = AccessSlot::acquire(handle, mode, self.id) else {
            tracing::debug!("{} denied {:?} access to {}", self.id, mode, filename);
            return Err(SessionError::Contended);
        };

        let path = self.root_dir.join(&filename);
        let opened = match mode {
            AccessMode::Read => File::open(&path),
            AccessMode::Append => OpenOptions::new().append(true).create(true).open(&path),
        };

        // Filesystem failures are silent; dropping `slot` frees the lock
        let file = match opened {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!("{} could not open {}: {}", self.id, path.display(), e);
                return Ok(Reply::Silent);
            }
        };

        // Directories and other non-regular files open fine but cannot be read
        match file.metadata() {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                tracing::debug!("{} refused non-regular file {}", self.id, path.display());
                return Ok(Reply::Silent);
            }
            Err(e) => {
                tracing::debug!("{} could not stat {}: {}", self.id, path.display(), e);
                return Ok(Reply::Silent);
            }
        }

        tracing::debug!("{} opened {} for {:?}", self.id, filename, mode);
        self.open = Some(OpenFile {
            file,
            slot,
            filename,
        });
        Ok(Reply::Silent)
    }

    /// Read up to `min(count, transfer_cap)` bytes from the current position
    fn read(&mut self, count: i64) -> Result<Reply, SessionError> {
        let cap = i64::try_from(self.transfer_cap).unwrap_or(i64::MAX);
        let open = match &mut self.open {
            Some(open) if open.mode() == AccessMode::Read => open,
            _ => return Err(SessionError::NotOpen),
        };

        let want = count.clamp(0, cap) as u64;
        let mut buf = Vec::with_capacity(want as usize);
        if let Err(e) = (&mut open.file).take(want).read_to_end(&mut buf) {
            tracing::warn!("{} read of {} failed: {}", self.id, open.filename, e);
            return Err(SessionError::ReadFailed);
        }

        Ok(Reply::Data(Bytes::from(buf)))
    }

    /// Append up to `transfer_cap` bytes of `payload` and sync to disk
    fn append(&mut self, payload: &[u8]) -> Result<Reply, SessionError> {
        let open = match &mut self.open {
            Some(open) if open.mode() == AccessMode::Append => open,
            _ => return Err(SessionError::NotOpen),
        };

        let payload = &payload[..payload.len().min(self.transfer_cap)];
        if !payload.is_empty() {
            open.file.write_all(payload).map_err(|e| {
                tracing::warn!("{} append to {} failed: {}", self.id, open.filename, e);
                SessionError::WriteFailed
            })?;
        }
        open.file.sync_data().map_err(|e| {
            tracing::warn!("{} sync of {} failed: {}", self.id, open.filename, e);
            SessionError::WriteFailed
        })?;

        Ok(Reply::Silent)
    }

    fn close(&mut self) -> Result<Reply, SessionError> {
        if !self.release() {
            return Err(SessionError::NotOpen);
        }
        Ok(Reply::Silent)
    }

    /// Close the file and give back its lock access and registry reference
    ///
    /// Returns false if nothing was open.
    pub fn release(&mut self) -> bool {
        match self.open.take() {
            Some(open) => {
                tracing::debug!("{} closed {}", self.id, open.filename);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Current open mode
    pub fn mode(&self) -> OpenMode {
        match self.open.as_ref().map(OpenFile::mode) {
            None => OpenMode::Closed,
            Some(AccessMode::Read) => OpenMode::Read,
            Some(AccessMode::Append) => OpenMode::Append,
        }
    }

    /// Filename of the open file, if any
    pub fn filename(&self) -> Option<&str> {
        self.open.as_ref().map(|open| open.filename.as_str())
    }
}
