//! Session Module
//!
//! Per-connection open-file state and the command state machine.
//!
//! ## States
//! ```text
//!            openRead ok               openAppend ok
//!   ReadOpen ◄──────────── Closed ─────────────► AppendOpen
//!      │                    ▲  ▲                    │
//!      └──── close/quit ────┘  └──── close/quit ────┘
//! ```
//!
//! A session holds at most one open file. The file handle, the read or
//! write slot on its lock, and the registry reference are owned together
//! and released together, on every exit path.

mod open_file;
mod state;

pub use state::Session;

use bytes::Bytes;

/// Which access, if any, a session currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Closed,
    Read,
    Append,
}

/// Successful outcome of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing is sent back
    Silent,

    /// Bytes read from the open file
    Data(Bytes),

    /// Session released; the connection should end
    Quit,
}
