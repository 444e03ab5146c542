//! # FileGate
//!
//! A concurrent TCP file-access server with:
//! - Exclusive-append / shared-read access per filename
//! - Non-blocking lock acquisition (contention fails fast)
//! - Reference-counted lock registry, entries live only while referenced
//! - Line-oriented text protocol with bounded transfers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one thread per connection)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │              Connection → Protocol Codec                     │
//! │                (line in, ERR / DATA out)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Session State Machine                        │
//! │           (Closed / ReadOpen / AppendOpen)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │Lock Registry│─────────►│ File Access │
//!   │  (Mutex)    │          │ Lock (Mutex)│
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod lock;
pub mod protocol;
pub mod session;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FileGateError, Result, SessionError};
pub use config::Config;
pub use lock::LockRegistry;
pub use session::Session;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of FileGate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
