//! Error types for FileGate
//!
//! Provides a unified error type for transport and configuration failures,
//! plus the recoverable session errors that are reported to clients.

use thiserror::Error;

/// Result type alias using FileGateError
pub type Result<T> = std::result::Result<T, FileGateError>;

/// Unified error type for FileGate operations
#[derive(Debug, Error)]
pub enum FileGateError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Line exceeds maximum length of {limit} bytes")]
    LineTooLong { limit: usize },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Recoverable errors produced by a session command
///
/// The `Display` text of each variant is exactly the message sent to the
/// client after `ERR `.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("A file is already open for reading")]
    AlreadyOpenForReading,

    #[error("A file is already open for appending")]
    AlreadyOpenForAppending,

    #[error("A file is already open")]
    AlreadyOpen,

    #[error("The file is open by another client.")]
    Contended,

    #[error("File not open")]
    NotOpen,

    #[error("Write failed")]
    WriteFailed,

    #[error("Read failed")]
    ReadFailed,
}
