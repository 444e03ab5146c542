//! Response definitions
//!
//! Represents responses to clients. Commands that succeed without data
//! produce no response at all.

use bytes::Bytes;

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `ERR <message>\n`
    Error(String),

    /// `DATA <len>\n` followed by exactly `len` raw bytes
    Data(Bytes),
}

impl Response {
    /// Create an ERR response
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(message.into())
    }

    /// Create a DATA response
    pub fn data(payload: impl Into<Bytes>) -> Self {
        Response::Data(payload.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}
