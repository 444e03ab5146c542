//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (line-oriented text)
//!
//! ### Commands
//! - `openRead <filename>`   - open for shared reading
//! - `openAppend <filename>` - open for exclusive appending
//! - `read <count>`          - read up to `count` bytes (capped)
//! - `append <payload>`      - append the rest of the line (capped)
//! - `close`                 - close the open file
//! - `quit`                  - close and disconnect
//!
//! Tokens are case-sensitive. Empty or unknown lines are ignored.
//!
//! ### Responses
//! - `ERR <message>\n`
//! - `DATA <len>\n` followed by `len` raw bytes
//!
//! Successful commands other than `read` send nothing back.

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::Response;
pub use codec::{
    decode_command, encode_command, encode_response, parse_count, read_line, read_response,
    write_command, write_line, write_response, Line, MAX_PAYLOAD_SIZE,
};
