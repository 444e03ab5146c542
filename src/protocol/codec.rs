//! Protocol codec
//!
//! Parsing and formatting for the line-oriented wire protocol, plus the
//! stream helpers both ends use.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! <token>[ <argument>]\n
//! ```
//!
//! ### Arguments by Command
//! - openRead:   filename (rest of line, leading blanks skipped)
//! - openAppend: filename (rest of line, leading blanks skipped)
//! - read:       byte count (first token, parsed like `strtol`)
//! - append:     payload (rest of line after one separator byte)
//! - close:      none
//! - quit:       none
//!
//! ### Response Format
//! ```text
//! ERR <message>\n
//! DATA <len>\n<len raw bytes>
//! ```

use std::io::{BufRead, ErrorKind, Read, Write};

use bytes::Bytes;

use super::{Command, CommandType, Response};
use crate::error::{FileGateError, Result};

/// Maximum DATA payload a client will accept (16 MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Result of reading one bounded line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A full line with its trailing `\n` removed
    Complete(Vec<u8>),

    /// The line exceeded the limit; it has been consumed and discarded
    TooLong,

    /// The stream ended before any byte of a new line
    Eof,
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

fn skip_blanks(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| !is_blank(b))
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Split off the first blank-delimited token; the remainder keeps its
/// leading separator
fn split_token(bytes: &[u8]) -> (&[u8], &[u8]) {
    let bytes = skip_blanks(bytes);
    let end = bytes.iter().position(|&b| is_blank(b)).unwrap_or(bytes.len());
    bytes.split_at(end)
}

/// Cut at the first CR or LF
fn until_line_end(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(bytes.len());
    &bytes[..end]
}

/// Parse a byte count the way `strtol` does
///
/// Optional sign, then leading decimal digits; trailing garbage is ignored
/// and no digits at all means zero. Values out of range saturate.
pub fn parse_count(token: &[u8]) -> i64 {
    let (negative, digits) = match token.first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };

    let mut value: i64 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        let digit = i64::from(b - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    value
}

/// Decode one command line
///
/// Returns `None` for empty, unrecognized or incomplete lines and for
/// filenames that are not valid UTF-8; the server ignores those without
/// replying.
pub fn decode_command(line: &[u8]) -> Option<Command> {
    let (token, rest) = split_token(line);
    let command_type = CommandType::from_token(token)?;

    match command_type {
        CommandType::OpenRead | CommandType::OpenAppend => {
            let filename = until_line_end(skip_blanks(rest));
            if filename.is_empty() {
                return None;
            }
            // Lossy decoding would alias distinct names onto one lock and path
            let filename = std::str::from_utf8(filename).ok()?.to_string();
            if command_type == CommandType::OpenRead {
                Some(Command::OpenRead { filename })
            } else {
                Some(Command::OpenAppend { filename })
            }
        }
        CommandType::Read => {
            let (count, _) = split_token(rest);
            if count.is_empty() {
                return None;
            }
            Some(Command::Read {
                count: parse_count(count),
            })
        }
        CommandType::Append => {
            // Exactly one separator byte belongs to the command token
            let payload = rest.get(1..).unwrap_or_default();
            Some(Command::Append {
                payload: until_line_end(payload).to_vec(),
            })
        }
        CommandType::Close => Some(Command::Close),
        CommandType::Quit => Some(Command::Quit),
    }
}

/// Encode a command as a wire line
pub fn encode_command(command: &Command) -> Vec<u8> {
    let token = command.command_type().token();

    let mut line = Vec::with_capacity(token.len() + 2);
    line.extend_from_slice(token.as_bytes());
    match command {
        Command::OpenRead { filename } | Command::OpenAppend { filename } => {
            line.push(b' ');
            line.extend_from_slice(filename.as_bytes());
        }
        Command::Read { count } => {
            line.push(b' ');
            line.extend_from_slice(count.to_string().as_bytes());
        }
        Command::Append { payload } => {
            line.push(b' ');
            line.extend_from_slice(payload);
        }
        Command::Close | Command::Quit => {}
    }
    line.push(b'\n');

    line
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Vec<u8> {
    match response {
        Response::Error(message) => format!("ERR {}\n", message).into_bytes(),
        Response::Data(payload) => {
            let header = format!("DATA {}\n", payload.len());
            let mut message = Vec::with_capacity(header.len() + payload.len());
            message.extend_from_slice(header.as_bytes());
            message.extend_from_slice(payload);
            message
        }
    }
}

/// Parse the length out of a `DATA <len>` header body
fn parse_data_len(body: &[u8]) -> Result<usize> {
    let text = std::str::from_utf8(body)
        .map_err(|_| FileGateError::Protocol("DATA header is not valid UTF-8".to_string()))?;
    let len: usize = text.trim().parse().map_err(|_| {
        FileGateError::Protocol(format!("Malformed DATA header: {:?}", text))
    })?;
    if len > MAX_PAYLOAD_SIZE {
        return Err(FileGateError::Protocol(format!(
            "DATA payload too large: {} bytes (max {})",
            len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(len)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one `\n`-terminated line of at most `max_len` bytes (delimiter
/// included)
///
/// An oversized line is consumed through its delimiter and reported as
/// [`Line::TooLong`] instead of being truncated. A last line without a
/// delimiter is returned as complete.
pub fn read_line<R: BufRead>(reader: &mut R, max_len: usize) -> Result<Line> {
    let mut line = Vec::new();
    let mut too_long = false;

    loop {
        let (used, found_newline) = {
            let available = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if available.is_empty() {
                return Ok(if too_long {
                    Line::TooLong
                } else if line.is_empty() {
                    Line::Eof
                } else {
                    Line::Complete(line)
                });
            }

            let (chunk, found_newline) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (&available[..=i], true),
                None => (available, false),
            };

            if !too_long {
                if line.len() + chunk.len() > max_len {
                    too_long = true;
                    line.clear();
                } else {
                    line.extend_from_slice(chunk);
                }
            }

            (chunk.len(), found_newline)
        };
        reader.consume(used);

        if found_newline {
            if too_long {
                return Ok(Line::TooLong);
            }
            line.pop();
            return Ok(Line::Complete(line));
        }
    }
}

/// Write a raw command line, adding the `\n` if missing
pub fn write_line<W: Write>(writer: &mut W, line: &[u8]) -> Result<()> {
    writer.write_all(line)?;
    if line.last() != Some(&b'\n') {
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
///
/// Blocks until the header and the whole DATA payload have arrived.
pub fn read_response<R: BufRead>(reader: &mut R, max_line: usize) -> Result<Response> {
    let header = match read_line(reader, max_line)? {
        Line::Complete(header) => header,
        Line::TooLong => return Err(FileGateError::LineTooLong { limit: max_line }),
        Line::Eof => {
            return Err(FileGateError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "connection closed by server",
            )))
        }
    };

    if let Some(message) = header.strip_prefix(b"ERR ") {
        let message = String::from_utf8_lossy(until_line_end(message)).into_owned();
        return Ok(Response::Error(message));
    }

    if let Some(body) = header.strip_prefix(b"DATA ") {
        let len = parse_data_len(body)?;
        let mut payload = vec![0u8; len];
        if len > 0 {
            reader.read_exact(&mut payload).map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => FileGateError::Network(format!(
                    "connection closed after {} byte DATA header",
                    len
                )),
                _ => FileGateError::Io(e),
            })?;
        }
        return Ok(Response::Data(Bytes::from(payload)));
    }

    Err(FileGateError::Protocol(format!(
        "Unexpected response line: {:?}",
        String::from_utf8_lossy(&header)
    )))
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
