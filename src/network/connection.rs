//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::config::Config;
use crate::error::{FileGateError, Result};
use crate::lock::{ConnectionId, LockRegistry};
use crate::protocol::{decode_command, read_line, write_response, Line, Response};
use crate::session::{Reply, Session};

/// Message sent back for a line over `max_line_length`
const LINE_TOO_LONG: &str = "Line too long";

/// I/O errors that just mean the peer went away
fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            // Read timeout (Windows uses TimedOut instead of WouldBlock)
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
    )
}

/// Handles a single client connection
///
/// Owns the connection's session; whatever the session holds is released
/// when the handler returns or is dropped, on this thread.
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Open-file state for this client
    session: Session,

    /// Longest accepted command line
    max_line_length: usize,

    /// Print received lines and error messages to stdout
    echo_commands: bool,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and a fresh closed session
    pub fn new(
        stream: TcpStream,
        id: ConnectionId,
        registry: LockRegistry,
        config: &Config,
    ) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm so short replies are not delayed
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            session: Session::new(id, registry, config),
            max_line_length: config.max_line_length,
            echo_commands: config.echo_commands,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves the stream blocking)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads command lines in a loop and sends responses.
    /// Returns when the client quits or disconnects, or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!(
            "Connection {} established from {}",
            self.session.id(),
            self.peer_addr
        );

        let result = self.command_loop();

        if self.session.release() {
            tracing::debug!("Released open file held by {}", self.peer_addr);
        }
        result
    }

    fn command_loop(&mut self) -> Result<()> {
        loop {
            // Read next line
            let line = match read_line(&mut self.reader, self.max_line_length) {
                Ok(Line::Complete(line)) => line,
                Ok(Line::TooLong) => {
                    tracing::warn!(
                        "Rejected line over {} bytes from {}",
                        self.max_line_length,
                        self.peer_addr
                    );
                    if !self.send_response(Response::error(LINE_TOO_LONG))? {
                        return Ok(());
                    }
                    continue;
                }
                Ok(Line::Eof) => {
                    // Client disconnected gracefully
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(FileGateError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Connection to {} lost: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            if self.echo_commands {
                self.echo(&String::from_utf8_lossy(&line));
            }

            let Some(command) = decode_command(&line) else {
                tracing::trace!("Ignored line from {}", self.peer_addr);
                continue;
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            let response = match self.session.execute(command) {
                Ok(Reply::Silent) => continue,
                Ok(Reply::Data(payload)) => Response::Data(payload),
                Ok(Reply::Quit) => {
                    tracing::debug!("Client {} quit", self.peer_addr);
                    return Ok(());
                }
                Err(e) => Response::error(e.to_string()),
            };

            if !self.send_response(response)? {
                return Ok(());
            }
        }
    }

    /// Send a response to the client
    ///
    /// Returns false if the client disconnected before the response could
    /// be sent.
    fn send_response(&mut self, response: Response) -> Result<bool> {
        if let Response::Error(message) = &response {
            if self.echo_commands {
                self.echo(message);
            }
        }

        match write_response(&mut self.writer, &response) {
            Ok(()) => Ok(true),
            Err(FileGateError::Io(ref e)) if is_disconnect(e.kind()) => {
                tracing::debug!(
                    "Client {} disconnected before response could be sent: {}",
                    self.peer_addr,
                    e
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                Err(e)
            }
        }
    }

    /// Echo a line to stdout
    ///
    /// A closed or full stdout must not end the connection, so write
    /// errors are only logged.
    fn echo(&self, text: &str) {
        if let Err(e) = writeln!(io::stdout().lock(), "{}", text) {
            tracing::debug!("Echo for {} dropped: {}", self.peer_addr, e);
        }
    }
}
