//! Client Module
//!
//! Blocking client for the FileGate protocol.
//!
//! A [`Client`] can be used request-by-request, or split into a
//! [`ResponseReader`] and a [`CommandWriter`] so that responses are consumed
//! on a separate thread while commands are still being sent.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use crate::error::{FileGateError, Result};
use crate::protocol::{read_response, write_command, write_line, Command, Response};

/// Longest response header the client accepts
pub const MAX_RESPONSE_LINE: usize = 4096;

/// Receiving half of a connection
pub struct ResponseReader {
    reader: BufReader<TcpStream>,
    max_line_length: usize,
}

impl ResponseReader {
    /// Block until the next complete response arrives
    ///
    /// An orderly close by the server shows up as an `Io` error of kind
    /// `UnexpectedEof`.
    pub fn read_response(&mut self) -> Result<Response> {
        read_response(&mut self.reader, self.max_line_length)
    }
}

/// Sending half of a connection
pub struct CommandWriter {
    writer: BufWriter<TcpStream>,
}

impl CommandWriter {
    /// Send a raw command line as typed by a user
    pub fn send_line(&mut self, line: &[u8]) -> Result<()> {
        write_line(&mut self.writer, line)
    }

    /// Send a command
    pub fn send(&mut self, command: &Command) -> Result<()> {
        write_command(&mut self.writer, command)
    }

    /// Half-close: tell the server nothing more will be sent
    pub fn shutdown(&self) -> Result<()> {
        self.writer.get_ref().shutdown(Shutdown::Write)?;
        Ok(())
    }
}

/// A connection to a FileGate server
pub struct Client {
    reader: ResponseReader,
    writer: CommandWriter,
}

impl Client {
    /// Connect to the first address `addr` resolves to that accepts
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| FileGateError::Network(format!("Failed to connect: {}", e)))?;
        Self::from_stream(stream)
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: ResponseReader {
                reader: BufReader::new(read_stream),
                max_line_length: MAX_RESPONSE_LINE,
            },
            writer: CommandWriter {
                writer: BufWriter::new(stream),
            },
        })
    }

    pub fn send_line(&mut self, line: &[u8]) -> Result<()> {
        self.writer.send_line(line)
    }

    pub fn send(&mut self, command: &Command) -> Result<()> {
        self.writer.send(command)
    }

    pub fn read_response(&mut self) -> Result<Response> {
        self.reader.read_response()
    }

    /// Send `read <count>` and wait for its DATA or ERR reply
    pub fn read(&mut self, count: i64) -> Result<Response> {
        self.send(&Command::Read { count })?;
        self.read_response()
    }

    pub fn shutdown_write(&self) -> Result<()> {
        self.writer.shutdown()
    }

    /// Split into independently owned halves
    pub fn into_split(self) -> (ResponseReader, CommandWriter) {
        (self.reader, self.writer)
    }
}
