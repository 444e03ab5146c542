//! Configuration for FileGate
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{FileGateError, Result};

/// Main configuration for a FileGate server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory that client filenames are resolved against
    pub root_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Max bytes moved by a single `read` or `append`
    pub transfer_cap: usize,

    /// Max length of one command line, delimiter included
    pub max_line_length: usize,

    /// Print every received line to stdout
    pub echo_commands: bool,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            transfer_cap: 200,
            max_line_length: 4096,
            echo_commands: true,
            listen_addr: "0.0.0.0:0".to_string(),
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the limits can actually carry a command
    pub fn validate(&self) -> Result<()> {
        if self.transfer_cap == 0 {
            return Err(FileGateError::Config(
                "transfer_cap must be at least 1 byte".to_string(),
            ));
        }
        // Shortest useful line is "close\n"
        if self.max_line_length < 6 {
            return Err(FileGateError::Config(format!(
                "max_line_length {} is too small to hold a command",
                self.max_line_length
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the directory filenames are resolved against
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Set the per-command transfer cap (in bytes)
    pub fn transfer_cap(mut self, bytes: usize) -> Self {
        self.config.transfer_cap = bytes;
        self
    }

    /// Set the maximum command line length (in bytes)
    pub fn max_line_length(mut self, bytes: usize) -> Self {
        self.config.max_line_length = bytes;
        self
    }

    /// Enable or disable echoing received lines to stdout
    pub fn echo_commands(mut self, enabled: bool) -> Self {
        self.config.echo_commands = enabled;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
