//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::error::{FileGateError, Result};
use crate::lock::{ConnectionId, LockRegistry};

use super::Connection;

/// TCP server for FileGate
///
/// ## Concurrency:
/// - One detached thread per accepted connection, no pool and no limit
/// - `registry`: the only state shared between connections
/// - `shutdown`: checked after every accept
pub struct Server {
    config: Arc<Config>,

    /// Locks shared by every connection this server accepts
    registry: LockRegistry,

    listener: TcpListener,

    local_addr: SocketAddr,

    shutdown: Arc<AtomicBool>,

    /// Next id handed to an accepted connection
    next_connection_id: AtomicU64,
}

impl Server {
    /// Bind a server with a fresh lock registry
    pub fn bind(config: Config) -> Result<Self> {
        Self::with_registry(config, LockRegistry::new())
    }

    /// Bind a server that shares `registry`
    ///
    /// Resolves `config.listen_addr` and binds the first address that works.
    pub fn with_registry(config: Config, registry: LockRegistry) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            FileGateError::Network(format!("Failed to bind {}: {}", config.listen_addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            config: Arc::new(config),
            registry,
            listener,
            local_addr,
            shutdown: Arc::new(AtomicBool::new(false)),
            next_connection_id: AtomicU64::new(1),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The registry shared by this server's connections
    pub fn registry(&self) -> &LockRegistry {
        &self.registry
    }

    /// Handle that can stop [`Server::run`] from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            addr: self.local_addr,
        }
    }

    /// Accept connections until shut down (blocking)
    ///
    /// Accept errors are logged and skipped; they never stop the server.
    /// Connections already running are left to finish on their own.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr);

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            match stream {
                Ok(stream) => self.spawn_connection(stream),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        tracing::info!("Server on {} stopped accepting", self.local_addr);
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream) {
        let id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let registry = self.registry.clone();
        let config = Arc::clone(&self.config);

        let spawned = thread::Builder::new()
            .name(format!("filegate-{}", id))
            .spawn(move || {
                let mut connection = match Connection::new(stream, id, registry, &config) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::warn!("Failed to set up {}: {}", id, e);
                        return;
                    }
                };
                if let Err(e) =
                    connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)
                {
                    tracing::warn!("Failed to configure {}: {}", id, e);
                    return;
                }
                if let Err(e) = connection.handle() {
                    tracing::warn!("{} ended with error: {}", id, e);
                }
            });

        // The closure (and with it the stream) is dropped on failure
        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn handler for {}: {}", id, e);
        }
    }
}

/// Stops a running [`Server`]
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting
    ///
    /// Wakes the blocked accept with a throwaway loopback connection.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);

        let mut wake_addr = self.addr;
        if wake_addr.ip().is_unspecified() {
            let loopback = match wake_addr.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            };
            wake_addr.set_ip(loopback);
        }
        if let Err(e) = TcpStream::connect(wake_addr) {
            tracing::debug!("Shutdown wake-up connect to {} failed: {}", wake_addr, e);
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
