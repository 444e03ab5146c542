//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One thread per connection, each owning its session
//! - Sessions share only the lock registry

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
