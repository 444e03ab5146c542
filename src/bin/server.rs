//! FileGate Server Binary
//!
//! Starts the TCP file-access server.

use std::io::{self, Write};

use clap::Parser;
use filegate::network::Server;
use filegate::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// FileGate Server
#[derive(Parser, Debug)]
#[command(name = "filegate-server")]
#[command(about = "Concurrent file-access server with per-file reader/writer locking")]
#[command(version)]
struct Args {
    /// Port to listen on
    port: u16,

    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Directory client filenames are resolved against
    #[arg(short, long, default_value = ".")]
    root_dir: String,

    /// Max bytes moved by one read/append command
    #[arg(short, long, default_value = "200")]
    transfer_cap: usize,

    /// Max command line length in bytes
    #[arg(short, long, default_value = "4096")]
    max_line_length: usize,

    /// Do not echo received lines to stdout
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    // Diagnostics go to stderr; stdout carries the command echo
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,filegate=debug"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("FileGate Server v{}", filegate::VERSION);
    tracing::info!("Root directory: {}", args.root_dir);

    // Build config from args
    let config = Config::builder()
        .listen_addr(format!("{}:{}", args.host, args.port))
        .root_dir(&args.root_dir)
        .transfer_cap(args.transfer_cap)
        .max_line_length(args.max_line_length)
        .echo_commands(!args.quiet)
        .build();

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = writeln!(io::stdout().lock(), "server started") {
        tracing::debug!("Could not announce startup on stdout: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
