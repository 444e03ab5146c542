//! FileGate CLI Client
//!
//! Interactive client: forwards typed commands and prints every response.

use std::io::{self, BufRead, ErrorKind, Write};
use std::thread;

use clap::Parser;
use filegate::client::{Client, ResponseReader};
use filegate::protocol::Response;
use filegate::FileGateError;
use tracing_subscriber::{fmt, EnvFilter};

/// FileGate CLI
#[derive(Parser, Debug)]
#[command(name = "filegate-cli")]
#[command(about = "Interactive client for a FileGate server")]
struct Args {
    /// Server host
    host: String,

    /// Server port
    port: u16,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();

    let client = match Client::connect((args.host.as_str(), args.port)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("connect: {}", e);
            std::process::exit(1);
        }
    };
    let (responses, mut commands) = client.into_split();

    // Every response is printed as it arrives, whichever command caused it
    let printer = thread::spawn(move || print_responses(responses));

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        prompt();
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("stdin: {}", e);
                break;
            }
        }

        if let Err(e) = commands.send_line(line.as_bytes()) {
            eprintln!("send: {}", e);
            std::process::exit(1);
        }

        if line.starts_with("quit") {
            break;
        }
    }

    // Let the server finish answering, then wait for it to hang up
    if let Err(e) = commands.shutdown() {
        tracing::debug!("shutdown: {}", e);
    }
    match printer.join() {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(_) => std::process::exit(1),
    }
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

/// Print responses until the server closes; returns the exit code
fn print_responses(mut responses: ResponseReader) -> i32 {
    loop {
        match responses.read_response() {
            Ok(Response::Error(message)) => println!("ERR {}", message),
            Ok(Response::Data(payload)) => {
                let mut stdout = io::stdout().lock();
                let _ = stdout.write_all(&payload);
                if !payload.is_empty() && payload.last() != Some(&b'\n') {
                    let _ = stdout.write_all(b"\n");
                }
                let _ = stdout.flush();
            }
            Err(FileGateError::Io(ref e)) if e.kind() == ErrorKind::UnexpectedEof => return 0,
            Err(FileGateError::Protocol(message)) => {
                eprintln!("protocol error: {}", message);
                return 1;
            }
            Err(e) => {
                eprintln!("\nconnection lost: {}", e);
                return 1;
            }
        }
    }
}
