//! Session Tests
//!
//! These tests verify:
//! - Open/read/append/close transitions
//! - Error messages for protocol misuse
//! - Lock and registry bookkeeping on every path
//! - Transfer capping and end-of-file behavior
//! - Release when a session is dropped

use std::fs;

use bytes::Bytes;
use filegate::lock::{ConnectionId, LockRegistry};
use filegate::protocol::Command;
use filegate::session::{OpenMode, Reply, Session};
use filegate::{Config, SessionError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (TempDir, Config, LockRegistry) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .root_dir(temp_dir.path())
        .transfer_cap(8)
        .build();
    (temp_dir, config, LockRegistry::new())
}

fn session(id: u64, registry: &LockRegistry, config: &Config) -> Session {
    Session::new(ConnectionId(id), registry.clone(), config)
}

fn open_read(name: &str) -> Command {
    Command::OpenRead {
        filename: name.to_string(),
    }
}

fn open_append(name: &str) -> Command {
    Command::OpenAppend {
        filename: name.to_string(),
    }
}

fn append(payload: &[u8]) -> Command {
    Command::Append {
        payload: payload.to_vec(),
    }
}

fn data(bytes: &'static [u8]) -> Reply {
    Reply::Data(Bytes::from_static(bytes))
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_new_session_is_closed() {
    let (_temp, config, registry) = setup();
    let session = session(1, &registry, &config);

    assert_eq!(session.mode(), OpenMode::Closed);
    assert_eq!(session.filename(), None);
    assert_eq!(session.id(), ConnectionId(1));
}

#[test]
fn test_open_read_existing_file() {
    let (temp, config, registry) = setup();
    fs::write(temp.path().join("f.txt"), b"hello").unwrap();
    let mut session = session(1, &registry, &config);

    assert_eq!(session.execute(open_read("f.txt")), Ok(Reply::Silent));

    assert_eq!(session.mode(), OpenMode::Read);
    assert_eq!(session.filename(), Some("f.txt"));
    assert_eq!(registry.ref_count("f.txt"), Some(1));
    assert_eq!(registry.peek("f.txt").unwrap().readers(), 1);
}

#[test]
fn test_open_read_missing_file_is_silent_and_releases() {
    let (_temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);

    assert_eq!(session.execute(open_read("missing.txt")), Ok(Reply::Silent));

    assert_eq!(session.mode(), OpenMode::Closed);
    assert!(registry.is_empty());
}

#[test]
fn test_open_append_creates_file_and_takes_write_lock() {
    let (temp, config, registry) = setup();
    let mut session = session(4, &registry, &config);

    assert_eq!(session.execute(open_append("new.txt")), Ok(Reply::Silent));

    assert!(temp.path().join("new.txt").exists());
    assert_eq!(session.mode(), OpenMode::Append);
    assert_eq!(registry.peek("new.txt").unwrap().writer(), Some(ConnectionId(4)));
}

#[test]
fn test_open_append_in_missing_directory_releases() {
    let (_temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);

    assert_eq!(session.execute(open_append("no/such/dir.txt")), Ok(Reply::Silent));

    assert_eq!(session.mode(), OpenMode::Closed);
    assert!(registry.is_empty());
}

#[test]
fn test_open_directory_is_silent_and_releases() {
    let (temp, config, registry) = setup();
    fs::create_dir(temp.path().join("sub")).unwrap();
    let mut session = session(1, &registry, &config);

    assert_eq!(session.execute(open_read("sub")), Ok(Reply::Silent));
    assert_eq!(session.mode(), OpenMode::Closed);
    assert!(registry.is_empty());

    assert_eq!(session.execute(open_append("sub")), Ok(Reply::Silent));
    assert_eq!(session.mode(), OpenMode::Closed);
    assert!(registry.is_empty());

    assert_eq!(session.execute(Command::Read { count: 10 }), Err(SessionError::NotOpen));
}

#[test]
fn test_second_open_is_rejected() {
    let (temp, config, registry) = setup();
    fs::write(temp.path().join("a.txt"), b"a").unwrap();
    fs::write(temp.path().join("b.txt"), b"b").unwrap();
    let mut session = session(1, &registry, &config);
    session.execute(open_read("a.txt")).unwrap();

    assert_eq!(
        session.execute(open_read("b.txt")),
        Err(SessionError::AlreadyOpenForReading)
    );
    assert_eq!(
        session.execute(open_append("b.txt")),
        Err(SessionError::AlreadyOpen)
    );

    // First file stays open, nothing leaked for b.txt
    assert_eq!(session.filename(), Some("a.txt"));
    assert!(!registry.contains("b.txt"));
}

#[test]
fn test_second_open_while_appending_is_rejected() {
    let (_temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);
    session.execute(open_append("a.txt")).unwrap();

    assert_eq!(
        session.execute(open_append("b.txt")),
        Err(SessionError::AlreadyOpenForAppending)
    );
    assert_eq!(session.execute(open_read("b.txt")), Err(SessionError::AlreadyOpen));
    assert_eq!(session.mode(), OpenMode::Append);
}

// =============================================================================
// Contention Tests
// =============================================================================

#[test]
fn test_reader_denied_while_appending() {
    let (_temp, config, registry) = setup();
    let mut writer = session(1, &registry, &config);
    let mut reader = session(2, &registry, &config);
    writer.execute(open_append("f.txt")).unwrap();

    assert_eq!(reader.execute(open_read("f.txt")), Err(SessionError::Contended));

    assert_eq!(reader.mode(), OpenMode::Closed);
    assert_eq!(registry.ref_count("f.txt"), Some(1));
    let lock = registry.peek("f.txt").unwrap();
    assert_eq!(lock.readers(), 0);
    assert_eq!(lock.writer(), Some(ConnectionId(1)));
}

#[test]
fn test_many_readers_block_writer() {
    let (temp, config, registry) = setup();
    fs::write(temp.path().join("f.txt"), b"data").unwrap();
    let mut a = session(1, &registry, &config);
    let mut b = session(2, &registry, &config);
    let mut c = session(3, &registry, &config);

    assert_eq!(a.execute(open_read("f.txt")), Ok(Reply::Silent));
    assert_eq!(b.execute(open_read("f.txt")), Ok(Reply::Silent));
    assert_eq!(c.execute(open_append("f.txt")), Err(SessionError::Contended));

    assert_eq!(registry.peek("f.txt").unwrap().readers(), 2);
    assert_eq!(registry.ref_count("f.txt"), Some(2));
}

#[test]
fn test_second_writer_denied() {
    let (_temp, config, registry) = setup();
    let mut a = session(1, &registry, &config);
    let mut b = session(2, &registry, &config);
    a.execute(open_append("f.txt")).unwrap();

    assert_eq!(b.execute(open_append("f.txt")), Err(SessionError::Contended));
    assert_eq!(registry.peek("f.txt").unwrap().writer(), Some(ConnectionId(1)));
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_read_is_capped_and_drains() {
    let (temp, config, registry) = setup();
    fs::write(temp.path().join("f.txt"), b"0123456789abc").unwrap();
    let mut session = session(1, &registry, &config);
    session.execute(open_read("f.txt")).unwrap();

    assert_eq!(session.execute(Command::Read { count: 100 }), Ok(data(b"01234567")));
    assert_eq!(session.execute(Command::Read { count: 3 }), Ok(data(b"89a")));
    assert_eq!(session.execute(Command::Read { count: 100 }), Ok(data(b"bc")));
    assert_eq!(session.execute(Command::Read { count: 100 }), Ok(data(b"")));
}

#[test]
fn test_read_negative_is_zero() {
    let (temp, config, registry) = setup();
    fs::write(temp.path().join("f.txt"), b"hello").unwrap();
    let mut session = session(1, &registry, &config);
    session.execute(open_read("f.txt")).unwrap();

    assert_eq!(session.execute(Command::Read { count: -5 }), Ok(data(b"")));
    assert_eq!(session.execute(Command::Read { count: 5 }), Ok(data(b"hello")));
}

#[test]
fn test_read_requires_read_mode() {
    let (_temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);

    assert_eq!(
        session.execute(Command::Read { count: 10 }),
        Err(SessionError::NotOpen)
    );

    session.execute(open_append("f.txt")).unwrap();
    assert_eq!(
        session.execute(Command::Read { count: 10 }),
        Err(SessionError::NotOpen)
    );
}

// =============================================================================
// Append Tests
// =============================================================================

#[test]
fn test_append_writes_immediately() {
    let (temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);
    session.execute(open_append("f.txt")).unwrap();

    assert_eq!(session.execute(append(b"hello")), Ok(Reply::Silent));

    assert_eq!(fs::read(temp.path().join("f.txt")).unwrap(), b"hello");
}

#[test]
fn test_append_is_capped() {
    let (temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);
    session.execute(open_append("f.txt")).unwrap();

    session.execute(append(b"0123456789")).unwrap();

    assert_eq!(fs::read(temp.path().join("f.txt")).unwrap(), b"01234567");
}

#[test]
fn test_append_goes_to_end_of_existing_file() {
    let (temp, config, registry) = setup();
    fs::write(temp.path().join("f.txt"), b"old-").unwrap();
    let mut session = session(1, &registry, &config);
    session.execute(open_append("f.txt")).unwrap();

    session.execute(append(b"new")).unwrap();
    session.execute(append(b"")).unwrap();

    assert_eq!(fs::read(temp.path().join("f.txt")).unwrap(), b"old-new");
}

#[test]
fn test_append_requires_append_mode() {
    let (temp, config, registry) = setup();
    fs::write(temp.path().join("f.txt"), b"x").unwrap();
    let mut session = session(1, &registry, &config);

    assert_eq!(session.execute(append(b"hi")), Err(SessionError::NotOpen));

    session.execute(open_read("f.txt")).unwrap();
    assert_eq!(session.execute(append(b"hi")), Err(SessionError::NotOpen));
    assert_eq!(fs::read(temp.path().join("f.txt")).unwrap(), b"x");
}

// =============================================================================
// Close / Quit Tests
// =============================================================================

#[test]
fn test_close_releases_everything() {
    let (_temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);
    session.execute(open_append("f.txt")).unwrap();

    assert_eq!(session.execute(Command::Close), Ok(Reply::Silent));

    assert_eq!(session.mode(), OpenMode::Closed);
    assert!(registry.is_empty());
}

#[test]
fn test_close_when_closed_is_error() {
    let (_temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);

    assert_eq!(session.execute(Command::Close), Err(SessionError::NotOpen));
}

#[test]
fn test_close_lets_other_session_in() {
    let (_temp, config, registry) = setup();
    let mut writer = session(1, &registry, &config);
    let mut reader = session(2, &registry, &config);
    writer.execute(open_append("f.txt")).unwrap();
    writer.execute(append(b"hello")).unwrap();
    assert_eq!(reader.execute(open_read("f.txt")), Err(SessionError::Contended));

    writer.execute(Command::Close).unwrap();

    assert_eq!(reader.execute(open_read("f.txt")), Ok(Reply::Silent));
    assert_eq!(reader.execute(Command::Read { count: 200 }), Ok(data(b"hello")));
}

#[test]
fn test_reopen_after_close() {
    let (temp, config, registry) = setup();
    fs::write(temp.path().join("f.txt"), b"abc").unwrap();
    let mut session = session(1, &registry, &config);

    session.execute(open_read("f.txt")).unwrap();
    session.execute(Command::Close).unwrap();
    session.execute(open_append("f.txt")).unwrap();

    assert_eq!(session.mode(), OpenMode::Append);
    assert_eq!(registry.ref_count("f.txt"), Some(1));
}

#[test]
fn test_quit_releases_and_signals() {
    let (_temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);
    session.execute(open_append("f.txt")).unwrap();

    assert_eq!(session.execute(Command::Quit), Ok(Reply::Quit));

    assert_eq!(session.mode(), OpenMode::Closed);
    assert!(registry.is_empty());
}

#[test]
fn test_quit_when_closed() {
    let (_temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);

    assert_eq!(session.execute(Command::Quit), Ok(Reply::Quit));
}

#[test]
fn test_drop_releases_open_file() {
    let (temp, config, registry) = setup();
    fs::write(temp.path().join("f.txt"), b"abc").unwrap();

    {
        let mut a = session(1, &registry, &config);
        let mut b = session(2, &registry, &config);
        a.execute(open_read("f.txt")).unwrap();
        b.execute(open_read("f.txt")).unwrap();
        assert_eq!(registry.ref_count("f.txt"), Some(2));
    }

    assert!(registry.is_empty());
}

#[test]
fn test_release_is_idempotent() {
    let (_temp, config, registry) = setup();
    let mut session = session(1, &registry, &config);
    session.execute(open_append("f.txt")).unwrap();

    assert!(session.release());
    assert!(!session.release());
    assert!(registry.is_empty());
}
