//! Command definitions
//!
//! Represents commands from clients.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    OpenRead,
    OpenAppend,
    Read,
    Append,
    Close,
    Quit,
}

impl CommandType {
    /// All command types, in wire-token order
    pub const ALL: [CommandType; 6] = [
        CommandType::OpenRead,
        CommandType::OpenAppend,
        CommandType::Read,
        CommandType::Append,
        CommandType::Close,
        CommandType::Quit,
    ];

    /// The case-sensitive token that names this command on the wire
    pub fn token(&self) -> &'static str {
        match self {
            CommandType::OpenRead => "openRead",
            CommandType::OpenAppend => "openAppend",
            CommandType::Read => "read",
            CommandType::Append => "append",
            CommandType::Close => "close",
            CommandType::Quit => "quit",
        }
    }

    /// Look up a command type by its exact token
    pub fn from_token(token: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.token().as_bytes() == token)
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a file for shared reading
    OpenRead { filename: String },

    /// Open a file for exclusive appending
    OpenAppend { filename: String },

    /// Read up to `count` bytes (negative counts are treated as zero)
    Read { count: i64 },

    /// Append raw bytes to the open file
    Append { payload: Vec<u8> },

    /// Close the open file
    Close,

    /// Close the open file and end the connection
    Quit,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::OpenRead { .. } => CommandType::OpenRead,
            Command::OpenAppend { .. } => CommandType::OpenAppend,
            Command::Read { .. } => CommandType::Read,
            Command::Append { .. } => CommandType::Append,
            Command::Close => CommandType::Close,
            Command::Quit => CommandType::Quit,
        }
    }
}
