use std::{fmt, io};

use super::QueryError;

/// Crate-wide `Result` type using [`MongoqError`] as the error.
///
/// Used by the backend, connection and configuration layers. The dispatcher
/// converts these into [`QueryError`](super::QueryError) values at its
/// boundary.
pub type Result<T> = std::result::Result<T, MongoqError>;

/// Top-level error type for mongoq operations.
#[derive(Debug)]
pub enum MongoqError {
    /// Connection-related errors.
    Connection(ConnectionError),

    /// Command execution errors.
    Execution(ExecutionError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// MongoDB driver errors.
    MongoDb(mongodb::error::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Connection-specific errors.
#[derive(Debug)]
pub enum ConnectionError {
    /// Failed to establish a connection.
    ConnectionFailed(String),

    /// Invalid connection URI.
    InvalidUri(String),

    /// Not currently connected to MongoDB.
    NotConnected,

    /// Ping command failed.
    PingFailed(String),

    /// Named connection profile does not exist.
    UnknownProfile(String),
}

/// Execution-specific errors.
#[derive(Debug)]
pub enum ExecutionError {
    /// Query execution failed.
    QueryFailed(String),

    /// Invalid operation parameters.
    InvalidParameters(String),

    /// Cursor error.
    CursorError(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for MongoqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MongoqError::Connection(e) => write!(f, "Connection error: {e}"),
            MongoqError::Execution(e) => write!(f, "{e}"),
            MongoqError::Config(e) => write!(f, "Configuration error: {e}"),
            MongoqError::Io(e) => write!(f, "I/O error: {e}"),
            MongoqError::MongoDb(e) => write!(f, "{e}"),
            MongoqError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::InvalidUri(uri) => write!(f, "Invalid connection URI: {uri}"),
            ConnectionError::NotConnected => write!(f, "Not connected to MongoDB"),
            ConnectionError::PingFailed(msg) => write!(f, "Ping failed: {msg}"),
            ConnectionError::UnknownProfile(name) => {
                write!(f, "No connection profile named '{name}'")
            }
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::QueryFailed(msg) => write!(f, "{msg}"),
            ExecutionError::InvalidParameters(msg) => write!(f, "Invalid parameters: {msg}"),
            ExecutionError::CursorError(msg) => write!(f, "Cursor error: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for MongoqError {}
impl std::error::Error for ConnectionError {}
impl std::error::Error for ExecutionError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to MongoqError ========================= */

impl From<io::Error> for MongoqError {
    fn from(err: io::Error) -> Self {
        MongoqError::Io(err)
    }
}

impl From<mongodb::error::Error> for MongoqError {
    fn from(err: mongodb::error::Error) -> Self {
        MongoqError::MongoDb(err)
    }
}

impl From<ConnectionError> for MongoqError {
    fn from(err: ConnectionError) -> Self {
        MongoqError::Connection(err)
    }
}

impl From<ExecutionError> for MongoqError {
    fn from(err: ExecutionError) -> Self {
        MongoqError::Execution(err)
    }
}

impl From<ConfigError> for MongoqError {
    fn from(err: ConfigError) -> Self {
        MongoqError::Config(err)
    }
}

impl From<QueryError> for MongoqError {
    fn from(err: QueryError) -> Self {
        MongoqError::Execution(ExecutionError::QueryFailed(err.to_string()))
    }
}

impl From<String> for MongoqError {
    fn from(msg: String) -> Self {
        MongoqError::Generic(msg)
    }
}

impl From<&str> for MongoqError {
    fn from(msg: &str) -> Self {
        MongoqError::Generic(msg.to_owned())
    }
}
