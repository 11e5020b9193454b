//! Application layer errors

use thiserror::Error;

/// Errors from the messaging transport and startup plumbing
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Telegram API error ({code}): {description}")]
    Api { code: u16, description: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Faults raised by command handlers
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Command already registered: {0}")]
    Duplicate(String),

    #[error("Command not implemented: {0}")]
    Unimplemented(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Lock poisoned")]
    Poisoned,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Status categories an RPC caller can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorKind {
    InvalidArgument,
    NotFound,
    DeadlineExceeded,
    Canceled,
    Internal,
    Aborted,
}

impl RpcErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcErrorKind::InvalidArgument => "invalid_argument",
            RpcErrorKind::NotFound => "not_found",
            RpcErrorKind::DeadlineExceeded => "deadline_exceeded",
            RpcErrorKind::Canceled => "canceled",
            RpcErrorKind::Internal => "internal",
            RpcErrorKind::Aborted => "aborted",
        }
    }
}

/// Error returned by the RPC facade. `message` is always safe to show the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {message}", .kind.as_str())]
pub struct RpcError {
    pub kind: RpcErrorKind,
    pub message: String,
}

impl RpcError {
    pub fn new(kind: RpcErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::NotFound, message)
    }

    pub fn deadline_exceeded() -> Self {
        Self::new(RpcErrorKind::DeadlineExceeded, "RPC timeout")
    }

    pub fn canceled() -> Self {
        Self::new(RpcErrorKind::Canceled, "RPC canceled by server")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::Internal, message)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::Aborted, message)
    }
}
