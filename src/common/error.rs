//! Error handling for the strata storage engine

use std::fmt;

/// Common result type for strata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for strata storage operations
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// I/O operation failed
    Io(String),
    /// On-disk state that cannot be interpreted (bad magic, bad checksum)
    Corruption(String),
    /// Invalid input or arguments
    InvalidInput(String),
    /// Resource not found (table, column)
    NotFound(String),
    /// Resource already exists (table, column)
    AlreadyExists(String),
    /// Value type does not match the column type
    TypeMismatch(String),
    /// Serialized data would not fit in one page, or the page id space ran out
    PageOverflow(String),
    /// Internal engine error
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(msg) => write!(f, "I/O error: {msg}"),
            Error::Corruption(msg) => write!(f, "Corruption: {msg}"),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Error::NotFound(msg) => write!(f, "Not found: {msg}"),
            Error::AlreadyExists(msg) => write!(f, "Already exists: {msg}"),
            Error::TypeMismatch(msg) => write!(f, "Type mismatch: {msg}"),
            Error::PageOverflow(msg) => write!(f, "Page overflow: {msg}"),
            Error::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl Error {
    /// Create an I/O error
    pub fn io<S: Into<String>>(msg: S) -> Self {
        Error::Io(msg.into())
    }

    /// Create a corruption error
    pub fn corruption<S: Into<String>>(msg: S) -> Self {
        Error::Corruption(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an already exists error
    pub fn already_exists<S: Into<String>>(msg: S) -> Self {
        Error::AlreadyExists(msg.into())
    }

    /// Create a type mismatch error
    pub fn type_mismatch<S: Into<String>>(msg: S) -> Self {
        Error::TypeMismatch(msg.into())
    }

    /// Create a page overflow error
    pub fn page_overflow<S: Into<String>>(msg: S) -> Self {
        Error::PageOverflow(msg.into())
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Check if this is an I/O error
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Check if this is a corruption error
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a schema error (duplicate, missing, or mistyped)
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            Error::AlreadyExists(_) | Error::NotFound(_) | Error::TypeMismatch(_)
        )
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors leave prior engine state valid; the caller may
    /// retry or continue with other operations.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Io(_)
            | Error::InvalidInput(_)
            | Error::NotFound(_)
            | Error::AlreadyExists(_)
            | Error::TypeMismatch(_)
            | Error::PageOverflow(_) => true,
            Error::Corruption(_) | Error::Internal(_) => false,
        }
    }
}
