//! Error handling for grblctl
//!
//! Provides error types for every layer of the controller:
//! - Connection errors (opening and waking up the serial link)
//! - Transport errors (reads and writes failing mid-session)
//! - Macro errors (template parsing and parameter resolution)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! A declined confirmation prompt is not an error and has no variant here.

use thiserror::Error;

/// Connection error type
///
/// Raised while opening or configuring the transport channel. These are
/// fatal at startup: the process reports them and exits without retrying.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Baud rate not supported
    #[error("Baud rate {baud} not supported")]
    UnsupportedBaudRate {
        /// The unsupported baud rate.
        baud: u32,
    },

    /// The wake-up sequence could not be completed
    #[error("Handshake failed: {reason}")]
    HandshakeFailed {
        /// The reason the handshake failed.
        reason: String,
    },
}

/// Transport error type
///
/// A read or write failed after the connection was established. Fatal to
/// the command or streaming job in progress, but not to the session.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// Writing to the channel failed
    #[error("Write failed: {reason}")]
    WriteFailed {
        /// The reason the write failed.
        reason: String,
    },

    /// Reading from the channel failed
    #[error("Read failed: {reason}")]
    ReadFailed {
        /// The reason the read failed.
        reason: String,
    },

    /// The channel has been closed
    #[error("Transport channel closed")]
    Closed,

    /// No data arrived within the allowed time
    #[error("Transport timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },
}

impl TransportError {
    /// Wrap an I/O error raised while writing
    pub fn write(err: impl std::fmt::Display) -> Self {
        Self::WriteFailed {
            reason: err.to_string(),
        }
    }

    /// Wrap an I/O error raised while reading
    pub fn read(err: impl std::fmt::Display) -> Self {
        Self::ReadFailed {
            reason: err.to_string(),
        }
    }
}

/// Macro error type
///
/// Represents errors in macro templates and their parameter resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacroError {
    /// A placeholder has neither a supplied value nor a default
    #[error("Macro '{macro_name}' has no value for parameter '{param}'")]
    MissingParameter {
        /// The macro being expanded.
        macro_name: String,
        /// The parameter without a value.
        param: String,
    },

    /// A `{` was opened but never closed
    #[error("Unterminated placeholder in template line: {line}")]
    UnterminatedPlaceholder {
        /// The offending template line.
        line: String,
    },

    /// A placeholder with no name or an invalid name
    #[error("Invalid placeholder in template line: {line}")]
    EmptyPlaceholder {
        /// The offending template line.
        line: String,
    },

    /// No macro is registered under this name
    #[error("Unknown macro: {name}")]
    UnknownMacro {
        /// The requested macro name.
        name: String,
    },
}

/// Main error type for grblctl
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Macro error
    #[error(transparent)]
    Macro(#[from] MacroError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a transport error
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this is a macro error
    pub fn is_macro_error(&self) -> bool {
        matches!(self, Error::Macro(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "cable pulled");
        let err: Error = TransportError::write(io).into();
        assert!(err.is_transport_error());
        assert_eq!(err.to_string(), "Write failed: cable pulled");
    }

    #[test]
    fn test_connection_error_display() {
        let err: Error = ConnectionError::FailedToOpen {
            port: "/dev/ttyUSB0".to_string(),
            reason: "permission denied".to_string(),
        }
        .into();
        assert!(err.is_connection_error());
        assert!(!err.is_transport_error());
        assert_eq!(
            err.to_string(),
            "Failed to open port /dev/ttyUSB0: permission denied"
        );
    }
}
