//! Error types for the ClickHouse client.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an
//! alias for `std::result::Result<T, Error>`.

use crate::query::Exception;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when using the ClickHouse client.
#[derive(Error, Debug)]
pub enum Error {
    /// An I/O error occurred on the underlying TCP or TLS connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to establish a connection to the ClickHouse server.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error, such as an unexpected packet type or
    /// malformed data from the server.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An error during LZ4 or ZSTD compression/decompression.
    #[error("Compression error: {0}")]
    Compression(String),

    /// A type mismatch between expected and actual column types.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The type that was expected.
        expected: String,
        /// The type that was received.
        actual: String,
    },

    /// A validation error, such as mismatched row counts in a block.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A structured exception returned by the ClickHouse server. Carries the
    /// server's code, name, message and stack trace, plus any nested
    /// exception chain exactly as reported on the wire.
    #[error("Server error {}: {}", .0.code, .0.display_text)]
    Server(Exception),

    /// A feature or protocol version the client does not implement.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// An invalid argument was provided to a function.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A write exceeded the available buffer capacity.
    #[error("Buffer overflow")]
    BufferOverflow,

    /// Invalid UTF-8 was encountered when reading a string.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl Error {
    /// Build a `Connection` error describing a connect-phase timeout.
    pub fn connect_timeout(dur: Duration) -> Self {
        Error::Connection(format!("connect timed out after {:?}", dur))
    }

    /// Build an `Io` error describing a send/recv-phase timeout.
    pub fn io_timeout(dur: Duration) -> Self {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("operation timed out after {:?}", dur),
        ))
    }
}

/// A type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
