//! Shared error-kind taxonomy surfaced across the serving core.
//!
//! Every fallible path in this crate -- socket I/O, connection buffering,
//! pool enqueue, HTTP parsing, supervisor startup -- ultimately produces one
//! of these kinds. Component-local error types (e.g. [`crate::http::ParseError`])
//! convert into [`Error`] at the boundary where they cross into generic code
//! such as the TCP server's service-function dispatch.

use std::fmt;
use std::io;

/// Classification of a failure, independent of which component raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Poll expired or the socket reported would-block; the caller may retry.
    Again,
    /// Zero-byte read after a readable poll, or a TLS `close_notify`.
    PeerClosed,
    /// Any other read/write/close failure.
    Io,
    /// Malformed request/response, bad encoding, or a framing error.
    Protocol,
    /// Allocation failure, full queue with no-block configured, full registry.
    Resource,
    /// Enqueue after shutdown, double-close, unlock-without-lock.
    InvalidState,
    /// Missing cert/key, invalid host/port, inconsistent timeouts.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Again => "again",
            ErrorKind::PeerClosed => "peer closed",
            ErrorKind::Io => "io",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Resource => "resource",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::Configuration => "configuration",
        };
        f.write_str(s)
    }
}

/// A crate-wide error carrying a [`ErrorKind`] plus context.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn again(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Again, message)
    }

    pub fn peer_closed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PeerClosed, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        let kind = match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ErrorKind::Again,
            io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset => ErrorKind::PeerClosed,
            _ => ErrorKind::Io,
        };
        Error::with_source(kind, "io error", e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
