//! Representation of an HTTP version.
use std::fmt::Display;

/// `HTTP/1.0` or `HTTP/1.1`; this crate speaks only those two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
        })
    }
}

impl Version {
    pub fn parse(major: u8, minor: u8) -> Result<Self, super::ParseError> {
        match (major, minor) {
            (1, 0) => Ok(Self::Http10),
            (1, 1) => Ok(Self::Http11),
            _ => Err(super::ParseError::Version),
        }
    }

    /// HTTP/1.1 defaults to persistent connections; HTTP/1.0 does not
    /// unless `Connection: keep-alive` is present.
    pub fn default_persistent(&self) -> bool {
        matches!(self, Self::Http11)
    }
}
