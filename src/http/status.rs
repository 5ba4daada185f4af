//! HTTP status codes used by this crate's handlers and default error paths.
use std::fmt::Display;

/// A status code with its canonical reason phrase. Only the subset the
/// core and its default handlers emit is enumerated; unlisted codes are
/// numeric round-trips via [`Status::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotModified,
    BadRequest,
    NotFound,
    InternalServerError,
    Other(u16),
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotModified => 304,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
            Self::Other(c) => *c,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotModified => "Not Modified",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::InternalServerError => "Internal Server Error",
            Self::Other(_) => "",
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            200 => Self::Ok,
            304 => Self::NotModified,
            400 => Self::BadRequest,
            404 => Self::NotFound,
            500 => Self::InternalServerError,
            other => Self::Other(other),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}
