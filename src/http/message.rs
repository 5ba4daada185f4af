//! Request and response value objects.
//!
//! Grounded on `http_request.h`/`http_response.h`'s field inventory:
//! method/version/uri plus the four header groups, parameters, form
//! fields, and cookies as `(name -> value)` associations preserving
//! first-occurrence order.

use crate::http::headers::{EntityHeader, GeneralHeader, RequestHeader, ResponseHeader};
use crate::http::method::Method;
use crate::http::status::Status;
use crate::http::version::Version;

/// An ordered `(name -> value)` association list preserving
/// first-occurrence semantics, used for both query parameters and
/// `application/x-www-form-urlencoded` fields.
#[derive(Debug, Clone, Default)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn name_at(&self, i: usize) -> Option<&str> {
        self.entries.get(i).map(|(n, _)| n.as_str())
    }

    pub fn value_at(&self, i: usize) -> Option<&str> {
        self.entries.get(i).map(|(_, v)| v.as_str())
    }

    /// First value associated with `name`, if any.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A parsed `Cookie` entry.
#[derive(Debug, Clone)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// An HTTP request: typed header groups, URI/query/form state, and an
/// optional in-memory body.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub version: Version,
    pub uri_path: String,
    pub general_header: GeneralHeader,
    pub entity_header: EntityHeader,
    pub request_header: RequestHeader,
    pub params: Params,
    pub form_fields: Params,
    pub cookies: Vec<Cookie>,
    pub content: Option<Vec<u8>>,
    pub content_len: u64,
    /// Header name/value pairs that don't map to a typed slot, retained
    /// verbatim in first-occurrence order so a full header round-trip is
    /// preserved even for headers this crate doesn't otherwise model.
    pub extra_headers: Vec<(String, String)>,
    /// Set by the parser to skip body consumption; the handler is then
    /// responsible for draining. Never observably read by this crate's own
    /// handlers -- the hook exists for callers that want it.
    pub deferred_read_flag: bool,
    persistent: bool,
}

impl Request {
    pub fn new() -> Self {
        Self {
            method: Method::Get,
            version: Version::Http11,
            uri_path: String::new(),
            general_header: GeneralHeader::new(),
            entity_header: EntityHeader::new(),
            request_header: RequestHeader::new(),
            params: Params::new(),
            form_fields: Params::new(),
            cookies: Vec::new(),
            content: None,
            content_len: 0,
            extra_headers: Vec::new(),
            deferred_read_flag: false,
            persistent: false,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    /// Resets to initial state while the caller retains any buffers it
    /// owns separately (the struct itself holds no fixed-size buffer).
    pub fn recycle(&mut self) {
        let fresh = Self::new();
        *self = fresh;
    }

    pub fn host(&self) -> Option<&str> {
        self.request_header.get_host()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.request_header.get_user_agent()
    }

    pub fn referer(&self) -> Option<&str> {
        self.request_header.get_referer()
    }

    pub fn if_modified_since(&self) -> Option<i64> {
        self.request_header.get_if_modified_since()
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

/// An HTTP response: status, typed header groups, cookies, and body.
#[derive(Debug, Clone)]
pub struct Response {
    pub version: Version,
    pub status: Status,
    pub general_header: GeneralHeader,
    pub entity_header: EntityHeader,
    pub response_header: ResponseHeader,
    pub body: Vec<u8>,
    /// Header name/value pairs that don't map to a typed slot, retained
    /// verbatim in first-occurrence order -- e.g. copied over from a
    /// request's own [`Request::extra_headers`] by a handler that wants to
    /// echo them.
    pub extra_headers: Vec<(String, String)>,
    persistent: bool,
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: Version::Http11,
            status: Status::Ok,
            general_header: GeneralHeader::new(),
            entity_header: EntityHeader::new(),
            response_header: ResponseHeader::new(),
            body: Vec::new(),
            extra_headers: Vec::new(),
            persistent: true,
        }
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    pub fn content_length(&self) -> u64 {
        self.body.len() as u64
    }

    /// Resets to initial state, retaining no body allocation guarantees
    /// beyond what `Vec::clear` gives (capacity is kept, contents dropped).
    pub fn recycle(&mut self) {
        self.status = Status::Ok;
        self.general_header = GeneralHeader::new();
        self.entity_header = EntityHeader::new();
        self.response_header = ResponseHeader::new();
        self.body.clear();
        self.extra_headers.clear();
        self.persistent = true;
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
