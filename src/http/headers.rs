//! Typed header slots for general, entity, request, and response headers.
//!
//! Grounded on `general_header.h`/`entity_header.h`'s field inventory and
//! `get_*`/`set_*`/`_isset` accessor triple per slot. Each slot here is a
//! plain `Option<T>`; `is_set` is simply `Option::is_some`, and emission
//! walks the slots in declaration order, skipping unset ones -- the same
//! "set the bit, skip when emitting if unset" contract, expressed without a
//! parallel bitset since `Option` already carries that bit.

/// RFC 2616 §4.5 header subset applicable to both requests and responses.
#[derive(Debug, Clone, Default)]
pub struct GeneralHeader {
    cache_control: Option<String>,
    connection: Option<String>,
    date: Option<i64>,
    pragma: Option<String>,
    trailer: Option<String>,
    transfer_encoding: Option<String>,
    upgrade: Option<String>,
    via: Option<String>,
    warning: Option<String>,
}

impl GeneralHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_cache_control(&self) -> Option<&str> {
        self.cache_control.as_deref()
    }
    pub fn set_cache_control(&mut self, v: impl Into<String>) {
        self.cache_control = Some(v.into());
    }
    pub fn is_set_cache_control(&self) -> bool {
        self.cache_control.is_some()
    }

    pub fn get_connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }
    pub fn set_connection(&mut self, v: impl Into<String>) {
        self.connection = Some(v.into());
    }
    pub fn is_set_connection(&self) -> bool {
        self.connection.is_some()
    }

    pub fn get_date(&self) -> Option<i64> {
        self.date
    }
    pub fn set_date(&mut self, epoch_secs: i64) {
        self.date = Some(epoch_secs);
    }
    pub fn is_set_date(&self) -> bool {
        self.date.is_some()
    }

    pub fn get_pragma(&self) -> Option<&str> {
        self.pragma.as_deref()
    }
    pub fn set_pragma(&mut self, v: impl Into<String>) {
        self.pragma = Some(v.into());
    }
    pub fn is_set_pragma(&self) -> bool {
        self.pragma.is_some()
    }

    pub fn get_trailer(&self) -> Option<&str> {
        self.trailer.as_deref()
    }
    pub fn set_trailer(&mut self, v: impl Into<String>) {
        self.trailer = Some(v.into());
    }
    pub fn is_set_trailer(&self) -> bool {
        self.trailer.is_some()
    }

    pub fn get_transfer_encoding(&self) -> Option<&str> {
        self.transfer_encoding.as_deref()
    }
    pub fn set_transfer_encoding(&mut self, v: impl Into<String>) {
        self.transfer_encoding = Some(v.into());
    }
    pub fn is_set_transfer_encoding(&self) -> bool {
        self.transfer_encoding.is_some()
    }
    pub fn is_chunked(&self) -> bool {
        self.transfer_encoding
            .as_deref()
            .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    }

    pub fn get_upgrade(&self) -> Option<&str> {
        self.upgrade.as_deref()
    }
    pub fn set_upgrade(&mut self, v: impl Into<String>) {
        self.upgrade = Some(v.into());
    }
    pub fn is_set_upgrade(&self) -> bool {
        self.upgrade.is_some()
    }

    pub fn get_via(&self) -> Option<&str> {
        self.via.as_deref()
    }
    pub fn set_via(&mut self, v: impl Into<String>) {
        self.via = Some(v.into());
    }
    pub fn is_set_via(&self) -> bool {
        self.via.is_some()
    }

    pub fn get_warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }
    pub fn set_warning(&mut self, v: impl Into<String>) {
        self.warning = Some(v.into());
    }
    pub fn is_set_warning(&self) -> bool {
        self.warning.is_some()
    }

    /// Walks only the set slots in emission order, yielding `(name, value)`.
    pub fn set_fields(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(v) = &self.cache_control {
            out.push(("Cache-Control", v.clone()));
        }
        if let Some(v) = &self.connection {
            out.push(("Connection", v.clone()));
        }
        if let Some(v) = self.date {
            out.push(("Date", httpdate::fmt_http_date(
                std::time::UNIX_EPOCH + std::time::Duration::from_secs(v.max(0) as u64),
            )));
        }
        if let Some(v) = &self.pragma {
            out.push(("Pragma", v.clone()));
        }
        if let Some(v) = &self.trailer {
            out.push(("Trailer", v.clone()));
        }
        if let Some(v) = &self.transfer_encoding {
            out.push(("Transfer-Encoding", v.clone()));
        }
        if let Some(v) = &self.upgrade {
            out.push(("Upgrade", v.clone()));
        }
        if let Some(v) = &self.via {
            out.push(("Via", v.clone()));
        }
        if let Some(v) = &self.warning {
            out.push(("Warning", v.clone()));
        }
        out
    }
}

/// RFC 2616 §7.1 header subset describing the message body.
#[derive(Debug, Clone, Default)]
pub struct EntityHeader {
    allow: Option<String>,
    content_encoding: Option<String>,
    content_language: Option<String>,
    content_length: Option<u64>,
    content_location: Option<String>,
    content_md5: Option<String>,
    content_range: Option<String>,
    content_type: Option<String>,
    expires: Option<i64>,
    last_modified: Option<i64>,
    etag: Option<String>,
}

impl EntityHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_allow(&self) -> Option<&str> {
        self.allow.as_deref()
    }
    pub fn set_allow(&mut self, v: impl Into<String>) {
        self.allow = Some(v.into());
    }
    pub fn is_set_allow(&self) -> bool {
        self.allow.is_some()
    }

    pub fn get_content_encoding(&self) -> Option<&str> {
        self.content_encoding.as_deref()
    }
    pub fn set_content_encoding(&mut self, v: impl Into<String>) {
        self.content_encoding = Some(v.into());
    }
    pub fn is_set_content_encoding(&self) -> bool {
        self.content_encoding.is_some()
    }

    pub fn get_content_language(&self) -> Option<&str> {
        self.content_language.as_deref()
    }
    pub fn set_content_language(&mut self, v: impl Into<String>) {
        self.content_language = Some(v.into());
    }
    pub fn is_set_content_language(&self) -> bool {
        self.content_language.is_some()
    }

    pub fn get_content_length(&self) -> Option<u64> {
        self.content_length
    }
    pub fn set_content_length(&mut self, v: u64) {
        self.content_length = Some(v);
    }
    pub fn is_set_content_length(&self) -> bool {
        self.content_length.is_some()
    }

    pub fn get_content_location(&self) -> Option<&str> {
        self.content_location.as_deref()
    }
    pub fn set_content_location(&mut self, v: impl Into<String>) {
        self.content_location = Some(v.into());
    }
    pub fn is_set_content_location(&self) -> bool {
        self.content_location.is_some()
    }

    pub fn get_content_md5(&self) -> Option<&str> {
        self.content_md5.as_deref()
    }
    pub fn set_content_md5(&mut self, v: impl Into<String>) {
        self.content_md5 = Some(v.into());
    }
    pub fn is_set_content_md5(&self) -> bool {
        self.content_md5.is_some()
    }

    pub fn get_content_range(&self) -> Option<&str> {
        self.content_range.as_deref()
    }
    pub fn set_content_range(&mut self, v: impl Into<String>) {
        self.content_range = Some(v.into());
    }
    pub fn is_set_content_range(&self) -> bool {
        self.content_range.is_some()
    }

    pub fn get_content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
    pub fn set_content_type(&mut self, v: impl Into<String>) {
        self.content_type = Some(v.into());
    }
    pub fn is_set_content_type(&self) -> bool {
        self.content_type.is_some()
    }

    pub fn get_expires(&self) -> Option<i64> {
        self.expires
    }
    pub fn set_expires(&mut self, epoch_secs: i64) {
        self.expires = Some(epoch_secs);
    }
    pub fn is_set_expires(&self) -> bool {
        self.expires.is_some()
    }

    pub fn get_last_modified(&self) -> Option<i64> {
        self.last_modified
    }
    pub fn set_last_modified(&mut self, epoch_secs: i64) {
        self.last_modified = Some(epoch_secs);
    }
    pub fn is_set_last_modified(&self) -> bool {
        self.last_modified.is_some()
    }

    pub fn get_etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }
    pub fn set_etag(&mut self, v: impl Into<String>) {
        self.etag = Some(v.into());
    }
    pub fn is_set_etag(&self) -> bool {
        self.etag.is_some()
    }

    /// Walks only the set slots in emission order, yielding `(name, value)`.
    /// `Content-Length` is emitted separately by the emitter since its
    /// value is derived from the body rather than stored directly here in
    /// every case.
    pub fn set_fields(&self) -> Vec<(&'static str, String)> {
        fn fmt_date(v: i64) -> String {
            httpdate::fmt_http_date(std::time::UNIX_EPOCH + std::time::Duration::from_secs(v.max(0) as u64))
        }

        let mut out = Vec::new();
        if let Some(v) = &self.allow {
            out.push(("Allow", v.clone()));
        }
        if let Some(v) = &self.content_encoding {
            out.push(("Content-Encoding", v.clone()));
        }
        if let Some(v) = &self.content_language {
            out.push(("Content-Language", v.clone()));
        }
        if let Some(v) = &self.content_location {
            out.push(("Content-Location", v.clone()));
        }
        if let Some(v) = &self.content_md5 {
            out.push(("Content-MD5", v.clone()));
        }
        if let Some(v) = &self.content_range {
            out.push(("Content-Range", v.clone()));
        }
        if let Some(v) = &self.content_type {
            out.push(("Content-Type", v.clone()));
        }
        if let Some(v) = self.expires {
            out.push(("Expires", fmt_date(v)));
        }
        if let Some(v) = self.last_modified {
            out.push(("Last-Modified", fmt_date(v)));
        }
        if let Some(v) = &self.etag {
            out.push(("ETag", v.clone()));
        }
        out
    }
}

/// Request-specific header slots.
#[derive(Debug, Clone, Default)]
pub struct RequestHeader {
    host: Option<String>,
    user_agent: Option<String>,
    referer: Option<String>,
    if_modified_since: Option<i64>,
    accept: Option<String>,
    accept_encoding: Option<String>,
    accept_language: Option<String>,
    authorization: Option<String>,
    cookie: Option<String>,
}

impl RequestHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_host(&self) -> Option<&str> {
        self.host.as_deref()
    }
    pub fn set_host(&mut self, v: impl Into<String>) {
        self.host = Some(v.into());
    }
    pub fn is_set_host(&self) -> bool {
        self.host.is_some()
    }

    pub fn get_user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
    pub fn set_user_agent(&mut self, v: impl Into<String>) {
        self.user_agent = Some(v.into());
    }
    pub fn is_set_user_agent(&self) -> bool {
        self.user_agent.is_some()
    }

    pub fn get_referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }
    pub fn set_referer(&mut self, v: impl Into<String>) {
        self.referer = Some(v.into());
    }
    pub fn is_set_referer(&self) -> bool {
        self.referer.is_some()
    }

    pub fn get_if_modified_since(&self) -> Option<i64> {
        self.if_modified_since
    }
    pub fn set_if_modified_since(&mut self, epoch_secs: i64) {
        self.if_modified_since = Some(epoch_secs);
    }
    pub fn is_set_if_modified_since(&self) -> bool {
        self.if_modified_since.is_some()
    }

    pub fn get_accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }
    pub fn set_accept(&mut self, v: impl Into<String>) {
        self.accept = Some(v.into());
    }
    pub fn is_set_accept(&self) -> bool {
        self.accept.is_some()
    }

    pub fn get_accept_encoding(&self) -> Option<&str> {
        self.accept_encoding.as_deref()
    }
    pub fn set_accept_encoding(&mut self, v: impl Into<String>) {
        self.accept_encoding = Some(v.into());
    }
    pub fn is_set_accept_encoding(&self) -> bool {
        self.accept_encoding.is_some()
    }

    pub fn get_accept_language(&self) -> Option<&str> {
        self.accept_language.as_deref()
    }
    pub fn set_accept_language(&mut self, v: impl Into<String>) {
        self.accept_language = Some(v.into());
    }
    pub fn is_set_accept_language(&self) -> bool {
        self.accept_language.is_some()
    }

    pub fn get_authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
    pub fn set_authorization(&mut self, v: impl Into<String>) {
        self.authorization = Some(v.into());
    }
    pub fn is_set_authorization(&self) -> bool {
        self.authorization.is_some()
    }

    pub fn get_cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }
    pub fn set_cookie(&mut self, v: impl Into<String>) {
        self.cookie = Some(v.into());
    }
    pub fn is_set_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    pub fn set_fields(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(v) = &self.host {
            out.push(("Host", v.clone()));
        }
        if let Some(v) = &self.user_agent {
            out.push(("User-Agent", v.clone()));
        }
        if let Some(v) = &self.referer {
            out.push(("Referer", v.clone()));
        }
        if let Some(v) = self.if_modified_since {
            out.push((
                "If-Modified-Since",
                httpdate::fmt_http_date(std::time::UNIX_EPOCH + std::time::Duration::from_secs(v.max(0) as u64)),
            ));
        }
        if let Some(v) = &self.accept {
            out.push(("Accept", v.clone()));
        }
        if let Some(v) = &self.accept_encoding {
            out.push(("Accept-Encoding", v.clone()));
        }
        if let Some(v) = &self.accept_language {
            out.push(("Accept-Language", v.clone()));
        }
        if let Some(v) = &self.authorization {
            out.push(("Authorization", v.clone()));
        }
        if let Some(v) = &self.cookie {
            out.push(("Cookie", v.clone()));
        }
        out
    }
}

/// Response-specific header slots.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeader {
    location: Option<String>,
    server: Option<String>,
    www_authenticate: Option<String>,
    set_cookies: Vec<String>,
}

impl ResponseHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_location(&self) -> Option<&str> {
        self.location.as_deref()
    }
    pub fn set_location(&mut self, v: impl Into<String>) {
        self.location = Some(v.into());
    }
    pub fn is_set_location(&self) -> bool {
        self.location.is_some()
    }

    pub fn get_server(&self) -> Option<&str> {
        self.server.as_deref()
    }
    pub fn set_server(&mut self, v: impl Into<String>) {
        self.server = Some(v.into());
    }
    pub fn is_set_server(&self) -> bool {
        self.server.is_some()
    }

    pub fn get_www_authenticate(&self) -> Option<&str> {
        self.www_authenticate.as_deref()
    }
    pub fn set_www_authenticate(&mut self, v: impl Into<String>) {
        self.www_authenticate = Some(v.into());
    }
    pub fn is_set_www_authenticate(&self) -> bool {
        self.www_authenticate.is_some()
    }

    /// Attaches a `Set-Cookie` header; responses may carry more than one.
    pub fn add_set_cookie(&mut self, cookie: impl Into<String>) {
        self.set_cookies.push(cookie.into());
    }

    pub fn set_fields(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(v) = &self.location {
            out.push(("Location", v.clone()));
        }
        if let Some(v) = &self.server {
            out.push(("Server", v.clone()));
        }
        if let Some(v) = &self.www_authenticate {
            out.push(("WWW-Authenticate", v.clone()));
        }
        for cookie in &self.set_cookies {
            out.push(("Set-Cookie", cookie.clone()));
        }
        out
    }
}
