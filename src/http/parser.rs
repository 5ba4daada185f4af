//! Byte-wire to message conversion over a [`crate::conn::Connection`]:
//! request line, header folding, and chunked/content-length bodies.
//!
//! Grounded on the receive algorithm in the component design and on
//! `ryanseipp-rask-old`'s `parser/h1/request.rs` for the zero-copy scanning
//! style (`take_until`/line-oriented parsing), adapted here to read
//! incrementally from a buffered connection instead of a pre-filled slice.

use std::fmt;

use crate::conn::Connection;
use crate::http::message::{Cookie, Request};
use crate::http::method::Method;
use crate::http::urlencode;
use crate::http::version::Version;

/// Malformed input surfaced by the parser -- the "protocol" error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    Method,
    Target,
    Version,
    HeaderName,
    HeaderValue,
    NewLine,
    Whitespace,
    UrlEncoding,
    ChunkFraming,
    ContentTooLarge,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Method => "invalid method",
            Self::Target => "invalid request target",
            Self::Version => "invalid HTTP version",
            Self::HeaderName => "invalid header name",
            Self::HeaderValue => "invalid header value",
            Self::NewLine => "expected CRLF",
            Self::Whitespace => "expected whitespace",
            Self::UrlEncoding => "invalid percent-encoding",
            Self::ChunkFraming => "invalid chunked transfer framing",
            Self::ContentTooLarge => "body exceeds configured limit",
        };
        f.write_str(s)
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for crate::error::Error {
    fn from(e: ParseError) -> Self {
        crate::error::Error::protocol(e.to_string())
    }
}

/// Reads one CRLF-terminated line from `conn`, stripping the terminator.
fn read_line(conn: &mut Connection) -> crate::error::Result<String> {
    let mut line = Vec::new();
    loop {
        let b = conn.getc()?;
        if b == b'\n' {
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            break;
        }
        line.push(b);
    }
    String::from_utf8(line).map_err(|_| ParseError::HeaderValue.into())
}

fn parse_request_line(line: &str) -> Result<(Method, String, Version), ParseError> {
    let mut parts = line.splitn(3, ' ');
    let method = parts.next().ok_or(ParseError::Method)?.parse::<Method>()?;
    let target = parts.next().ok_or(ParseError::Target)?.to_string();
    let version_str = parts.next().ok_or(ParseError::Version)?;

    let version_digits = version_str
        .strip_prefix("HTTP/")
        .ok_or(ParseError::Version)?;
    let (major, minor) = version_digits.split_once('.').ok_or(ParseError::Version)?;
    let major: u8 = major.parse().map_err(|_| ParseError::Version)?;
    let minor: u8 = minor.parse().map_err(|_| ParseError::Version)?;
    let version = Version::parse(major, minor)?;

    Ok((method, target, version))
}

fn split_target(target: &str) -> Result<(String, String), ParseError> {
    match target.split_once('?') {
        Some((path, query)) => Ok((urlencode::decode(path)?, query.to_string())),
        None => Ok((urlencode::decode(target)?, String::new())),
    }
}

fn parse_query_params(query: &str, params: &mut crate::http::message::Params) -> Result<(), ParseError> {
    if query.is_empty() {
        return Ok(());
    }
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.push(urlencode::decode(name)?, urlencode::decode(value)?);
    }
    Ok(())
}

fn parse_cookies(value: &str) -> Vec<Cookie> {
    value
        .split(';')
        .filter_map(|part| {
            let part = part.trim();
            let (name, value) = part.split_once('=')?;
            Some(Cookie {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

fn parse_http_date(value: &str) -> Option<i64> {
    httpdate::parse_http_date(value)
        .ok()
        .map(|t| t.duration_since(std::time::UNIX_EPOCH).unwrap().as_secs() as i64)
}

/// Applies one `name: value` header pair to the request's header groups.
fn apply_header(req: &mut Request, name: &str, value: &str) {
    match name.to_ascii_lowercase().as_str() {
        "cache-control" => req.general_header.set_cache_control(value),
        "connection" => req.general_header.set_connection(value),
        "pragma" => req.general_header.set_pragma(value),
        "trailer" => req.general_header.set_trailer(value),
        "transfer-encoding" => req.general_header.set_transfer_encoding(value),
        "upgrade" => req.general_header.set_upgrade(value),
        "via" => req.general_header.set_via(value),
        "warning" => req.general_header.set_warning(value),
        "allow" => req.entity_header.set_allow(value),
        "content-encoding" => req.entity_header.set_content_encoding(value),
        "content-language" => req.entity_header.set_content_language(value),
        "content-length" => {
            if let Ok(n) = value.trim().parse::<u64>() {
                req.entity_header.set_content_length(n);
            }
        }
        "content-location" => req.entity_header.set_content_location(value),
        "content-md5" => req.entity_header.set_content_md5(value),
        "content-range" => req.entity_header.set_content_range(value),
        "content-type" => req.entity_header.set_content_type(value),
        "etag" => req.entity_header.set_etag(value),
        "host" => req.request_header.set_host(value),
        "user-agent" => req.request_header.set_user_agent(value),
        "referer" => req.request_header.set_referer(value),
        "if-modified-since" => {
            if let Some(t) = parse_http_date(value) {
                req.request_header.set_if_modified_since(t);
            }
        }
        "accept" => req.request_header.set_accept(value),
        "accept-encoding" => req.request_header.set_accept_encoding(value),
        "accept-language" => req.request_header.set_accept_language(value),
        "authorization" => req.request_header.set_authorization(value),
        "cookie" => {
            req.request_header.set_cookie(value);
            req.cookies = parse_cookies(value);
        }
        _ => req.extra_headers.push((name.to_string(), value.to_string())),
    }
}

/// Reads header lines until the terminating empty line, handling
/// continuation-line folding (a line beginning with SP/HTAB extends the
/// previous header's value).
fn read_headers(conn: &mut Connection, req: &mut Request) -> crate::error::Result<()> {
    let mut pending: Option<(String, String)> = None;
    loop {
        let line = read_line(conn)?;
        if line.is_empty() {
            if let Some((name, value)) = pending.take() {
                apply_header(req, &name, value.trim_end());
            }
            return Ok(());
        }
        if line.starts_with([' ', '\t']) {
            let (_, value) = pending.as_mut().ok_or(ParseError::Whitespace)?;
            value.push(' ');
            value.push_str(line.trim());
            continue;
        }
        if let Some((name, value)) = pending.take() {
            apply_header(req, &name, value.trim_end());
        }
        let (name, value) = line.split_once(':').ok_or(ParseError::HeaderName)?;
        pending = Some((name.trim().to_string(), value.trim_start().to_string()));
    }
}

/// Reads a chunked transfer body per RFC 2616 §3.6.1: hex size, optional
/// extensions, CRLF, data, CRLF; terminator `0 CRLF CRLF`.
fn read_chunked_body(conn: &mut Connection, max_content: usize) -> crate::error::Result<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let size_line = read_line(conn)?;
        let hex_part = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(hex_part, 16).map_err(|_| ParseError::ChunkFraming)?;
        if size == 0 {
            // Trailer headers (if any) followed by the terminating blank
            // line; this crate doesn't surface trailers, so discard them.
            loop {
                let trailer_line = read_line(conn)?;
                if trailer_line.is_empty() {
                    break;
                }
            }
            return Ok(body);
        }
        if body.len() + size > max_content {
            return Err(ParseError::ContentTooLarge.into());
        }
        let mut chunk = vec![0u8; size];
        let mut read_total = 0;
        while read_total < size {
            read_total += conn.read(&mut chunk[read_total..])?;
        }
        body.extend_from_slice(&chunk);
        let trailing_crlf = read_line(conn)?;
        if !trailing_crlf.is_empty() {
            return Err(ParseError::ChunkFraming.into());
        }
    }
}

fn read_fixed_body(conn: &mut Connection, len: u64, max_content: usize) -> crate::error::Result<Vec<u8>> {
    if len as usize > max_content {
        return Err(ParseError::ContentTooLarge.into());
    }
    let mut body = vec![0u8; len as usize];
    let mut read_total = 0;
    while read_total < body.len() {
        let n = conn.read(&mut body[read_total..])?;
        if n == 0 {
            break;
        }
        read_total += n;
    }
    Ok(body)
}

/// Receives one HTTP request from `conn`. `max_content` bounds any
/// request body (chunked or content-length).
pub fn receive(conn: &mut Connection, max_content: usize) -> crate::error::Result<Request> {
    let line = read_line(conn)?;
    let (method, target, version) = parse_request_line(&line)?;
    let (path, query) = split_target(&target)?;

    let mut req = Request::new();
    req.method = method;
    req.version = version;
    req.uri_path = path;
    parse_query_params(&query, &mut req.params)?;

    read_headers(conn, &mut req)?;

    let persistent = match req.general_header.get_connection() {
        Some(v) if v.eq_ignore_ascii_case("close") => false,
        Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
        _ => version.default_persistent(),
    };
    req.set_persistent(persistent);

    if req.deferred_read_flag {
        return Ok(req);
    }

    if req.general_header.is_chunked() {
        let body = read_chunked_body(conn, max_content)?;
        req.content_len = body.len() as u64;
        req.content = Some(body);
    } else if let Some(len) = req.entity_header.get_content_length() {
        let body = read_fixed_body(conn, len, max_content)?;
        req.content_len = body.len() as u64;
        req.content = Some(body);
    }

    if req.entity_header.get_content_type() == Some("application/x-www-form-urlencoded") {
        if let Some(body) = &req.content {
            if let Ok(text) = std::str::from_utf8(body) {
                let mut form_fields = crate::http::message::Params::new();
                let _ = parse_query_params(text, &mut form_fields);
                req.form_fields = form_fields;
            }
        }
    }

    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IoParams;
    use crate::net::socket::Socket;
    use std::io::Write as _;
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Duration;

    fn io_params() -> IoParams {
        IoParams {
            timeout_read: Duration::from_secs(2),
            timeout_write: Duration::from_secs(2),
            timeout_accept: Duration::from_millis(200),
            retries_read: 5,
            retries_write: 5,
        }
    }

    #[test]
    fn unknown_header_is_retained_verbatim() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let writer = thread::spawn(move || {
            let (mut s, _) = listener.accept().unwrap();
            s.write_all(b"GET / HTTP/1.1\r\nHost: x\r\nX-Custom: foo\r\n\r\n")
                .unwrap();
        });

        let client = TcpStream::connect(addr).unwrap();
        let mut conn = Connection::new(Socket::Plain(client), 256, 256, io_params());
        writer.join().unwrap();

        let req = receive(&mut conn, 1024).unwrap();
        assert_eq!(
            req.extra_headers,
            vec![("X-Custom".to_string(), "foo".to_string())]
        );
    }
}
