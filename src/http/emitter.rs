//! Message to byte-wire conversion: status line, headers in emission order,
//! and body, written through a [`crate::conn::Connection`].
//!
//! Grounded on the send algorithm in the component design and on
//! `ryanseipp-rask-old`'s `parser/h1/response.rs` for field-to-wire-order
//! mapping, adapted to a buffered-write target instead of a pre-sized
//! output slice.

use crate::conn::Connection;
use crate::error::Result;
use crate::http::message::Response;

fn write_header_line(conn: &mut Connection, name: &str, value: &str) -> Result<()> {
    conn.puts(name)?;
    conn.puts(": ")?;
    conn.puts(value)?;
    conn.puts("\r\n")
}

/// Sends `resp` over `conn`: status line, then general, entity, and
/// response-specific headers in that order, a `Content-Length` computed
/// from the body, the terminating blank line, and finally the body.
pub fn send(conn: &mut Connection, resp: &Response) -> Result<()> {
    conn.puts(&resp.version.to_string())?;
    conn.puts(" ")?;
    conn.puts(&resp.status.code().to_string())?;
    conn.puts(" ")?;
    conn.puts(resp.status.reason())?;
    conn.puts("\r\n")?;

    for (name, value) in resp.general_header.set_fields() {
        write_header_line(conn, name, &value)?;
    }
    for (name, value) in resp.response_header.set_fields() {
        write_header_line(conn, name, &value)?;
    }
    for (name, value) in resp.entity_header.set_fields() {
        write_header_line(conn, name, &value)?;
    }
    for (name, value) in &resp.extra_headers {
        write_header_line(conn, name, value)?;
    }
    write_header_line(conn, "Content-Length", &resp.content_length().to_string())?;
    if !resp.is_persistent() {
        write_header_line(conn, "Connection", "close")?;
    }

    conn.puts("\r\n")?;
    conn.write(&resp.body)?;
    conn.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IoParams;
    use crate::http::status::Status;
    use crate::http::version::Version;
    use crate::net::socket::Socket;
    use std::io::Read as _;
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
    fn emits_status_line_headers_and_body() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let reader = thread::spawn(move || {
            let (mut s, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            s.read_to_end(&mut buf).unwrap();
            buf
        });

        let client = TcpStream::connect(addr).unwrap();
        let mut conn = Connection::new(Socket::Plain(client), 256, 256, io_params());

        let mut resp = Response::new();
        resp.version = Version::Http11;
        resp.set_status(Status::Ok);
        resp.entity_header.set_content_type("text/plain");
        resp.body = b"hi".to_vec();
        send(&mut conn, &resp).unwrap();
        conn.close().unwrap();
        drop(conn);

        let raw = reader.join().unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("hi"));
    }
}
