//! HTTP/1.1 server: a page registry plugged in as a [`crate::server::TcpServer`]
//! service function, running the per-connection receive/dispatch/send loop.
//!
//! Grounded on the per-connection loop in the component design and on
//! `ryanseipp-rask-old/server/src/listener.rs`'s connection-owning worker
//! closure shape.

use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::conn::Connection;
use crate::error::{ErrorKind, Result};
use crate::http::message::{Request, Response};
use crate::http::registry::{Handler, PageAttributes, PageRegistry};
use crate::http::status::Status;
use crate::http::{emitter, parser};
use crate::server::{ServiceFn, TcpServer};

/// Owns a [`PageRegistry`] and a [`TcpServer`], wiring the former in as the
/// latter's per-connection service function.
pub struct HttpServer {
    tcp: TcpServer,
    registry: Arc<Mutex<PageRegistry>>,
    post_limit: usize,
}

impl HttpServer {
    /// Builds the service function from `registry` and `config.post_limit`,
    /// then constructs the underlying TCP server around it.
    pub fn new(config: Config, registry: PageRegistry) -> Result<Self> {
        let post_limit = config.post_limit;
        let registry = Arc::new(Mutex::new(registry));
        let service_fn = make_service_fn(Arc::clone(&registry), post_limit);
        let tcp = TcpServer::new(config, service_fn)?;
        Ok(Self {
            tcp,
            registry,
            post_limit,
        })
    }

    pub fn register(
        &self,
        path: impl Into<String>,
        handler: Handler,
        attributes: PageAttributes,
    ) -> Result<()> {
        self.registry.lock().unwrap().register(path, handler, attributes)
    }

    pub fn set_default_handler(&self, handler: Handler, attributes: PageAttributes) {
        self.registry.lock().unwrap().set_default_handler(handler, attributes);
    }

    pub fn set_client_filter(&mut self, filter: Arc<dyn crate::server::ClientFilter>) {
        self.tcp.set_client_filter(filter);
    }

    pub fn counters(&self) -> Arc<crate::server::ServerCounters> {
        self.tcp.counters()
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.tcp.local_addr()
    }

    pub fn run(&self) -> Result<()> {
        self.tcp.run()
    }

    pub fn shutdown(&self) -> Result<()> {
        self.tcp.shutdown()
    }

    pub fn post_limit(&self) -> usize {
        self.post_limit
    }
}

fn make_service_fn(registry: Arc<Mutex<PageRegistry>>, post_limit: usize) -> ServiceFn {
    Arc::new(move |mut conn: Connection| {
        serve_connection(&mut conn, &registry, post_limit);
    })
}

/// The per-connection loop from the component design: receive, dispatch,
/// apply attributes, send, repeat while both ends want to keep the
/// connection alive.
fn serve_connection(conn: &mut Connection, registry: &Mutex<PageRegistry>, post_limit: usize) {
    loop {
        conn.mark_request_started();
        let request = match parser::receive(conn, post_limit) {
            Ok(req) => req,
            Err(e) if e.kind() == ErrorKind::PeerClosed => break,
            Err(e) => {
                tracing::debug!(error = %e, "request parse failed");
                let mut response = Response::new();
                response.set_status(Status::BadRequest);
                response.set_persistent(false);
                let _ = emitter::send(conn, &response);
                break;
            }
        };

        let mut response = Response::new();
        let (status, attributes) = dispatch(registry, &request, &mut response);
        if status != 0 {
            response.set_status(Status::from_code(status));
        }
        attributes.apply(&mut response);

        let persistent = request.is_persistent() && response.is_persistent();
        response.set_persistent(persistent);

        let status_code = response.status.code();
        if let Err(e) = emitter::send(conn, &response) {
            tracing::debug!(error = %e, "response send failed");
            break;
        }
        tracing::info!(
            method = %request.method,
            uri = %request.uri_path,
            status = status_code,
            bytes_out = conn.outgoing(),
            "request served"
        );

        if !persistent {
            break;
        }
    }
    let _ = conn.close();
}

fn dispatch(
    registry: &Mutex<PageRegistry>,
    request: &Request,
    response: &mut Response,
) -> (u16, PageAttributes) {
    let registry = registry.lock().unwrap();
    match registry.lookup(&request.uri_path) {
        Some((handler, attributes)) => {
            let status = handler(request, response);
            (status, attributes.clone())
        }
        None => {
            response.set_status(Status::NotFound);
            (0, PageAttributes::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::{AllowList, ClientFilter};
    use std::io::{Read as _, Write as _};
    use std::net::TcpStream;
    use std::thread;
    use std::time::Duration;

    fn spawn_server(mut config: Config, registry: PageRegistry) -> (Arc<HttpServer>, std::net::SocketAddr) {
        config.port = 0;
        config.io_params.timeout_accept = Duration::from_millis(50);
        let server = Arc::new(HttpServer::new(config, registry).unwrap());
        let addr = server.local_addr().unwrap();
        let run_server = Arc::clone(&server);
        thread::spawn(move || {
            let _ = run_server.run();
        });
        (server, addr)
    }

    fn read_response(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let mut chunk = [0u8; 256];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(_) => break,
            }
            if buf.ends_with(b"/echo") || buf.ends_with(b"hello world") || buf.len() > 4096 {
                break;
            }
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn plaintext_get_echoes_uri_with_status_200() {
        let mut registry = PageRegistry::new(8);
        registry
            .register(
                "/echo",
                Arc::new(|req, resp| {
                    resp.body = req.uri_path.clone().into_bytes();
                    resp.set_persistent(false);
                    200
                }),
                PageAttributes::new(),
            )
            .unwrap();
        let (_server, addr) = spawn_server(Config::default(), registry);

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET /echo HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
        let resp = read_response(&mut client);

        assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(resp.contains("Content-Length: 5\r\n"));
        assert!(resp.ends_with("/echo"));
    }

    #[test]
    fn chunked_request_body_is_reassembled() {
        let mut registry = PageRegistry::new(8);
        registry
            .register(
                "/p",
                Arc::new(|req, resp| {
                    assert_eq!(req.content.as_deref(), Some(b"hello world".as_slice()));
                    resp.set_persistent(false);
                    200
                }),
                PageAttributes::new(),
            )
            .unwrap();
        let (_server, addr) = spawn_server(Config::default(), registry);

        let mut client = TcpStream::connect(addr).unwrap();
        client
            .write_all(
                b"POST /p HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
            )
            .unwrap();
        let resp = read_response(&mut client);

        assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(resp.contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn if_modified_since_match_yields_not_modified() {
        let mut registry = PageRegistry::new(8);
        registry
            .register(
                "/r",
                Arc::new(|req, resp| {
                    if req.if_modified_since() == Some(1_700_000_000) {
                        resp.set_persistent(false);
                        return 304;
                    }
                    resp.set_persistent(false);
                    200
                }),
                PageAttributes::new(),
            )
            .unwrap();
        let (_server, addr) = spawn_server(Config::default(), registry);

        let mut client = TcpStream::connect(addr).unwrap();
        client
            .write_all(b"GET /r HTTP/1.1\r\nIf-Modified-Since: Tue, 14 Nov 2023 22:13:20 GMT\r\n\r\n")
            .unwrap();
        let resp = read_response(&mut client);

        assert!(resp.starts_with("HTTP/1.1 304 Not Modified\r\n"));
    }

    #[test]
    fn client_filter_rejects_before_any_byte_is_exchanged() {
        let registry = PageRegistry::new(1);
        let mut config = Config::default();
        config.port = 0;
        config.io_params.timeout_accept = Duration::from_millis(50);
        let mut server = HttpServer::new(config, registry).unwrap();
        server.set_client_filter(Arc::new(AllowList(vec!["::1".parse().unwrap()])) as Arc<dyn ClientFilter>);
        let server = Arc::new(server);
        let addr = server.local_addr().unwrap();
        let counters = server.counters();
        let run_server = Arc::clone(&server);
        thread::spawn(move || {
            let _ = run_server.run();
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).unwrap_or(0);
        assert_eq!(n, 0);

        for _ in 0..50 {
            if counters.denied_clients() > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(counters.denied_clients(), 1);
    }
}
