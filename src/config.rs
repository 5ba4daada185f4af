//! Typed configuration surface consumed by [`crate::server::TcpServer`] and
//! [`crate::http::server::HttpServer`].
//!
//! Mirrors the option table the original C library exposed through the
//! `tcp_server_set_*` setter family (see `tcp_server.h`); reading a config
//! file or parsing CLI flags to populate this struct is out of scope here.

use std::path::PathBuf;
use std::time::Duration;

/// Plaintext TCP or TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketType {
    Plain,
    Tls,
}

/// TLS material: certificate chain, private key, and an optional trust store
/// for verifying client certificates.
#[derive(Debug, Clone, Default)]
pub struct TlsMaterial {
    pub cert_chain_file: Option<PathBuf>,
    pub private_key_file: Option<PathBuf>,
    pub ca_directory: Option<PathBuf>,
}

/// Per-operation I/O timeout and retry policy shared by connections and the
/// accept loop.
#[derive(Debug, Clone, Copy)]
pub struct IoParams {
    pub timeout_read: Duration,
    pub timeout_write: Duration,
    pub timeout_accept: Duration,
    pub retries_read: u32,
    pub retries_write: u32,
}

impl Default for IoParams {
    fn default() -> Self {
        Self {
            timeout_read: Duration::from_secs(30),
            timeout_write: Duration::from_secs(30),
            timeout_accept: Duration::from_millis(500),
            retries_read: 3,
            retries_write: 3,
        }
    }
}

/// Full configuration surface for a [`crate::server::TcpServer`].
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub socket_type: SocketType,
    pub queue_size: usize,
    pub worker_threads: usize,
    pub block_when_full: bool,
    pub readbuf_size: usize,
    pub writebuf_size: usize,
    pub io_params: IoParams,
    pub post_limit: usize,
    pub tls: TlsMaterial,
    pub documentroot: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            socket_type: SocketType::Plain,
            queue_size: 64,
            worker_threads: 8,
            block_when_full: false,
            readbuf_size: 8192,
            writebuf_size: 8192,
            io_params: IoParams::default(),
            post_limit: 2 * 1024 * 1024,
            tls: TlsMaterial::default(),
            documentroot: None,
        }
    }
}

impl Config {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_queue_size(mut self, size: usize) -> Self {
        self.queue_size = size;
        self
    }

    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = count;
        self
    }

    pub fn with_block_when_full(mut self, block: bool) -> Self {
        self.block_when_full = block;
        self
    }

    pub fn with_buffer_sizes(mut self, readbuf: usize, writebuf: usize) -> Self {
        self.readbuf_size = readbuf;
        self.writebuf_size = writebuf;
        self
    }

    pub fn with_io_params(mut self, params: IoParams) -> Self {
        self.io_params = params;
        self
    }

    pub fn with_post_limit(mut self, limit: usize) -> Self {
        self.post_limit = limit;
        self
    }

    pub fn with_tls(mut self, tls: TlsMaterial) -> Self {
        self.socket_type = SocketType::Tls;
        self.tls = tls;
        self
    }

    pub fn with_documentroot(mut self, root: impl Into<PathBuf>) -> Self {
        self.documentroot = Some(root.into());
        self
    }

    /// Validates the options that the original distinguished as
    /// "configuration" errors (missing cert/key, inconsistent timeouts).
    pub fn validate(&self) -> crate::Result<()> {
        if self.socket_type == SocketType::Tls
            && (self.tls.cert_chain_file.is_none() || self.tls.private_key_file.is_none())
        {
            return Err(crate::Error::configuration(
                "TLS socket type requires both cert_chain_file and private_key_file",
            ));
        }
        if self.queue_size == 0 {
            return Err(crate::Error::configuration("queue_size must be > 0"));
        }
        if self.worker_threads == 0 {
            return Err(crate::Error::configuration("worker_threads must be > 0"));
        }
        Ok(())
    }
}
