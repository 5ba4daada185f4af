//! TCP server: listening socket owner, accept loop, client admission,
//! dispatch to the pool, graceful shutdown, and per-server counters.
//!
//! Grounded on the accept loop in `tcp_server.h`'s contract and on
//! `ryanseipp-rask-old`'s `listener.rs`/`server/src/listener.rs` for the
//! Rust-side shape of a listener owning a worker dispatch path.

use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::conn::Connection;
use crate::error::Result;
use crate::net::readiness::AcceptPoller;
use crate::net::socket::Socket;
use crate::net::tls::TlsContext;
use crate::pool::{Job, ThreadPool};

/// A client-admission predicate, checked immediately after accept and
/// before the connection is handed to the pool.
pub trait ClientFilter: Send + Sync {
    fn admits(&self, peer: &SocketAddr) -> bool;
}

/// Admits every peer; the default when no filter is configured.
pub struct AllowAll;
impl ClientFilter for AllowAll {
    fn admits(&self, _peer: &SocketAddr) -> bool {
        true
    }
}

/// Admits only peers whose IP matches one of a fixed allow-list.
pub struct AllowList(pub Vec<std::net::IpAddr>);
impl ClientFilter for AllowList {
    fn admits(&self, peer: &SocketAddr) -> bool {
        self.0.contains(&peer.ip())
    }
}

/// Atomic, monotonic counters observed by operators and the end-to-end
/// tests.
#[derive(Default)]
pub struct ServerCounters {
    pub poll_intr: AtomicU64,
    pub poll_again: AtomicU64,
    pub accept_failed: AtomicU64,
    pub denied_clients: AtomicU64,
}

impl ServerCounters {
    pub fn poll_intr(&self) -> u64 {
        self.poll_intr.load(Ordering::Relaxed)
    }
    pub fn poll_again(&self) -> u64 {
        self.poll_again.load(Ordering::Relaxed)
    }
    pub fn accept_failed(&self) -> u64 {
        self.accept_failed.load(Ordering::Relaxed)
    }
    pub fn denied_clients(&self) -> u64 {
        self.denied_clients.load(Ordering::Relaxed)
    }
}

/// A service function run once per accepted connection; it owns the
/// connection for its lifetime and must close it before returning.
pub type ServiceFn = Arc<dyn Fn(Connection) + Send + Sync + 'static>;

/// Listening socket + pool + counters, dispatching accepted connections to
/// a user-supplied service function.
pub struct TcpServer {
    listener: TcpListener,
    tls: Option<TlsContext>,
    config: Config,
    pool: Arc<ThreadPool>,
    service_fn: ServiceFn,
    client_filter: Arc<dyn ClientFilter>,
    shutting_down: Arc<AtomicBool>,
    counters: Arc<ServerCounters>,
}

impl TcpServer {
    /// Creates the listening socket and worker pool (`get_root_resources` +
    /// pool construction from the original's split `init`/`get_root_resources`
    /// steps, collapsed since Rust construction is fallible end-to-end).
    pub fn new(config: Config, service_fn: ServiceFn) -> Result<Self> {
        config.validate()?;

        let tls = if config.socket_type == crate::config::SocketType::Tls {
            Some(TlsContext::from_material(&config.tls)?)
        } else {
            None
        };

        let listener = Socket::bind(&config.host, config.port, 1024)?;
        listener.set_nonblocking(false)?;

        let pool = ThreadPool::new(
            config.worker_threads,
            config.queue_size,
            config.block_when_full,
        );

        Ok(Self {
            listener,
            tls,
            config,
            pool,
            service_fn,
            client_filter: Arc::new(AllowAll),
            shutting_down: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(ServerCounters::default()),
        })
    }

    pub fn set_client_filter(&mut self, filter: Arc<dyn ClientFilter>) {
        self.client_filter = filter;
    }

    pub fn counters(&self) -> Arc<ServerCounters> {
        Arc::clone(&self.counters)
    }

    pub fn pool_counters(&self) -> &crate::pool::Counters {
        self.pool.counters()
    }

    pub fn shutting_down_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutting_down)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Runs the accept loop on the calling thread until `shutdown` is
    /// invoked from another thread (typically the supervisor's shutdown
    /// thread).
    pub fn run(&self) -> Result<()> {
        let mut mio_listener = mio::net::TcpListener::from_std(
            self.listener.try_clone()?,
        );
        let mut poller = AcceptPoller::new(&mut mio_listener)?;

        while !self.shutting_down.load(Ordering::Acquire) {
            match poller.wait_readable(self.config.io_params.timeout_accept) {
                Ok(true) => {}
                Ok(false) => {
                    self.counters.poll_again.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                Err(e) if e.kind() == crate::error::ErrorKind::Again => {
                    self.counters.poll_intr.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                Err(_) => {
                    self.counters.accept_failed.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            }

            let (socket, peer) = match Socket::accept(&self.listener, self.tls.as_ref()) {
                Ok(pair) => pair,
                Err(_) => {
                    self.counters.accept_failed.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            if !self.client_filter.admits(&peer) {
                let mut socket = socket;
                socket.close();
                self.counters.denied_clients.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            let conn = Connection::new(
                socket,
                self.config.readbuf_size,
                self.config.writebuf_size,
                self.config.io_params,
            );

            // On enqueue failure the job (and the connection it captured) is
            // simply dropped here; `Socket`'s `Drop` closes the fd, and the
            // pool's own `discarded` counter already recorded the rejection.
            let service_fn = Arc::clone(&self.service_fn);
            let _ = self.pool.add_work(Job::new(move || service_fn(conn)));
        }
        Ok(())
    }

    /// Sets the shutdown flag, closes the listening socket to unblock
    /// `accept`, then drains and destroys the pool.
    pub fn shutdown(&self) -> Result<()> {
        self.shutting_down.store(true, Ordering::Release);
        self.pool.destroy(true)
    }
}
