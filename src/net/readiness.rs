//! Poll-based readiness for the listening socket.
//!
//! The accept loop is the one place in this crate that genuinely benefits
//! from `mio`'s readiness notification instead of a kernel socket timeout:
//! it waits on a single, long-lived fd across the server's whole lifetime,
//! which is exactly the shape `mio::Poll` is for. Per-connection read/write
//! readiness is instead expressed with `SO_RCVTIMEO`/`SO_SNDTIMEO` (see
//! [`crate::net::socket::Socket`]), since registering and deregistering a
//! fresh `mio::Poll` per call would cost more than the blocking syscall it
//! replaces.

use std::io;
use std::time::Duration;

use mio::{Events, Interest, Poll, Token};

use crate::error::{Error, ErrorKind};

const LISTENER: Token = Token(0);

/// Wraps a single registered `mio::net::TcpListener` and exposes a
/// `wait_readable(timeout)` suitable for an accept loop.
pub struct AcceptPoller {
    poll: Poll,
    events: Events,
}

impl AcceptPoller {
    pub fn new(listener: &mut mio::net::TcpListener) -> io::Result<Self> {
        let poll = Poll::new()?;
        poll.registry()
            .register(listener, LISTENER, Interest::READABLE)?;
        Ok(Self {
            poll,
            events: Events::with_capacity(1),
        })
    }

    /// Blocks until the listener is readable or `timeout` elapses. Returns
    /// `Ok(true)` if readable, `Ok(false)` on timeout, `Err` on a poll
    /// failure (distinct from the timeout case so callers can track
    /// `poll_intr` vs. `poll_again` style counters).
    pub fn wait_readable(&mut self, timeout: Duration) -> crate::error::Result<bool> {
        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) => Ok(!self.events.is_empty()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                Err(Error::again("accept poll interrupted"))
            }
            Err(e) => Err(Error::with_source(ErrorKind::Io, "accept poll failed", e)),
        }
    }
}
