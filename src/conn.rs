//! Buffered connection: one socket, a read buffer, a write buffer, and a
//! per-call timeout/retry policy.
//!
//! Grounded line-for-line on `connection.c`'s `fill_read_buffer`,
//! `connection_getc`, `connection_gets`, `connection_read`,
//! `connection_write`, `connection_flush`, and `connection_write_big_buffer`.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::buffer::Buffer;
use crate::config::IoParams;
use crate::error::{Error, Result};
use crate::net::socket::Socket;

/// A buffered, timeout/retry-governed stream built on a [`Socket`].
pub struct Connection {
    socket: Socket,
    read_buf: Buffer,
    write_buf: Buffer,
    io: IoParams,
    peer_addr: Option<SocketAddr>,
    persistent: bool,
    incoming: u64,
    outgoing: u64,
    connected_at: Instant,
    request_started_at: Option<Instant>,
}

impl Connection {
    pub fn new(socket: Socket, readbuf_size: usize, writebuf_size: usize, io: IoParams) -> Self {
        let peer_addr = socket.peer_addr().ok();
        Self {
            socket,
            read_buf: Buffer::new(readbuf_size),
            write_buf: Buffer::new(writebuf_size),
            io,
            peer_addr,
            persistent: false,
            incoming: 0,
            outgoing: 0,
            connected_at: Instant::now(),
            request_started_at: None,
        }
    }

    /// Connects a client-side connection.
    pub fn connect(
        host: &str,
        port: u16,
        readbuf_size: usize,
        writebuf_size: usize,
        io: IoParams,
    ) -> Result<Self> {
        let socket = Socket::connect(host, port, None)?;
        Ok(Self::new(socket, readbuf_size, writebuf_size, io))
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn incoming(&self) -> u64 {
        self.incoming
    }

    pub fn outgoing(&self) -> u64 {
        self.outgoing
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Resets byte counters/timestamps/persistence for a new transaction on
    /// the same socket, keeping the allocated buffers.
    pub fn recycle(&mut self) {
        self.persistent = false;
        self.request_started_at = Some(Instant::now());
    }

    pub fn mark_request_started(&mut self) {
        self.request_started_at = Some(Instant::now());
    }

    /// One OS read's worth of bytes into the read buffer. Triggered only
    /// when `canread() == 0`.
    fn refill(&mut self) -> Result<()> {
        debug_assert_eq!(self.read_buf.canread(), 0);
        let mut tmp = vec![0u8; self.read_buf.size()];
        let n = self
            .socket
            .read(&mut tmp, self.io.timeout_read, self.io.retries_read)?;
        self.read_buf.write(&tmp[..n]);
        self.incoming += n as u64;
        Ok(())
    }

    /// Returns one byte, refilling the read buffer from the socket when
    /// empty.
    pub fn getc(&mut self) -> Result<u8> {
        if self.read_buf.canread() == 0 {
            self.refill()?;
        }
        let mut b = [0u8; 1];
        let n = self.read_buf.read(&mut b);
        if n == 0 {
            return Err(Error::peer_closed("no data available"));
        }
        Ok(b[0])
    }

    /// Unreads one byte via the read buffer.
    pub fn ungetc(&mut self) -> bool {
        self.read_buf.unget()
    }

    /// Reads up to `dst.len()` bytes, or up to and including a `'\n'`,
    /// whichever comes first. NUL-terminates within `dst` if room remains
    /// by simply stopping short; callers treat the returned length as the
    /// valid prefix.
    pub fn gets(&mut self, dst: &mut [u8]) -> Result<usize> {
        let mut i = 0;
        while i < dst.len() {
            let b = self.getc()?;
            dst[i] = b;
            i += 1;
            if b == b'\n' {
                break;
            }
        }
        Ok(i)
    }

    /// Drains from the read buffer first; if the residual need exceeds the
    /// buffer's capacity, bypasses the buffer and reads directly from the
    /// socket.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        if self.read_buf.canread() > 0 {
            total += self.read_buf.read(&mut dst[total..]);
        }
        if total == dst.len() {
            return Ok(total);
        }
        let remaining = dst.len() - total;
        if remaining >= self.read_buf.size() {
            let n = self.socket.read(
                &mut dst[total..],
                self.io.timeout_read,
                self.io.retries_read,
            )?;
            self.incoming += n as u64;
            return Ok(total + n);
        }
        self.refill()?;
        total += self.read_buf.read(&mut dst[total..]);
        Ok(total)
    }

    fn buffered_write(&mut self, src: &[u8]) -> Result<()> {
        let mut offset = 0;
        while offset < src.len() {
            if self.write_buf.canwrite() == 0 {
                self.flush()?;
            }
            let n = self.write_buf.write(&src[offset..]);
            if n == 0 {
                self.flush()?;
                continue;
            }
            offset += n;
        }
        Ok(())
    }

    pub fn putc(&mut self, ch: u8) -> Result<()> {
        self.buffered_write(&[ch])
    }

    pub fn puts(&mut self, s: &str) -> Result<()> {
        self.buffered_write(s.as_bytes())
    }

    /// Buffered write. If the buffer lacks room, flushes first; if still
    /// short after flush, writes directly to the socket (the "big buffer"
    /// bypass).
    pub fn write(&mut self, src: &[u8]) -> Result<()> {
        if src.len() > self.write_buf.size() {
            self.flush()?;
            self.socket
                .write(src, self.io.timeout_write, self.io.retries_write)?;
            self.outgoing += src.len() as u64;
            return Ok(());
        }
        self.buffered_write(src)
    }

    /// Drains the write buffer to the socket.
    pub fn flush(&mut self) -> Result<()> {
        if self.write_buf.canread() == 0 {
            return Ok(());
        }
        let pending = self.write_buf.data().to_vec();
        self.socket
            .write(&pending, self.io.timeout_write, self.io.retries_write)?;
        self.outgoing += pending.len() as u64;
        let mut sink = vec![0u8; pending.len()];
        self.write_buf.read(&mut sink);
        Ok(())
    }

    /// Flushes then closes the socket; errors from either surface.
    pub fn close(&mut self) -> Result<()> {
        let flush_result = self.flush();
        self.socket.close();
        flush_result
    }

    /// Discards up to `n` bytes, refilling as needed.
    pub fn discard(&mut self, mut n: usize) -> Result<()> {
        let mut scratch = [0u8; 256];
        while n > 0 {
            let want = n.min(scratch.len());
            let got = self.read(&mut scratch[..want])?;
            if got == 0 {
                break;
            }
            n -= got;
        }
        Ok(())
    }

    /// Detaches the read/write buffers so they can be reassigned to another
    /// connection object, matching `connection_reclaim_read_buffer` /
    /// `connection_reclaim_write_buffer`.
    pub fn reclaim_buffers(&mut self, readbuf_size: usize, writebuf_size: usize) -> (Buffer, Buffer) {
        let old_read = std::mem::replace(&mut self.read_buf, Buffer::new(readbuf_size));
        let old_write = std::mem::replace(&mut self.write_buf, Buffer::new(writebuf_size));
        (old_read, old_write)
    }

    pub fn assign_buffers(&mut self, read: Buffer, write: Buffer) {
        self.read_buf = read;
        self.write_buf = write;
    }

    pub fn elapsed_since_connect(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read as _, Write as _};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

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
    fn write_flush_read_roundtrips() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let reader = thread::spawn(move || {
            let (mut s, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            s.read_exact(&mut buf).unwrap();
            buf
        });

        let client = TcpStream::connect(addr).unwrap();
        let mut conn = Connection::new(Socket::Plain(client), 16, 16, io_params());
        conn.write(b"hello").unwrap();
        conn.flush().unwrap();

        assert_eq!(&reader.join().unwrap(), b"hello");
    }

    #[test]
    fn ungetc_then_getc_returns_same_byte() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let writer = thread::spawn(move || {
            let (mut s, _) = listener.accept().unwrap();
            s.write_all(b"X").unwrap();
        });

        let client = TcpStream::connect(addr).unwrap();
        let mut conn = Connection::new(Socket::Plain(client), 16, 16, io_params());
        writer.join().unwrap();

        let c = conn.getc().unwrap();
        assert_eq!(c, b'X');
        assert!(conn.ungetc());
        let c2 = conn.getc().unwrap();
        assert_eq!(c2, b'X');
    }
}
