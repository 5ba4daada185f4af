// Copyright 2022 Ryan Seipp
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-capacity byte buffer with a linear read/write cursor pair.
//!
//! Unlike a growable ring buffer, capacity is fixed at construction and
//! never reallocated. `read == written` implicitly resets both cursors to
//! zero, so draining a buffer fully makes its whole capacity writable again
//! without a memmove.

use std::borrow::{Borrow, BorrowMut};
use std::io;

/// A fixed-capacity byte buffer. Invariant: `0 <= read <= written <= N`.
#[derive(Debug)]
pub struct Buffer {
    data: Box<[u8]>,
    read: usize,
    written: usize,
}

impl Buffer {
    /// Allocates a buffer with capacity `n`.
    pub fn new(n: usize) -> Self {
        Self {
            data: vec![0u8; n].into_boxed_slice(),
            read: 0,
            written: 0,
        }
    }

    /// Total capacity `N`.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Bytes available to read: `written - read`.
    pub fn canread(&self) -> usize {
        self.written - self.read
    }

    /// Bytes available to write: `N - written`, unless the buffer is fully
    /// drained, in which case the whole capacity is reported.
    pub fn canwrite(&self) -> usize {
        if self.read == self.written {
            self.data.len()
        } else {
            self.data.len() - self.written
        }
    }

    /// The unread region of the buffer.
    pub fn data(&self) -> &[u8] {
        &self.data[self.read..self.written]
    }

    /// Resets both cursors to zero, discarding unread data.
    pub fn reset(&mut self) {
        self.read = 0;
        self.written = 0;
    }

    /// Fills the entire backing region with `byte` without moving either
    /// cursor. Used to pre-zero a buffer before building a NUL-terminated
    /// string in place.
    pub fn set(&mut self, byte: u8) {
        self.data.fill(byte);
    }

    /// Copies up to `min(canwrite(), src.len())` bytes in, implicitly
    /// resetting a fully-drained buffer first if that's required to make
    /// room. Returns the number of bytes actually copied.
    pub fn write(&mut self, src: &[u8]) -> usize {
        if self.read == self.written && self.read != 0 {
            self.reset();
        }
        let n = self.canwrite().min(src.len());
        let start = self.written;
        self.data[start..start + n].copy_from_slice(&src[..n]);
        self.written += n;
        n
    }

    /// Copies up to `min(canread(), dst.len())` bytes out, advancing `read`.
    /// Implicitly resets both cursors once fully drained.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let n = self.canread().min(dst.len());
        dst[..n].copy_from_slice(&self.data[self.read..self.read + n]);
        self.read += n;
        if self.read == self.written {
            self.reset();
        }
        n
    }

    /// Un-reads one byte, decrementing `read` by one. Fails if the buffer
    /// was reset since the last read (there is nothing to push back).
    pub fn unget(&mut self) -> bool {
        if self.read > 0 {
            self.read -= 1;
            true
        } else {
            false
        }
    }
}

impl Borrow<[u8]> for Buffer {
    fn borrow(&self) -> &[u8] {
        self.data()
    }
}

impl BorrowMut<[u8]> for Buffer {
    fn borrow_mut(&mut self) -> &mut [u8] {
        let written = self.written;
        &mut self.data[written..]
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Buffer::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_roundtrips() {
        let mut buf = Buffer::new(16);
        assert_eq!(buf.write(b"hello"), 5);
        assert_eq!(buf.canread(), 5);
        let mut out = [0u8; 5];
        assert_eq!(buf.read(&mut out), 5);
        assert_eq!(&out, b"hello");
        assert_eq!(buf.canread(), 0);
    }

    #[test]
    fn full_drain_resets_cursors() {
        let mut buf = Buffer::new(4);
        buf.write(b"abcd");
        let mut out = [0u8; 4];
        buf.read(&mut out);
        assert_eq!(buf.canwrite(), 4);
        assert_eq!(buf.canread(), 0);
    }

    #[test]
    fn write_never_exceeds_capacity() {
        let mut buf = Buffer::new(4);
        let n = buf.write(b"abcdef");
        assert_eq!(n, 4);
        assert_eq!(buf.canwrite(), 0);
    }

    #[test]
    fn unget_fails_after_reset() {
        let mut buf = Buffer::new(4);
        buf.write(b"ab");
        let mut out = [0u8; 2];
        buf.read(&mut out);
        // buffer is now implicitly reset; nothing to unget
        assert!(!buf.unget());
    }

    #[test]
    fn unget_succeeds_after_partial_read() {
        let mut buf = Buffer::new(4);
        buf.write(b"ab");
        let mut out = [0u8; 1];
        buf.read(&mut out);
        assert!(buf.unget());
        let mut out2 = [0u8; 2];
        assert_eq!(buf.read(&mut out2), 2);
        assert_eq!(&out2, b"ab");
    }

    #[test]
    fn set_fills_without_moving_cursors() {
        let mut buf = Buffer::new(4);
        buf.write(b"ab");
        buf.set(b'x');
        assert_eq!(buf.canread(), 2);
        assert_eq!(buf.data(), b"xx");
    }

    #[test]
    fn randomized_write_read_sizes_preserve_bytes() {
        use fake::Fake;

        let mut buf = Buffer::new(64);
        for _ in 0..50 {
            let len: usize = (1..32).fake();
            let payload: Vec<u8> = (0..len).map(|_| (0u8..=255).fake()).collect();

            let written = buf.write(&payload);
            let mut out = vec![0u8; written];
            let read = buf.read(&mut out);

            assert_eq!(read, written);
            assert_eq!(&out[..read], &payload[..written]);
        }
    }
}
