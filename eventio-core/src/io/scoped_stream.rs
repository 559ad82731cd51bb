// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;

use crate::errors::{end_of_stream_error, Result};

use super::{FiniteStream, ReadBytes};

/// A `ScopedStream` restricts the number of bytes read to a specified limit.
///
/// Object payloads are read through a `ScopedStream` bounded to the length declared in the
/// object header, so a payload parser can never overrun its object.
pub struct ScopedStream<B: ReadBytes> {
    inner: B,
    len: u64,
    read: u64,
}

impl<B: ReadBytes> ScopedStream<B> {
    pub fn new(inner: B, len: u64) -> Self {
        ScopedStream { inner, len, read: 0 }
    }

    /// Returns an immutable reference to the inner stream.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Returns a mutable reference to the inner stream.
    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    /// Ignores the remainder of the `ScopedStream`.
    pub fn ignore(&mut self) -> Result<()> {
        let remaining = self.len - self.read;
        self.read += remaining;
        self.inner.ignore_bytes(remaining)
    }

    /// Convert the `ScopedStream` to the inner stream.
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: ReadBytes> FiniteStream for ScopedStream<B> {
    /// Returns the length of the the `ScopedStream`.
    fn byte_len(&self) -> u64 {
        self.len
    }

    /// Returns the number of bytes read.
    fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Returns the number of bytes available to read.
    fn bytes_available(&self) -> u64 {
        self.len - self.read
    }
}

impl<B: ReadBytes> ReadBytes for ScopedStream<B> {
    #[inline(always)]
    fn read_byte(&mut self) -> Result<u8> {
        if self.len - self.read < 1 {
            return end_of_stream_error();
        }

        self.read += 1;
        self.inner.read_byte()
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> Result<[u8; 2]> {
        if self.len - self.read < 2 {
            return end_of_stream_error();
        }

        self.read += 2;
        self.inner.read_double_bytes()
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> Result<[u8; 4]> {
        if self.len - self.read < 4 {
            return end_of_stream_error();
        }

        self.read += 4;
        self.inner.read_quad_bytes()
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize> {
        // Limit read_buf() to the remainder of the scoped bytes if buf has a greater length.
        let scoped_len = cmp::min(self.len - self.read, buf.len() as u64) as usize;
        let result = self.inner.read_buf(&mut buf[0..scoped_len])?;
        self.read += result as u64;
        Ok(result)
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.len - self.read < buf.len() as u64 {
            return end_of_stream_error();
        }

        self.read += buf.len() as u64;
        self.inner.read_buf_exact(buf)
    }

    fn ignore_bytes(&mut self, count: u64) -> Result<()> {
        if self.len - self.read < count {
            return end_of_stream_error();
        }

        self.read += count;
        self.inner.ignore_bytes(count)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.inner.pos()
    }
}

#[cfg(test)]
mod tests {
    use super::ScopedStream;
    use crate::io::{BufReader, FiniteStream, ReadBytes};

    #[test]
    fn reads_stop_at_the_scope_boundary() {
        let data = [0u8, 1, 2, 3, 4, 5, 6, 7];
        let mut scoped = ScopedStream::new(BufReader::new(&data), 4);

        assert_eq!(scoped.read_u32().unwrap(), u32::from_le_bytes([0, 1, 2, 3]));
        assert!(scoped.read_byte().is_err());
        assert_eq!(scoped.bytes_available(), 0);
    }

    #[test]
    fn ignore_skips_the_remainder() {
        let data = [0u8; 16];
        let mut scoped = ScopedStream::new(BufReader::new(&data), 10);

        scoped.read_u16().unwrap();
        scoped.ignore().unwrap();

        assert_eq!(scoped.bytes_read(), 10);
        assert_eq!(scoped.into_inner().pos(), 10);
    }
}
