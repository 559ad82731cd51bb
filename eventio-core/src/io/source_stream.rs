// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;
use std::io::{Read, Seek, SeekFrom};

use crate::errors::{end_of_stream_error, Result};

use super::{ByteSource, ReadBytes};

/// A `SourceStream` is the common positioned reader over a [`ByteSource`]. By using type erasure
/// and dynamic dispatch, `SourceStream` wraps and hides the inner reader from the consumer,
/// allowing any typical `Read`er to be used in a generic way, selectable at runtime.
///
/// To minimize system call and dynamic dispatch overhead on the inner reader, and to amortize
/// that overhead over many bytes, `SourceStream` implements an exponentially growing read-ahead
/// buffer. The read-ahead length starts at 1kB, and doubles in length as more sequential reads
/// are performed until it reaches 32kB.
///
/// The decoder built on top of this stream only ever moves forward: skipped payloads are either
/// seeked over, when the source supports it, or read and discarded.
pub struct SourceStream {
    /// The source reader.
    inner: Box<dyn ByteSource>,
    /// The read-ahead buffer.
    buf: Box<[u8]>,
    /// The position of the next unread byte in the buffer.
    read_pos: usize,
    /// The position just past the last valid byte in the buffer.
    write_pos: usize,
    /// The current block size for a new read.
    read_block_len: usize,
    /// Whether the inner source supports seeking. Queried once at construction.
    seekable: bool,
    /// Absolute position of the stream, i.e. the position of the next byte to be returned.
    pos: u64,
}

impl SourceStream {
    const MIN_BLOCK_LEN: usize = 1024;
    const MAX_BLOCK_LEN: usize = 32 * 1024;

    pub fn new(source: Box<dyn ByteSource>) -> Self {
        let seekable = source.is_seekable();

        SourceStream {
            inner: source,
            buf: vec![0u8; Self::MAX_BLOCK_LEN].into_boxed_slice(),
            read_pos: 0,
            write_pos: 0,
            read_block_len: Self::MIN_BLOCK_LEN,
            seekable,
            pos: 0,
        }
    }

    /// Returns the length in bytes of the underlying source, if available.
    pub fn byte_len(&self) -> Option<u64> {
        self.inner.byte_len()
    }

    /// Returns if the underlying source is seekable.
    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    #[inline(always)]
    fn unread_len(&self) -> usize {
        self.write_pos - self.read_pos
    }

    /// If the buffer has been exhausted, fetch a new block of data to replenish the buffer.
    fn fetch(&mut self) -> Result<()> {
        if self.read_pos == self.write_pos {
            let len = self.inner.read(&mut self.buf[..self.read_block_len])?;

            self.read_pos = 0;
            self.write_pos = len;

            // Grow the read block length exponentially to reduce the overhead of buffering on
            // consecutive reads.
            self.read_block_len = cmp::min(self.read_block_len << 1, Self::MAX_BLOCK_LEN);
        }

        Ok(())
    }

    /// If the buffer has been exhausted, fetch a new block of data to replenish the buffer. If
    /// no more data could be fetched, return an end-of-stream error.
    fn fetch_or_eof(&mut self) -> Result<()> {
        self.fetch()?;

        if self.read_pos == self.write_pos {
            return end_of_stream_error();
        }

        Ok(())
    }

    /// Advances the read position by `len` bytes.
    #[inline(always)]
    fn consume(&mut self, len: usize) {
        self.read_pos += len;
        self.pos += len as u64;
    }
}

impl ReadBytes for SourceStream {
    #[inline(always)]
    fn read_byte(&mut self) -> Result<u8> {
        self.fetch_or_eof()?;

        let byte = self.buf[self.read_pos];
        self.consume(1);

        Ok(byte)
    }

    fn read_double_bytes(&mut self) -> Result<[u8; 2]> {
        let mut bytes = [0u8; 2];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_quad_bytes(&mut self) -> Result<[u8; 4]> {
        let mut bytes = [0u8; 4];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.fetch()?;

        let len = cmp::min(self.unread_len(), buf.len());
        buf[..len].copy_from_slice(&self.buf[self.read_pos..self.read_pos + len]);
        self.consume(len);

        Ok(len)
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;

        while filled < buf.len() {
            self.fetch_or_eof()?;

            let len = cmp::min(self.unread_len(), buf.len() - filled);
            buf[filled..filled + len].copy_from_slice(&self.buf[self.read_pos..self.read_pos + len]);
            self.consume(len);

            filled += len;
        }

        Ok(())
    }

    fn ignore_bytes(&mut self, count: u64) -> Result<()> {
        // Serve as much of the skip as possible from the read-ahead buffer.
        let buffered = cmp::min(self.unread_len() as u64, count);
        self.consume(buffered as usize);

        let mut remaining = count - buffered;

        if remaining == 0 {
            return Ok(());
        }

        // The buffer is now drained, so the inner source is positioned exactly at `pos`.
        if self.seekable {
            self.inner.seek(SeekFrom::Start(self.pos + remaining))?;
            self.pos += remaining;
            return Ok(());
        }

        let mut scratch = [0u8; 1024];

        while remaining > 0 {
            let len = cmp::min(remaining, scratch.len() as u64) as usize;
            let actual = self.inner.read(&mut scratch[..len])?;

            if actual == 0 {
                return end_of_stream_error();
            }

            self.pos += actual as u64;
            remaining -= actual as u64;
        }

        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::SourceStream;
    use crate::io::{ReadBytes, ReadOnlySource};

    #[test]
    fn sequential_reads_track_position() {
        let data: Vec<u8> = (0u8..64).collect();
        let mut stream = SourceStream::new(Box::new(Cursor::new(data)));

        assert_eq!(stream.read_byte().unwrap(), 0);
        assert_eq!(stream.read_u16().unwrap(), u16::from_le_bytes([1, 2]));
        assert_eq!(stream.read_u32().unwrap(), u32::from_le_bytes([3, 4, 5, 6]));
        assert_eq!(stream.pos(), 7);
    }

    #[test]
    fn ignore_bytes_skips_forward() {
        let data: Vec<u8> = (0u8..255).collect();
        let mut stream = SourceStream::new(Box::new(Cursor::new(data)));

        stream.read_byte().unwrap();
        stream.ignore_bytes(100).unwrap();
        assert_eq!(stream.pos(), 101);
        assert_eq!(stream.read_byte().unwrap(), 101);
    }

    #[test]
    fn exhausted_source_is_end_of_stream() {
        let mut stream = SourceStream::new(Box::new(Cursor::new(vec![1u8, 2])));

        assert!(stream.read_u16().is_ok());
        assert!(stream.read_byte().is_err());
    }

    #[test]
    fn unseekable_sources_skip_by_discarding() {
        let data: Vec<u8> = (0u8..200).collect();
        let source = ReadOnlySource::new(Cursor::new(data));
        let mut stream = SourceStream::new(Box::new(source));

        assert!(!stream.is_seekable());

        stream.ignore_bytes(150).unwrap();
        assert_eq!(stream.pos(), 150);
        assert_eq!(stream.read_byte().unwrap(), 150);
        assert!(stream.ignore_bytes(100).is_err());
    }
}
