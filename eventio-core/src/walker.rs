// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `walker` module implements lazy iteration over the objects of a stream.

use log::debug;

use crate::errors::{corrupt_error, Error, Result};
use crate::header::ObjectHeader;
use crate::io::{ReadBytes, ScopedStream};

/// An `ObjectIterator` walks a stream of objects lazily: each call to [`Self::next_header`]
/// yields the next object's header without reading its payload. The payload of the current
/// object can then be parsed through [`Self::payload`], read raw through
/// [`Self::read_payload`], traversed through [`Self::children`], or simply left alone, in which
/// case it is skipped when the next header is requested.
pub struct ObjectIterator<B: ReadBytes> {
    /// Reader of the stream containing the objects.
    reader: B,
    /// The header most recently yielded.
    current: Option<ObjectHeader>,
    /// Position of the next object header that would be read.
    next_pos: u64,
    /// Position immediately past the last byte available to this iterator, if bounded.
    end: Option<u64>,
    /// Top-level objects are preceded by the sync marker; children are not.
    top_level: bool,
}

impl<B: ReadBytes> ObjectIterator<B> {
    /// Creates a new iterator over the top-level objects of a stream, starting from the current
    /// stream position.
    pub fn new(reader: B) -> Self {
        let pos = reader.pos();
        ObjectIterator { reader, current: None, next_pos: pos, end: None, top_level: true }
    }

    /// Consumes this iterator and returns the original stream.
    pub fn into_inner(self) -> B {
        self.reader
    }

    /// Gets the position of the underlying stream.
    pub fn pos(&self) -> u64 {
        self.reader.pos()
    }

    /// The header most recently yielded by [`Self::next_header`].
    pub fn current(&self) -> Option<&ObjectHeader> {
        self.current.as_ref()
    }

    /// Reads the next object header, skipping over whatever remains of the previous object's
    /// payload.
    ///
    /// Returns `Ok(None)` at the end of the stream, or, for a child iterator, at the end of the
    /// parent payload.
    pub fn next_header(&mut self) -> Result<Option<ObjectHeader>> {
        let pos = self.reader.pos();

        if pos > self.next_pos {
            return corrupt_error("object payload was read past its end");
        }

        if pos < self.next_pos {
            debug!("skipping {} unread payload bytes", self.next_pos - pos);
            self.reader.ignore_bytes(self.next_pos - pos)?;
        }

        if let Some(end) = self.end {
            if self.next_pos >= end {
                self.current = None;
                return Ok(None);
            }
        }

        let header = if self.top_level {
            match ObjectHeader::read(&mut self.reader) {
                Ok(header) => header,
                // A clean end of stream at an object boundary ends the iteration.
                Err(Error::UnexpectedEndOfStream) => {
                    self.current = None;
                    return Ok(None);
                }
                Err(err) => return Err(err),
            }
        }
        else {
            ObjectHeader::read_embedded(&mut self.reader)?
        };

        if let Some(end) = self.end {
            if header.payload_end() > end {
                return corrupt_error("child object overruns its parent payload");
            }
        }

        self.current = Some(header);
        self.next_pos = header.payload_end();

        Ok(Some(header))
    }

    /// Returns a bounded view over the payload of the current object, with the cursor at payload
    /// offset zero.
    ///
    /// Panics if no header has been read, or if part of the payload was already consumed.
    pub fn payload(&mut self) -> ScopedStream<&mut B> {
        let header = self.current.expect("an object header must be read first");

        assert_eq!(self.reader.pos(), header.payload_pos, "payload already consumed");

        ScopedStream::new(&mut self.reader, header.length)
    }

    /// Reads the entire payload of the current object as raw bytes.
    pub fn read_payload(&mut self) -> Result<Box<[u8]>> {
        let header = self.current.expect("an object header must be read first");

        assert_eq!(self.reader.pos(), header.payload_pos, "payload already consumed");

        self.reader.read_boxed_slice_exact(header.length as usize)
    }

    /// Returns an iterator over the child objects of the current object.
    ///
    /// The child iterator is bounded by the parent payload: children extending past it fail with
    /// a corrupt-encoding error, and iteration ends at the payload end. Meaningful only for
    /// objects with [`ObjectHeader::only_sub_objects`] set, but any payload that happens to
    /// contain well-formed child objects can be traversed.
    pub fn children(&mut self) -> ObjectIterator<&mut B> {
        let header = self.current.expect("an object header must be read first");

        ObjectIterator {
            reader: &mut self.reader,
            current: None,
            next_pos: header.payload_pos,
            end: Some(header.payload_end()),
            top_level: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectIterator;
    use crate::errors::Error;
    use crate::header::SYNC_MARKER;
    use crate::io::{BufReader, FiniteStream, ReadBytes};

    fn put_object(buf: &mut Vec<u8>, type_code: u32, payload: &[u8], top_level: bool) {
        put_container(buf, type_code, payload, false, top_level);
    }

    fn put_container(
        buf: &mut Vec<u8>,
        type_code: u32,
        payload: &[u8],
        only_sub_objects: bool,
        top_level: bool,
    ) {
        if top_level {
            buf.extend_from_slice(&SYNC_MARKER.to_le_bytes());
        }
        let type_word = type_code | (u32::from(only_sub_objects) << 22);
        buf.extend_from_slice(&type_word.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(payload);
    }

    #[test]
    fn yields_objects_lazily_and_in_order() {
        let mut buf = Vec::new();
        put_object(&mut buf, 2000, &[1, 2, 3, 4], true);
        put_object(&mut buf, 2001, &[5, 6], true);
        put_object(&mut buf, 2002, &[], true);

        let mut it = ObjectIterator::new(BufReader::new(&buf));

        let first = it.next_header().unwrap().unwrap();
        assert_eq!(first.type_code, 2000);
        assert_eq!(first.length, 4);

        // The payload of the first object is never read; the walker skips it.
        let second = it.next_header().unwrap().unwrap();
        assert_eq!(second.type_code, 2001);
        assert_eq!(it.pos(), second.payload_pos);

        let third = it.next_header().unwrap().unwrap();
        assert_eq!(third.type_code, 2002);
        assert_eq!(third.length, 0);

        assert!(it.next_header().unwrap().is_none());
    }

    #[test]
    fn payload_view_is_scoped_to_the_object() {
        let mut buf = Vec::new();
        put_object(&mut buf, 2000, &[10, 11, 12], true);
        put_object(&mut buf, 2001, &[13], true);

        let mut it = ObjectIterator::new(BufReader::new(&buf));
        it.next_header().unwrap().unwrap();

        let mut payload = it.payload();
        assert_eq!(payload.byte_len(), 3);
        assert_eq!(payload.read_byte().unwrap(), 10);
        assert!(payload.ignore_bytes(3).is_err());

        // A partially consumed payload does not break forward progress.
        let second = it.next_header().unwrap().unwrap();
        assert_eq!(second.type_code, 2001);
    }

    #[test]
    fn children_are_bounded_by_the_parent() {
        let mut inner = Vec::new();
        put_object(&mut inner, 2011, &[1, 2], false);
        put_object(&mut inner, 2013, &[3], false);

        let mut buf = Vec::new();
        put_container(&mut buf, 2010, &inner, true, true);

        let mut it = ObjectIterator::new(BufReader::new(&buf));
        let parent = it.next_header().unwrap().unwrap();
        assert!(parent.only_sub_objects);

        let mut children = it.children();
        let first = children.next_header().unwrap().unwrap();
        assert_eq!(first.type_code, 2011);
        let second = children.next_header().unwrap().unwrap();
        assert_eq!(second.type_code, 2013);
        assert_eq!(children.read_payload().unwrap().as_ref(), &[3]);
        assert!(children.next_header().unwrap().is_none());

        assert!(it.next_header().unwrap().is_none());
    }

    #[test]
    fn overrunning_child_is_rejected() {
        let mut inner = Vec::new();
        // Child header declares more payload than the parent holds.
        inner.extend_from_slice(&2011u32.to_le_bytes());
        inner.extend_from_slice(&0u32.to_le_bytes());
        inner.extend_from_slice(&100u32.to_le_bytes());

        let mut buf = Vec::new();
        put_container(&mut buf, 2010, &inner, true, true);

        let mut it = ObjectIterator::new(BufReader::new(&buf));
        it.next_header().unwrap().unwrap();

        let mut children = it.children();
        assert!(matches!(children.next_header(), Err(Error::CorruptEncoding(_))));
    }

    #[test]
    fn garbage_at_a_top_level_boundary_is_rejected() {
        let mut buf = Vec::new();
        put_object(&mut buf, 2000, &[], true);
        buf.extend_from_slice(&[0xffu8; 16]);

        let mut it = ObjectIterator::new(BufReader::new(&buf));
        it.next_header().unwrap().unwrap();

        assert!(matches!(it.next_header(), Err(Error::InvalidSyncMarker(_))));
    }
}
