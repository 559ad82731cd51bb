// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `header` module implements the object framing layer: the synchronisation marker and the
//! object header that precedes every payload.

use crate::errors::{Error, Result};
use crate::io::ReadBytes;

/// The little-endian synchronisation marker found at the start of every top-level object.
pub const SYNC_MARKER: u32 = 0xd41f_8a37;

const TYPE_MASK: u32 = 0xffff;
const USER_BIT: u32 = 1 << 20;
const EXTENDED_BIT: u32 = 1 << 21;
const ONLY_SUB_OBJECTS_BIT: u32 = 1 << 22;
const VERSION_SHIFT: u32 = 23;
const VERSION_MASK: u32 = 0x1f;

const LENGTH_MASK: u32 = 0x3fff_ffff;
const LENGTH_EXTENDED_BIT: u32 = 1 << 30;

/// An `ObjectHeader` describes a single object in the stream: its type, version, identifier,
/// and the position and length of its payload.
///
/// Headers are immutable once read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObjectHeader {
    /// The object type code. The low 16 bits of the type word; a 32-bit field comfortably holds
    /// the telescope-encoded ranges.
    pub type_code: u32,
    /// The object version (0..=31).
    pub version: u32,
    /// The object identifier. Its meaning is type-dependent: a telescope ID, an event counter,
    /// or a packed flag word.
    pub id: u32,
    /// The payload length in bytes.
    pub length: u64,
    /// The absolute position of the first payload byte.
    pub payload_pos: u64,
    /// The user flag from the type word.
    pub user: bool,
    /// Whether the header carried an extended length word.
    pub extended: bool,
    /// Whether the payload is a sequence of child objects rather than raw bytes.
    pub only_sub_objects: bool,
}

impl ObjectHeader {
    /// Reads a top-level object header, which must start with the synchronisation marker.
    pub fn read<B: ReadBytes>(reader: &mut B) -> Result<ObjectHeader> {
        let marker = reader.read_u32()?;

        if marker != SYNC_MARKER {
            return Err(Error::InvalidSyncMarker(marker));
        }

        Self::read_embedded(reader)
    }

    /// Reads the header of a child object embedded in a container payload. Child headers are not
    /// preceded by the synchronisation marker.
    pub fn read_embedded<B: ReadBytes>(reader: &mut B) -> Result<ObjectHeader> {
        let type_word = reader.read_u32()?;
        let id = reader.read_u32()?;
        let length_word = reader.read_u32()?;

        // The extended-length signal exists in two places in the wild: bit 21 of the type word
        // and bit 30 of the length word. Either one means a high-order length word follows.
        let extended =
            (type_word & EXTENDED_BIT != 0) || (length_word & LENGTH_EXTENDED_BIT != 0);

        let mut length = u64::from(length_word & LENGTH_MASK);

        if extended {
            let high = reader.read_u32()?;
            length |= u64::from(high) << 30;
        }

        Ok(ObjectHeader {
            type_code: type_word & TYPE_MASK,
            version: (type_word >> VERSION_SHIFT) & VERSION_MASK,
            id,
            length,
            payload_pos: reader.pos(),
            user: type_word & USER_BIT != 0,
            extended,
            only_sub_objects: type_word & ONLY_SUB_OBJECTS_BIT != 0,
        })
    }

    /// The absolute position just past the last payload byte.
    pub fn payload_end(&self) -> u64 {
        self.payload_pos + self.length
    }
}
