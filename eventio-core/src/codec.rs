// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `codec` module implements the primitive decoding layer shared by all payload parsers:
//! little-endian scalar arrays, length-prefixed strings, absolute timestamps, the variable-length
//! signed integer ("scount") used for counts, and the differential sample vectors built on it.

use std::mem;

use crate::errors::{corrupt_error, oversized_array_error, Result};
use crate::io::{FiniteStream, ReadBytes};

/// The maximum number of bytes a single scount may occupy. Ten 7-bit groups cover a full 64-bit
/// value.
const MAX_SCOUNT_LEN: u32 = 10;

/// An absolute timestamp as stored in the stream.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Time {
    pub seconds: u32,
    pub nanoseconds: u32,
}

/// Reads a timestamp: two unsigned 32-bit words, seconds then nanoseconds.
pub fn read_time<B: ReadBytes>(reader: &mut B) -> Result<Time> {
    let seconds = reader.read_u32()?;
    let nanoseconds = reader.read_u32()?;
    Ok(Time { seconds, nanoseconds })
}

/// Reads a length-prefixed string: an unsigned 16-bit length followed by that many raw bytes.
///
/// The content is conventionally UTF-8 but is not validated here.
pub fn read_string<B: ReadBytes>(reader: &mut B) -> Result<Vec<u8>> {
    let len = reader.read_u16()?;
    let mut buf = vec![0u8; usize::from(len)];
    reader.read_buf_exact(&mut buf)?;
    Ok(buf)
}

#[inline(always)]
fn zigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Reads a single variable-length signed integer ("scount") from the stream and returns it or an
/// error.
///
/// Bytes are consumed while the continuation bit (bit 7) is set; the low 7 bits of each byte are
/// concatenated little-endian into an unsigned value, which is then zig-zag mapped onto the
/// signed range.
pub fn read_scount<B: ReadBytes>(reader: &mut B) -> Result<i64> {
    let mut value = 0u64;
    let mut shift = 0u32;

    loop {
        let byte = reader.read_byte()?;
        value |= u64::from(byte & 0x7f) << shift;

        if byte & 0x80 == 0 {
            return Ok(zigzag(value));
        }

        shift += 7;

        if shift >= 7 * MAX_SCOUNT_LEN {
            return corrupt_error("scount exceeds maximum length");
        }
    }
}

/// Reads an scount and interprets it as an array or list length.
///
/// Negative values never encode a valid length and fail with a corrupt-encoding error.
pub fn read_scount_len<B: ReadBytes>(reader: &mut B) -> Result<usize> {
    let value = read_scount(reader)?;

    match usize::try_from(value) {
        Ok(len) => Ok(len),
        Err(_) => corrupt_error("negative scount length"),
    }
}

/// Reads a length-`n` vector of unsigned 16-bit samples stored as scount differences from a
/// running previous value.
///
/// This is the reference decoder; [`decode_diff_u16`] is the optimized equivalent over an
/// in-memory block. Both must produce identical output for every valid input.
pub fn read_diff_u16<B: ReadBytes>(reader: &mut B, count: usize) -> Result<Vec<u16>> {
    let mut out = vec![0u16; count];
    let mut prev = 0i64;

    for slot in out.iter_mut() {
        prev += read_scount(reader)?;
        *slot = prev as u16;
    }

    Ok(out)
}

/// Decodes `out.len()` differentially-encoded samples from the front of `buf` and returns the
/// number of bytes consumed.
///
/// This is the hot loop on ADC-heavy streams: the caller reads the backing byte block in one
/// operation and the samples are decoded here without per-byte reader dispatch.
pub fn decode_diff_u16(buf: &[u8], out: &mut [u16]) -> Result<usize> {
    let mut pos = 0usize;
    let mut prev = 0i64;

    for slot in out.iter_mut() {
        let mut value = 0u64;
        let mut shift = 0u32;

        loop {
            let byte = match buf.get(pos) {
                Some(byte) => *byte,
                None => return corrupt_error("differential vector overran its block"),
            };

            pos += 1;
            value |= u64::from(byte & 0x7f) << shift;

            if byte & 0x80 == 0 {
                break;
            }

            shift += 7;

            if shift >= 7 * MAX_SCOUNT_LEN {
                return corrupt_error("scount exceeds maximum length");
            }
        }

        prev += zigzag(value);
        *slot = prev as u16;
    }

    Ok(pos)
}

/// A fixed-width scalar that can be read in bulk from a little-endian stream.
pub trait Scalar: bytemuck::Pod {
    /// Reinterprets a value whose backing bytes were read verbatim from a little-endian stream.
    fn from_le(self) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                #[inline(always)]
                fn from_le(self) -> Self {
                    <$ty>::from_le(self)
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32);

impl Scalar for f32 {
    #[inline(always)]
    fn from_le(self) -> Self {
        f32::from_bits(u32::from_le(self.to_bits()))
    }
}

/// Reads `count` little-endian scalars of type `T` into a boxed slice.
///
/// The requested byte count is validated against the remaining payload before any allocation is
/// made, so a pathological count from a corrupt stream fails with [`crate::errors::Error::OversizedArray`]
/// instead of exhausting memory.
pub fn read_array<T, B>(reader: &mut B, count: usize, what: &'static str) -> Result<Box<[T]>>
where
    T: Scalar,
    B: ReadBytes + FiniteStream,
{
    let byte_len = match count.checked_mul(mem::size_of::<T>()) {
        Some(len) => len,
        None => return oversized_array_error(what),
    };

    if byte_len as u64 > reader.bytes_available() {
        return oversized_array_error(what);
    }

    let mut out = vec![T::zeroed(); count];
    reader.read_buf_exact(bytemuck::cast_slice_mut(&mut out))?;

    // Compiles to nothing on little-endian targets.
    for value in out.iter_mut() {
        *value = value.from_le();
    }

    Ok(out.into_boxed_slice())
}
