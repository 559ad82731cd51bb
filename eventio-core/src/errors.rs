// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::io;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by the decoder.
#[derive(Debug)]
pub enum Error {
    /// An IO error occurred while reading or seeking the underlying byte source.
    IoError(io::Error),
    /// A top-level object did not start with the expected synchronisation marker. The value read
    /// in its place is attached.
    InvalidSyncMarker(u32),
    /// The byte source returned fewer bytes than requested.
    UnexpectedEndOfStream,
    /// No parser exists for the given object type code.
    UnknownType(u32),
    /// The object version is outside the supported set for its type.
    UnsupportedVersion {
        /// Name of the object type whose version gate failed.
        object: &'static str,
        /// The version found in the object header.
        version: u32,
    },
    /// A flag combination outside the implemented subset of the format.
    UnsupportedCombination(&'static str),
    /// The telescope ID derived from the object type code differs from the one derived from the
    /// object ID.
    TelescopeIdMismatch {
        /// Telescope ID reconstructed from the type code.
        from_type: u16,
        /// Telescope ID reconstructed from the object ID word.
        from_id: u16,
    },
    /// An element count implies more bytes than remain in the payload.
    OversizedArray(&'static str),
    /// A variable-length integer or differential vector violated its encoding invariants.
    CorruptEncoding(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => {
                write!(f, "io error: {}", err)
            }
            Error::InvalidSyncMarker(found) => {
                write!(f, "invalid sync marker: {:#010x}", found)
            }
            Error::UnexpectedEndOfStream => {
                write!(f, "unexpected end of stream")
            }
            Error::UnknownType(type_code) => {
                write!(f, "unknown object type: {}", type_code)
            }
            Error::UnsupportedVersion { object, version } => {
                write!(f, "unsupported version of {}: {}", object, version)
            }
            Error::UnsupportedCombination(what) => {
                write!(f, "unsupported combination: {}", what)
            }
            Error::TelescopeIdMismatch { from_type, from_id } => {
                write!(
                    f,
                    "telescope id mismatch: type encodes {}, id encodes {}",
                    from_type, from_id
                )
            }
            Error::OversizedArray(what) => {
                write!(f, "array count exceeds remaining payload: {}", what)
            }
            Error::CorruptEncoding(what) => {
                write!(f, "corrupt encoding: {}", what)
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEndOfStream,
            _ => Error::IoError(err),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create an end-of-stream error.
pub fn end_of_stream_error<T>() -> Result<T> {
    Err(Error::UnexpectedEndOfStream)
}

/// Convenience function to create an unsupported-version error.
pub fn unsupported_version_error<T>(object: &'static str, version: u32) -> Result<T> {
    Err(Error::UnsupportedVersion { object, version })
}

/// Convenience function to create an unsupported-combination error.
pub fn unsupported_combination_error<T>(what: &'static str) -> Result<T> {
    Err(Error::UnsupportedCombination(what))
}

/// Convenience function to create an oversized-array error.
pub fn oversized_array_error<T>(what: &'static str) -> Result<T> {
    Err(Error::OversizedArray(what))
}

/// Convenience function to create a corrupt-encoding error.
pub fn corrupt_error<T>(what: &'static str) -> Result<T> {
    Err(Error::CorruptEncoding(what))
}
