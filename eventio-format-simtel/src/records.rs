// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `records` module defines the value shapes shared by the payload parsers: rectangular
//! matrices stored flat in row-major order, and the three-dimensional ADC sample tensor.

use eventio_core::codec::{read_array, Scalar};
use eventio_core::errors::{corrupt_error, unsupported_version_error, Result};
use eventio_core::header::ObjectHeader;
use eventio_core::io::{FiniteStream, ReadBytes};

/// A rectangular 2-D array of scalars, stored flat in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Box<[T]>,
}

impl<T> Matrix<T> {
    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The row with the given index.
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// The element at the given row and column.
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.cols + col]
    }

    /// The flat row-major backing storage.
    pub fn data(&self) -> &[T] {
        &self.data
    }
}

/// Reads a `rows` x `cols` matrix of little-endian scalars stored row-major.
pub fn read_matrix<T, B>(
    reader: &mut B,
    rows: usize,
    cols: usize,
    what: &'static str,
) -> Result<Matrix<T>>
where
    T: Scalar,
    B: ReadBytes + FiniteStream,
{
    let count = match rows.checked_mul(cols) {
        Some(count) => count,
        None => return corrupt_error(what),
    };

    let data = read_array::<T, B>(reader, count, what)?;

    Ok(Matrix { rows, cols, data })
}

/// ADC samples for one telescope, indexed by gain, pixel, and sample.
///
/// The tensor is dense and zero-initialised; with zero suppression enabled only the pixels named
/// by the suppression ranges carry data, the rest stay zero.
#[derive(Clone, Debug, PartialEq)]
pub struct AdcSamples {
    num_gains: usize,
    num_pixels: usize,
    num_samples: usize,
    data: Box<[u16]>,
}

impl AdcSamples {
    pub(crate) fn zeroed(num_gains: usize, num_pixels: usize, num_samples: usize) -> AdcSamples {
        let data = vec![0u16; num_gains * num_pixels * num_samples].into_boxed_slice();
        AdcSamples { num_gains, num_pixels, num_samples, data }
    }

    /// Dimensions as `(num_gains, num_pixels, num_samples)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.num_gains, self.num_pixels, self.num_samples)
    }

    /// The sample trace of one pixel in one gain channel.
    pub fn trace(&self, gain: usize, pixel: usize) -> &[u16] {
        let start = (gain * self.num_pixels + pixel) * self.num_samples;
        &self.data[start..start + self.num_samples]
    }

    pub(crate) fn trace_mut(&mut self, gain: usize, pixel: usize) -> &mut [u16] {
        let start = (gain * self.num_pixels + pixel) * self.num_samples;
        &mut self.data[start..start + self.num_samples]
    }

    /// The flat backing storage, gain-major then pixel-major.
    pub fn data(&self) -> &[u16] {
        &self.data
    }
}

/// Fails with an unsupported-version error unless the header carries exactly the supported
/// version.
pub(crate) fn require_version(
    header: &ObjectHeader,
    object: &'static str,
    supported: u32,
) -> Result<()> {
    if header.version != supported {
        return unsupported_version_error(object, header.version);
    }
    Ok(())
}

/// Fails with an unsupported-version error unless the header version is at most `max`.
pub(crate) fn require_version_max(
    header: &ObjectHeader,
    object: &'static str,
    max: u32,
) -> Result<()> {
    if header.version > max {
        return unsupported_version_error(object, header.version);
    }
    Ok(())
}

/// Converts a signed element count read from the stream into a usable length. Counts are
/// non-negative in well-formed streams.
pub(crate) fn checked_len(count: i32, what: &'static str) -> Result<usize> {
    match usize::try_from(count) {
        Ok(len) => Ok(len),
        Err(_) => corrupt_error(what),
    }
}

/// Converts an scount-typed element count into a usable length.
pub(crate) fn checked_len64(count: i64, what: &'static str) -> Result<usize> {
    match usize::try_from(count) {
        Ok(len) => Ok(len),
        Err(_) => corrupt_error(what),
    }
}

/// Reads a pair of 32-bit floats, a recurring layout for ranges and coordinates.
pub(crate) fn read_f32_pair<B: ReadBytes>(reader: &mut B) -> Result<[f32; 2]> {
    Ok([reader.read_f32()?, reader.read_f32()?])
}
