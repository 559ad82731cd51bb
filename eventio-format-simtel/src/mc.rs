// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monte-Carlo bookkeeping objects: the per-event shower sample and the photo-electron sums.

use eventio_core::codec::read_array;
use eventio_core::errors::Result;
use eventio_core::header::ObjectHeader;
use eventio_core::io::{FiniteStream, ReadBytes};

use crate::records::{checked_len, require_version};

/// Monte-Carlo event, type 2021, version 1: which shower was reused and where its core fell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct McEvent {
    pub event: u32,
    pub shower_num: i32,
    pub xcore: f32,
    pub ycore: f32,
}

impl McEvent {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<McEvent>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "McEvent", 1)?;

        Ok(McEvent {
            event: header.id,
            shower_num: reader.read_i32()?,
            xcore: reader.read_f32()?,
            ycore: reader.read_f32()?,
        })
    }
}

/// The non-empty pixels of one telescope: their IDs and photo-electron counts.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelPhotoElectrons {
    pub pixel_id: Box<[i16]>,
    pub pe: Box<[i32]>,
}

/// Photo-electron sums, type 2026, version 2.
#[derive(Clone, Debug, PartialEq)]
pub struct McPeSum {
    pub event: u32,
    pub shower_num: i32,
    pub num_tel: i32,
    pub num_pe: Box<[i32]>,
    pub num_pixels: Box<[i32]>,
    /// Per-pixel photo-electron counts, one entry per telescope with a positive photo-electron
    /// and pixel count.
    pub pix_pe: Vec<PixelPhotoElectrons>,
    pub photons: Box<[f32]>,
    pub photons_atm: Box<[f32]>,
    pub photons_atm_3_6: Box<[f32]>,
    pub photons_atm_qe: Box<[f32]>,
    pub photons_atm_400: Box<[f32]>,
}

impl McPeSum {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<McPeSum>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "McPeSum", 2)?;

        let shower_num = reader.read_i32()?;
        let num_tel = reader.read_i32()?;

        let telescopes = checked_len(num_tel, "telescope count")?;
        let num_pe = read_array::<i32, B>(reader, telescopes, "photo-electron counts")?;
        let num_pixels = read_array::<i32, B>(reader, telescopes, "pixel counts")?;

        let mut pix_pe = Vec::new();

        for (n_pe, n_pixels) in num_pe.iter().zip(num_pixels.iter()) {
            if *n_pe <= 0 || *n_pixels <= 0 {
                continue;
            }

            let non_empty = reader.read_i16()?;
            let n = checked_len(i32::from(non_empty), "non-empty pixel count")?;

            let pixel_id = read_array::<i16, B>(reader, n, "non-empty pixel ids")?;
            let pe = read_array::<i32, B>(reader, n, "pixel photo-electrons")?;

            pix_pe.push(PixelPhotoElectrons { pixel_id, pe });
        }

        Ok(McPeSum {
            event: header.id,
            shower_num,
            num_tel,
            num_pe,
            num_pixels,
            pix_pe,
            photons: read_array::<f32, B>(reader, telescopes, "photon counts")?,
            photons_atm: read_array::<f32, B>(reader, telescopes, "photons after atmosphere")?,
            photons_atm_3_6: read_array::<f32, B>(reader, telescopes, "photons in 300-600 nm")?,
            photons_atm_qe: read_array::<f32, B>(reader, telescopes, "photons after QE")?,
            photons_atm_400: read_array::<f32, B>(reader, telescopes, "photons in 350-450 nm")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use eventio_core::header::ObjectHeader;
    use eventio_core::io::BufReader;

    use super::{McEvent, McPeSum};

    fn header(type_code: u32, version: u32, id: u32, length: u64) -> ObjectHeader {
        ObjectHeader {
            type_code,
            version,
            id,
            length,
            payload_pos: 0,
            user: false,
            extended: false,
            only_sub_objects: false,
        }
    }

    #[test]
    fn mc_event_is_a_fixed_triple() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&12i32.to_le_bytes());
        buf.extend_from_slice(&150.0f32.to_le_bytes());
        buf.extend_from_slice(&(-30.0f32).to_le_bytes());

        let hdr = header(2021, 1, 404, buf.len() as u64);
        let event = McEvent::parse(&mut BufReader::new(&buf), &hdr).unwrap();

        assert_eq!(event.event, 404);
        assert_eq!(event.shower_num, 12);
        assert_eq!(event.xcore, 150.0);
        assert_eq!(event.ycore, -30.0);
    }

    #[test]
    fn pe_sum_skips_empty_telescopes() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1i32.to_le_bytes()); // shower_num
        buf.extend_from_slice(&2i32.to_le_bytes()); // num_tel
        for n_pe in [0i32, 3] {
            buf.extend_from_slice(&n_pe.to_le_bytes());
        }
        for n_pix in [0i32, 2] {
            buf.extend_from_slice(&n_pix.to_le_bytes());
        }

        // Only the second telescope carries a pixel list.
        buf.extend_from_slice(&2i16.to_le_bytes());
        for pixel in [4i16, 7] {
            buf.extend_from_slice(&pixel.to_le_bytes());
        }
        for pe in [1i32, 2] {
            buf.extend_from_slice(&pe.to_le_bytes());
        }

        for _ in 0..5 {
            for value in [10.0f32, 20.0] {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }

        let hdr = header(2026, 2, 9, buf.len() as u64);
        let pe_sum = McPeSum::parse(&mut BufReader::new(&buf), &hdr).unwrap();

        assert_eq!(pe_sum.pix_pe.len(), 1);
        assert_eq!(&pe_sum.pix_pe[0].pixel_id[..], &[4, 7]);
        assert_eq!(&pe_sum.pix_pe[0].pe[..], &[1, 2]);
        assert_eq!(&pe_sum.photons_atm_400[..], &[10.0, 20.0]);
    }
}
