// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event-level objects: the central trigger record, tracking and telescope events, the telescope
//! event header, ADC samples, image parameters, reconstructed showers, and pixel lists.

use bitflags::bitflags;

use eventio_core::codec::{
    decode_diff_u16, read_array, read_scount, read_scount_len, read_time, Time,
};
use eventio_core::errors::{
    corrupt_error, oversized_array_error, unsupported_combination_error, Error, Result,
};
use eventio_core::header::ObjectHeader;
use eventio_core::io::{FiniteStream, ReadBytes};

use crate::records::{checked_len, require_version, require_version_max, AdcSamples};
use crate::types::{id_to_telescope, type_to_telescope, TEL_EVENT_BASE, TRACK_EVENT_BASE};

/// Telescope lists of a central trigger record, present from version 1.
#[derive(Clone, Debug, PartialEq)]
pub struct CentralEventTelescopes {
    pub triggered: Box<[i16]>,
    pub trigger_times: Box<[f32]>,
    pub with_data: Box<[i16]>,
}

/// Per-telescope trigger-type information of a central trigger record, present from version 2.
#[derive(Clone, Debug, PartialEq)]
pub struct CentralEventTriggerTypes {
    /// One trigger-type bit mask per triggered telescope; only the low three bits are used.
    pub mask: Box<[u8]>,
    /// Per-trigger-type times, indexed by trigger bit, for every telescope whose mask has more
    /// than one bit set.
    pub times_by_type: Vec<(i16, [Option<f32>; 3])>,
}

/// Central trigger record, type 2009, versions 0 through 2.
#[derive(Clone, Debug, PartialEq)]
pub struct CentralEvent {
    pub global_count: u32,
    pub cpu_time: Time,
    pub gps_time: Time,
    pub trigger_pattern: i32,
    pub data_pattern: i32,
    pub telescopes: Option<CentralEventTelescopes>,
    pub trigger_types: Option<CentralEventTriggerTypes>,
}

impl CentralEvent {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<CentralEvent>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version_max(header, "CentralEvent", 2)?;

        let cpu_time = read_time(reader)?;
        let gps_time = read_time(reader)?;
        let trigger_pattern = reader.read_i32()?;
        let data_pattern = reader.read_i32()?;

        let mut telescopes = None;
        let mut trigger_types = None;

        if header.version >= 1 {
            let tels_trigger = reader.read_i16()?;
            let n_trigger = checked_len(i32::from(tels_trigger), "triggered telescope count")?;

            let triggered = read_array::<i16, B>(reader, n_trigger, "triggered telescopes")?;
            let trigger_times = read_array::<f32, B>(reader, n_trigger, "trigger times")?;

            let tels_data = reader.read_i16()?;
            let n_data = checked_len(i32::from(tels_data), "telescopes-with-data count")?;
            let with_data = read_array::<i16, B>(reader, n_data, "telescopes with data")?;

            if header.version >= 2 {
                let mask = read_array::<u8, B>(reader, n_trigger, "trigger type masks")?;

                if mask.iter().any(|m| *m >= 128) {
                    return corrupt_error("trigger type mask out of range");
                }

                // Per-type trigger times are only written for telescopes with more than one
                // trigger type set.
                let mut times_by_type = Vec::new();

                for (tel_id, tel_mask) in triggered.iter().zip(mask.iter()) {
                    if matches!(*tel_mask, 0b001 | 0b010 | 0b100) {
                        continue;
                    }

                    let mut times = [None; 3];
                    for (bit, slot) in times.iter_mut().enumerate() {
                        if tel_mask & (1 << bit) != 0 {
                            *slot = Some(reader.read_f32()?);
                        }
                    }

                    times_by_type.push((*tel_id, times));
                }

                trigger_types = Some(CentralEventTriggerTypes { mask, times_by_type });
            }

            telescopes = Some(CentralEventTelescopes { triggered, trigger_times, with_data });
        }

        Ok(CentralEvent {
            global_count: header.id,
            cpu_time,
            gps_time,
            trigger_pattern,
            data_pattern,
            telescopes,
            trigger_types,
        })
    }
}

/// Tracking positions of one telescope for one event; the telescope ID is encoded in the type
/// code (family 2100+).
///
/// The same telescope ID is packed into the object ID word together with the presence flags for
/// the raw and corrected position pairs; the two derivations must agree.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackEvent {
    pub telescope_id: u16,
    pub azimuth_raw: Option<f32>,
    pub altitude_raw: Option<f32>,
    pub azimuth_cor: Option<f32>,
    pub altitude_cor: Option<f32>,
}

impl TrackEvent {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<TrackEvent>
    where
        B: ReadBytes + FiniteStream,
    {
        let from_type = match type_to_telescope(header.type_code, TRACK_EVENT_BASE) {
            Some(telescope_id) => telescope_id,
            None => return Err(Error::UnknownType(header.type_code)),
        };

        let from_id = id_to_telescope(header.id);

        if from_type != from_id {
            return Err(Error::TelescopeIdMismatch { from_type, from_id });
        }

        let has_raw = header.id & 0x100 != 0;
        let has_cor = header.id & 0x200 != 0;

        let mut track = TrackEvent {
            telescope_id: from_type,
            azimuth_raw: None,
            altitude_raw: None,
            azimuth_cor: None,
            altitude_cor: None,
        };

        if has_raw {
            track.azimuth_raw = Some(reader.read_f32()?);
            track.altitude_raw = Some(reader.read_f32()?);
        }

        if has_cor {
            track.azimuth_cor = Some(reader.read_f32()?);
            track.altitude_cor = Some(reader.read_f32()?);
        }

        Ok(track)
    }
}

/// A telescope event container; the telescope ID is encoded in the type code (family 2200+).
///
/// The payload consists solely of child objects (event header, ADC data, images, ...) reached
/// through the walker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelEvent {
    pub telescope_id: u16,
    pub global_count: u32,
}

impl TelEvent {
    pub fn parse(header: &ObjectHeader) -> Result<TelEvent> {
        match type_to_telescope(header.type_code, TEL_EVENT_BASE) {
            Some(telescope_id) => Ok(TelEvent { telescope_id, global_count: header.id }),
            None => Err(Error::UnknownType(header.type_code)),
        }
    }
}

bitflags! {
    /// Presence flags in the telescope event header's trigger word.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct TriggerFlags: u16 {
        const TRIGGER_SECTORS = 0x100;
        const PHYS_ADDRS      = 0x200;
        const SECTOR_TIMES    = 0x400;
    }
}

/// The list of trigger sectors that fired, with their times when recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerSectors {
    pub sectors: Box<[i32]>,
    pub times: Option<Box<[f32]>>,
}

/// Telescope event header, type 2011, versions 0 through 2.
#[derive(Clone, Debug, PartialEq)]
pub struct TelEventHeader {
    pub telescope_id: u32,
    pub loc_count: i32,
    pub glob_count: i32,
    pub cpu_time: Time,
    pub gps_time: Time,
    pub trg_source: u8,
    pub trigger_sectors: Option<TriggerSectors>,
    pub phys_addrs: Option<Box<[i32]>>,
}

impl TelEventHeader {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<TelEventHeader>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version_max(header, "TelEventHeader", 2)?;

        let loc_count = reader.read_i32()?;
        let glob_count = reader.read_i32()?;
        let cpu_time = read_time(reader)?;
        let gps_time = read_time(reader)?;

        let trigger_word = reader.read_i16()? as u16;
        let trg_source = (trigger_word & 0xff) as u8;
        let flags = TriggerFlags::from_bits_truncate(trigger_word);

        let mut trigger_sectors = None;
        let mut phys_addrs = None;

        if flags.contains(TriggerFlags::TRIGGER_SECTORS) {
            let sectors = Self::read_list(reader, header.version, "trigger sectors")?;

            let times = if header.version >= 1 && flags.contains(TriggerFlags::SECTOR_TIMES) {
                Some(read_array::<f32, B>(reader, sectors.len(), "trigger sector times")?)
            }
            else {
                None
            };

            trigger_sectors = Some(TriggerSectors { sectors, times });
        }

        if flags.contains(TriggerFlags::PHYS_ADDRS) {
            phys_addrs = Some(Self::read_list(reader, header.version, "physical addresses")?);
        }

        Ok(TelEventHeader {
            telescope_id: header.id,
            loc_count,
            glob_count,
            cpu_time,
            gps_time,
            trg_source,
            trigger_sectors,
            phys_addrs,
        })
    }

    /// Reads a length-prefixed integer list: 16-bit length and elements up to version 1, scount
    /// length and elements from version 2.
    fn read_list<B>(reader: &mut B, version: u32, what: &'static str) -> Result<Box<[i32]>>
    where
        B: ReadBytes + FiniteStream,
    {
        if version <= 1 {
            let count = reader.read_i16()?;
            let len = checked_len(i32::from(count), what)?;
            let shorts = read_array::<i16, B>(reader, len, what)?;

            Ok(shorts.iter().map(|v| i32::from(*v)).collect())
        }
        else {
            let len = read_scount_len(reader)?;

            let mut out = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                let value = read_scount(reader)?;
                match i32::try_from(value) {
                    Ok(value) => out.push(value),
                    Err(_) => return corrupt_error(what),
                }
            }

            Ok(out.into_boxed_slice())
        }
    }
}

/// ADC samples of one telescope event, type 2013, version 3.
///
/// The object ID is a packed flag word: the zero-suppression mode, the data-reduction mode, a
/// pixel-list marker, and the telescope ID.
#[derive(Clone, Debug, PartialEq)]
pub struct TelAdcSamp {
    pub telescope_id: u16,
    pub zero_sup_mode: u8,
    pub num_pixels: i32,
    pub num_gains: i16,
    pub num_samples: i16,
    /// The zero-suppression pixel ranges, inclusive of both endpoints, when zero suppression is
    /// active.
    pub pixel_ranges: Option<Vec<(i64, i64)>>,
    pub samples: AdcSamples,
}

impl TelAdcSamp {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<TelAdcSamp>
    where
        B: ReadBytes + FiniteStream,
    {
        let flags = header.id;
        let zero_sup_mode = (flags & 0x1f) as u8;
        let data_red_mode = ((flags >> 5) & 0x1f) as u8;
        let list_known = (flags >> 10) & 0x01 != 0;

        if zero_sup_mode != 0 && header.version < 3 {
            return unsupported_combination_error("zero suppression before version 3");
        }
        if data_red_mode != 0 {
            return unsupported_combination_error("data reduction");
        }
        if list_known {
            return unsupported_combination_error("pixel lists");
        }

        require_version(header, "TelAdcSamp", 3)?;

        let telescope_id = ((flags >> 12) & 0xffff) as u16;

        let num_pixels = reader.read_i32()?;
        let num_gains = reader.read_i16()?;
        let num_samples = reader.read_i16()?;

        let pixels = checked_len(num_pixels, "ADC pixel count")?;
        let gains = checked_len(i32::from(num_gains), "ADC gain count")?;
        let samples_per_trace = checked_len(i32::from(num_samples), "ADC sample count")?;

        let pixel_ranges = if zero_sup_mode != 0 {
            let list_size = read_scount_len(reader)?;

            let mut ranges = Vec::with_capacity(list_size.min(4096));
            for _ in 0..list_size {
                let start = read_scount(reader)?;

                if start < 0 {
                    ranges.push((-start - 1, -start - 1));
                }
                else {
                    ranges.push((start, read_scount(reader)?));
                }
            }

            Some(ranges)
        }
        else {
            None
        };

        // Each sample occupies at least one byte in the stream, which bounds the amount of data
        // a well-formed payload can promise.
        let traces: u64 = match &pixel_ranges {
            Some(ranges) => {
                let mut traces = 0u64;
                for (start, end) in ranges {
                    if *start < 0 || *end < *start || *end >= i64::from(num_pixels) {
                        return corrupt_error("zero suppression range out of bounds");
                    }
                    traces += (end - start + 1) as u64;
                }
                traces * gains as u64
            }
            None => (pixels * gains) as u64,
        };

        if traces * samples_per_trace as u64 > reader.bytes_available() {
            return oversized_array_error("ADC samples");
        }

        let mut samples = AdcSamples::zeroed(gains, pixels, samples_per_trace);

        // The sample data is the remainder of the payload; reading it in one block lets the
        // differential decoder run over a contiguous buffer.
        let block = reader.read_boxed_slice_exact(reader.bytes_available() as usize)?;
        let mut offset = 0usize;

        for gain in 0..gains {
            match &pixel_ranges {
                Some(ranges) => {
                    for (start, end) in ranges {
                        for pixel in *start..=*end {
                            offset += decode_diff_u16(
                                &block[offset..],
                                samples.trace_mut(gain, pixel as usize),
                            )?;
                        }
                    }
                }
                None => {
                    for pixel in 0..pixels {
                        offset +=
                            decode_diff_u16(&block[offset..], samples.trace_mut(gain, pixel))?;
                    }
                }
            }
        }

        Ok(TelAdcSamp {
            telescope_id,
            zero_sup_mode,
            num_pixels,
            num_gains,
            num_samples,
            pixel_ranges,
            samples,
        })
    }
}

bitflags! {
    /// Presence flags of the optional image parameter groups, taken from the object ID word.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ImageFlags: u32 {
        const ERRORS     = 0x100;
        const SHAPE      = 0x200;
        const HOT_PIXELS = 0x400;
        const TIMING     = 0x800;
    }
}

/// Uncertainties of the first-moment image parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImageErrors {
    pub x_err: f32,
    pub y_err: f32,
    pub phi_err: f32,
    pub length_err: f32,
    pub width_err: f32,
}

/// Third- and fourth-moment image parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImageShape {
    pub skewness: f32,
    pub skewness_err: f32,
    pub kurtosis: f32,
    pub kurtosis_err: f32,
}

/// The brightest pixels of an image.
#[derive(Clone, Debug, PartialEq)]
pub struct HotPixels {
    pub amplitude: Box<[f32]>,
    pub pixel: Box<[i16]>,
}

/// Image timing parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImageTiming {
    pub slope: f32,
    pub residual: f32,
    pub width1: f32,
    pub width2: f32,
    pub rise: f32,
}

/// Image parameters of one telescope, type 2014, version 5.
#[derive(Clone, Debug, PartialEq)]
pub struct TelImage {
    pub telescope_id: u16,
    pub cut_id: u8,
    pub flags: u32,
    pub pixels: i16,
    pub num_sat: i16,
    /// Clipping amplitude, present when any pixel saturated.
    pub clip_amp: Option<f32>,
    pub amplitude: f32,
    pub x: f32,
    pub y: f32,
    pub phi: f32,
    pub length: f32,
    pub width: f32,
    pub num_conc: i16,
    pub concentration: f32,
    pub errors: Option<ImageErrors>,
    pub shape: Option<ImageShape>,
    pub hot: Option<HotPixels>,
    pub timing: Option<ImageTiming>,
}

impl TelImage {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<TelImage>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "TelImage", 5)?;

        let flags = header.id;
        let telescope_id = id_to_telescope(flags);
        let cut_id = ((flags & 0xff000) >> 12) as u8;
        let groups = ImageFlags::from_bits_truncate(flags);

        let pixels = reader.read_i16()?;
        let num_sat = reader.read_i16()?;

        let clip_amp = if num_sat > 0 { Some(reader.read_f32()?) } else { None };

        let amplitude = reader.read_f32()?;
        let x = reader.read_f32()?;
        let y = reader.read_f32()?;
        let phi = reader.read_f32()?;
        let length = reader.read_f32()?;
        let width = reader.read_f32()?;
        let num_conc = reader.read_i16()?;
        let concentration = reader.read_f32()?;

        let errors = if groups.contains(ImageFlags::ERRORS) {
            Some(ImageErrors {
                x_err: reader.read_f32()?,
                y_err: reader.read_f32()?,
                phi_err: reader.read_f32()?,
                length_err: reader.read_f32()?,
                width_err: reader.read_f32()?,
            })
        }
        else {
            None
        };

        let shape = if groups.contains(ImageFlags::SHAPE) {
            Some(ImageShape {
                skewness: reader.read_f32()?,
                skewness_err: reader.read_f32()?,
                kurtosis: reader.read_f32()?,
                kurtosis_err: reader.read_f32()?,
            })
        }
        else {
            None
        };

        let hot = if groups.contains(ImageFlags::HOT_PIXELS) {
            let num_hot = reader.read_i16()?;
            let n = checked_len(i32::from(num_hot), "hot pixel count")?;

            Some(HotPixels {
                amplitude: read_array::<f32, B>(reader, n, "hot pixel amplitudes")?,
                pixel: read_array::<i16, B>(reader, n, "hot pixel ids")?,
            })
        }
        else {
            None
        };

        let timing = if groups.contains(ImageFlags::TIMING) {
            Some(ImageTiming {
                slope: reader.read_f32()?,
                residual: reader.read_f32()?,
                width1: reader.read_f32()?,
                width2: reader.read_f32()?,
                rise: reader.read_f32()?,
            })
        }
        else {
            None
        };

        Ok(TelImage {
            telescope_id,
            cut_id,
            flags,
            pixels,
            num_sat,
            clip_amp,
            amplitude,
            x,
            y,
            phi,
            length,
            width,
            num_conc,
            concentration,
            errors,
            shape,
            hot,
            timing,
        })
    }
}

bitflags! {
    /// Result bits of a reconstructed shower, taken from the object ID word.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ShowerResults: u32 {
        const DIRECTION        = 0x001;
        const DIRECTION_ERROR  = 0x002;
        const CORE             = 0x004;
        const CORE_ERROR       = 0x008;
        const MEAN_SCALED      = 0x010;
        const MEAN_SCALED_ERROR = 0x020;
        const ENERGY           = 0x040;
        const ENERGY_ERROR     = 0x080;
        const XMAX             = 0x100;
        const XMAX_ERROR       = 0x200;
    }
}

/// Reconstructed shower parameters, type 2015, version 1.
#[derive(Clone, Debug, PartialEq)]
pub struct Shower {
    pub result_bits: u32,
    pub num_trg: i16,
    pub num_read: i16,
    pub num_img: i16,
    pub img_pattern: i32,
    /// Azimuth and altitude.
    pub direction: Option<[f32; 2]>,
    pub err_dir: Option<[f32; 3]>,
    /// Core position `(x, y)`.
    pub core: Option<[f32; 2]>,
    pub err_core: Option<[f32; 3]>,
    /// Mean scaled length and width.
    pub mean_scaled: Option<[f32; 2]>,
    pub err_mean_scaled: Option<[f32; 2]>,
    pub energy: Option<f32>,
    pub err_energy: Option<f32>,
    pub xmax: Option<f32>,
    pub err_xmax: Option<f32>,
}

impl Shower {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<Shower>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "Shower", 1)?;

        let result_bits = header.id;
        let results = ShowerResults::from_bits_truncate(result_bits);

        let num_trg = reader.read_i16()?;
        let num_read = reader.read_i16()?;
        let num_img = reader.read_i16()?;
        let img_pattern = reader.read_i32()?;

        let mut shower = Shower {
            result_bits,
            num_trg,
            num_read,
            num_img,
            img_pattern,
            direction: None,
            err_dir: None,
            core: None,
            err_core: None,
            mean_scaled: None,
            err_mean_scaled: None,
            energy: None,
            err_energy: None,
            xmax: None,
            err_xmax: None,
        };

        if results.contains(ShowerResults::DIRECTION) {
            shower.direction = Some([reader.read_f32()?, reader.read_f32()?]);
        }
        if results.contains(ShowerResults::DIRECTION_ERROR) {
            shower.err_dir = Some([reader.read_f32()?, reader.read_f32()?, reader.read_f32()?]);
        }
        if results.contains(ShowerResults::CORE) {
            shower.core = Some([reader.read_f32()?, reader.read_f32()?]);
        }
        if results.contains(ShowerResults::CORE_ERROR) {
            shower.err_core = Some([reader.read_f32()?, reader.read_f32()?, reader.read_f32()?]);
        }
        if results.contains(ShowerResults::MEAN_SCALED) {
            shower.mean_scaled = Some([reader.read_f32()?, reader.read_f32()?]);
        }
        if results.contains(ShowerResults::MEAN_SCALED_ERROR) {
            shower.err_mean_scaled = Some([reader.read_f32()?, reader.read_f32()?]);
        }
        if results.contains(ShowerResults::ENERGY) {
            shower.energy = Some(reader.read_f32()?);
        }
        if results.contains(ShowerResults::ENERGY_ERROR) {
            shower.err_energy = Some(reader.read_f32()?);
        }
        if results.contains(ShowerResults::XMAX) {
            shower.xmax = Some(reader.read_f32()?);
        }
        if results.contains(ShowerResults::XMAX_ERROR) {
            shower.err_xmax = Some(reader.read_f32()?);
        }

        Ok(shower)
    }
}

/// A pixel list, type 2027, version 0. The list kind and the telescope are packed into the
/// object ID.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelList {
    pub code: u32,
    pub telescope: u32,
    pub pixel_list: Box<[i16]>,
}

impl PixelList {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<PixelList>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "PixelList", 0)?;

        let code = header.id / 1_000_000;
        let telescope = header.id % 1_000_000;

        let pixels = reader.read_i16()?;
        let n = checked_len(i32::from(pixels), "pixel list length")?;
        let pixel_list = read_array::<i16, B>(reader, n, "pixel list")?;

        Ok(PixelList { code, telescope, pixel_list })
    }
}
