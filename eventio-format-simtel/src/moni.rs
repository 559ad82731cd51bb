// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Slow-control objects: the telescope monitoring report and the laser calibration.

use bitflags::bitflags;

use eventio_core::codec::{read_array, read_time, Time};
use eventio_core::errors::Result;
use eventio_core::header::ObjectHeader;
use eventio_core::io::{FiniteStream, ReadBytes};

use crate::records::{checked_len, read_matrix, require_version, Matrix};
use crate::types::id_to_telescope;

bitflags! {
    /// Which monitoring sections changed since the last report. Taken from bits 8..24 of the
    /// object ID word.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct MoniParts: u16 {
        const STATUS        = 0x01;
        const RATES         = 0x02;
        const PEDESTAL_NOISE = 0x04;
        const HV_TEMP       = 0x08;
        const PIXEL_SCALERS = 0x10;
        const HV_THRESHOLDS = 0x20;
        const DAQ_CONFIG    = 0x40;
    }
}

/// Camera status section.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoniStatus {
    pub time: Time,
    pub status_bits: i32,
}

/// Trigger and data rate section.
#[derive(Clone, Debug, PartialEq)]
pub struct MoniRates {
    pub time: Time,
    pub coinc_count: i32,
    pub event_count: i32,
    pub trigger_rate: f32,
    pub sector_rate: Box<[f32]>,
    pub event_rate: f32,
    pub data_rate: f32,
    pub mean_significant: f32,
}

/// Pedestal and noise section, per gain and pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct MoniPedestalNoise {
    pub time: Time,
    pub num_ped_slices: i16,
    pub pedestal: Matrix<f32>,
    pub noise: Matrix<f32>,
}

/// High-voltage and temperature section.
#[derive(Clone, Debug, PartialEq)]
pub struct MoniHvTemp {
    pub time: Time,
    pub num_drawer_temp: i16,
    pub num_camera_temp: i16,
    pub hv_v_mon: Box<[i16]>,
    pub hv_i_mon: Box<[i16]>,
    pub hv_stat: Box<[u8]>,
    pub drawer_temp: Matrix<i16>,
    pub camera_temp: Box<[i16]>,
}

/// Pixel current and scaler section.
#[derive(Clone, Debug, PartialEq)]
pub struct MoniPixelScalers {
    pub time: Time,
    pub current: Box<[u16]>,
    pub scaler: Box<[u16]>,
}

/// High-voltage and threshold DAC settings section.
#[derive(Clone, Debug, PartialEq)]
pub struct MoniHvThresholds {
    pub time: Time,
    pub hv_dac: Box<[u16]>,
    pub thresh_dac: Box<[u16]>,
    pub hv_set: Box<[u8]>,
    pub trig_set: Box<[u8]>,
}

/// Data-acquisition configuration section.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoniDaqConfig {
    pub time: Time,
    pub daq_conf: u16,
    pub daq_scaler_win: u16,
    pub daq_nd: u16,
    pub daq_acc: u16,
    pub daq_nl: u16,
}

/// Telescope monitoring report, type 2022, version 0.
///
/// The sections present are driven by the `what` bits; sections are stored in ascending bit
/// order in the payload.
#[derive(Clone, Debug, PartialEq)]
pub struct TelMoni {
    pub telescope_id: u16,
    pub what: u16,
    pub known: i16,
    pub new_parts: i16,
    pub monitor_id: i32,
    pub moni_time: Time,
    pub num_sectors: i16,
    pub num_pixels: i16,
    pub num_drawers: i16,
    pub num_gains: i16,
    pub status: Option<MoniStatus>,
    pub rates: Option<MoniRates>,
    pub pedestal_noise: Option<MoniPedestalNoise>,
    pub hv_temp: Option<MoniHvTemp>,
    pub pixel_scalers: Option<MoniPixelScalers>,
    pub hv_thresholds: Option<MoniHvThresholds>,
    pub daq_config: Option<MoniDaqConfig>,
}

impl TelMoni {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<TelMoni>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "TelMoni", 0)?;

        let telescope_id = id_to_telescope(header.id);
        let what = (((header.id & 0xffff00) >> 8) & 0xffff) as u16;
        let parts = MoniParts::from_bits_truncate(what);

        let known = reader.read_i16()?;
        let new_parts = reader.read_i16()?;
        let monitor_id = reader.read_i32()?;
        let moni_time = read_time(reader)?;

        let num_sectors = reader.read_i16()?;
        let num_pixels = reader.read_i16()?;
        let num_drawers = reader.read_i16()?;
        let num_gains = reader.read_i16()?;

        let sectors = checked_len(i32::from(num_sectors), "monitoring sector count")?;
        let pixels = checked_len(i32::from(num_pixels), "monitoring pixel count")?;
        let drawers = checked_len(i32::from(num_drawers), "monitoring drawer count")?;
        let gains = checked_len(i32::from(num_gains), "monitoring gain count")?;

        let status = if parts.contains(MoniParts::STATUS) {
            Some(MoniStatus { time: read_time(reader)?, status_bits: reader.read_i32()? })
        }
        else {
            None
        };

        let rates = if parts.contains(MoniParts::RATES) {
            Some(MoniRates {
                time: read_time(reader)?,
                coinc_count: reader.read_i32()?,
                event_count: reader.read_i32()?,
                trigger_rate: reader.read_f32()?,
                sector_rate: read_array::<f32, B>(reader, sectors, "sector rates")?,
                event_rate: reader.read_f32()?,
                data_rate: reader.read_f32()?,
                mean_significant: reader.read_f32()?,
            })
        }
        else {
            None
        };

        let pedestal_noise = if parts.contains(MoniParts::PEDESTAL_NOISE) {
            Some(MoniPedestalNoise {
                time: read_time(reader)?,
                num_ped_slices: reader.read_i16()?,
                pedestal: read_matrix::<f32, B>(reader, gains, pixels, "pedestals")?,
                noise: read_matrix::<f32, B>(reader, gains, pixels, "noise")?,
            })
        }
        else {
            None
        };

        let hv_temp = if parts.contains(MoniParts::HV_TEMP) {
            let time = read_time(reader)?;
            let num_drawer_temp = reader.read_i16()?;
            let num_camera_temp = reader.read_i16()?;

            let drawer_temps = checked_len(i32::from(num_drawer_temp), "drawer temperature count")?;
            let camera_temps = checked_len(i32::from(num_camera_temp), "camera temperature count")?;

            Some(MoniHvTemp {
                time,
                num_drawer_temp,
                num_camera_temp,
                hv_v_mon: read_array::<i16, B>(reader, pixels, "HV voltage monitors")?,
                hv_i_mon: read_array::<i16, B>(reader, pixels, "HV current monitors")?,
                hv_stat: read_array::<u8, B>(reader, pixels, "HV status")?,
                drawer_temp: read_matrix::<i16, B>(
                    reader,
                    drawers,
                    drawer_temps,
                    "drawer temperatures",
                )?,
                camera_temp: read_array::<i16, B>(reader, camera_temps, "camera temperatures")?,
            })
        }
        else {
            None
        };

        let pixel_scalers = if parts.contains(MoniParts::PIXEL_SCALERS) {
            Some(MoniPixelScalers {
                time: read_time(reader)?,
                current: read_array::<u16, B>(reader, pixels, "pixel currents")?,
                scaler: read_array::<u16, B>(reader, pixels, "pixel scalers")?,
            })
        }
        else {
            None
        };

        let hv_thresholds = if parts.contains(MoniParts::HV_THRESHOLDS) {
            Some(MoniHvThresholds {
                time: read_time(reader)?,
                hv_dac: read_array::<u16, B>(reader, pixels, "HV DAC values")?,
                thresh_dac: read_array::<u16, B>(reader, drawers, "threshold DAC values")?,
                hv_set: read_array::<u8, B>(reader, pixels, "HV set flags")?,
                trig_set: read_array::<u8, B>(reader, pixels, "trigger set flags")?,
            })
        }
        else {
            None
        };

        let daq_config = if parts.contains(MoniParts::DAQ_CONFIG) {
            Some(MoniDaqConfig {
                time: read_time(reader)?,
                daq_conf: reader.read_u16()?,
                daq_scaler_win: reader.read_u16()?,
                daq_nd: reader.read_u16()?,
                daq_acc: reader.read_u16()?,
                daq_nl: reader.read_u16()?,
            })
        }
        else {
            None
        };

        Ok(TelMoni {
            telescope_id,
            what,
            known,
            new_parts,
            monitor_id,
            moni_time,
            num_sectors,
            num_pixels,
            num_drawers,
            num_gains,
            status,
            rates,
            pedestal_noise,
            hv_temp,
            pixel_scalers,
            hv_thresholds,
            daq_config,
        })
    }
}

/// Laser calibration, type 2023, version 2.
#[derive(Clone, Debug, PartialEq)]
pub struct LasCal {
    pub telescope_id: u32,
    pub lascal_id: i32,
    /// Calibration factor per gain and pixel.
    pub calib: Matrix<f32>,
    pub max_int_frac: Box<[f32]>,
    pub max_pixtm_frac: Box<[f32]>,
    /// Time calibration per gain and pixel.
    pub tm_calib: Matrix<f32>,
}

impl LasCal {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<LasCal>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "LasCal", 2)?;

        let num_pixels = reader.read_i16()?;
        let num_gains = reader.read_i16()?;
        let lascal_id = reader.read_i32()?;

        let pixels = checked_len(i32::from(num_pixels), "calibration pixel count")?;
        let gains = checked_len(i32::from(num_gains), "calibration gain count")?;

        let calib = read_matrix::<f32, B>(reader, gains, pixels, "calibration factors")?;

        let mut max_int_frac = vec![0.0f32; gains];
        let mut max_pixtm_frac = vec![0.0f32; gains];
        for gain in 0..gains {
            max_int_frac[gain] = reader.read_f32()?;
            max_pixtm_frac[gain] = reader.read_f32()?;
        }

        let tm_calib = read_matrix::<f32, B>(reader, gains, pixels, "time calibration factors")?;

        Ok(LasCal {
            telescope_id: header.id,
            lascal_id,
            calib,
            max_int_frac: max_int_frac.into_boxed_slice(),
            max_pixtm_frac: max_pixtm_frac.into_boxed_slice(),
            tm_calib,
        })
    }
}
