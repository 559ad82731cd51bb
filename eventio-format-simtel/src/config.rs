// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run- and camera-level configuration objects: types 2000 through 2008.

use eventio_core::codec::{read_array, read_scount, read_string};
use eventio_core::errors::Result;
use eventio_core::header::ObjectHeader;
use eventio_core::io::{FiniteStream, ReadBytes};

use crate::records::{
    checked_len, checked_len64, read_f32_pair, read_matrix, require_version, Matrix,
};

/// Run header, type 2000.
///
/// Two fixed-layout parts, the second sized by the telescope count of the first, followed by the
/// target and observer strings.
#[derive(Clone, Debug, PartialEq)]
pub struct RunHeader {
    pub run: i32,
    pub time: i32,
    pub run_type: i32,
    pub tracking_mode: i32,
    pub reverse_flag: i32,
    pub direction: [f32; 2],
    pub offset_fov: [f32; 2],
    pub conv_depth: f32,
    pub conv_ref_pos: [f32; 2],
    pub n_telescopes: i32,
    pub tel_id: Box<[i16]>,
    /// Telescope positions, one row of `(x, y, z)` per telescope.
    pub tel_pos: Matrix<f32>,
    pub min_tel_trig: i32,
    pub duration: i32,
    pub target: Vec<u8>,
    pub observer: Vec<u8>,
}

impl RunHeader {
    pub fn parse<B>(reader: &mut B, _header: &ObjectHeader) -> Result<RunHeader>
    where
        B: ReadBytes + FiniteStream,
    {
        let run = reader.read_i32()?;
        let time = reader.read_i32()?;
        let run_type = reader.read_i32()?;
        let tracking_mode = reader.read_i32()?;
        let reverse_flag = reader.read_i32()?;
        let direction = read_f32_pair(reader)?;
        let offset_fov = read_f32_pair(reader)?;
        let conv_depth = reader.read_f32()?;
        let conv_ref_pos = read_f32_pair(reader)?;
        let n_telescopes = reader.read_i32()?;

        let n = checked_len(n_telescopes, "run header telescope count")?;
        let tel_id = read_array::<i16, B>(reader, n, "run header telescope ids")?;
        let tel_pos = read_matrix::<f32, B>(reader, n, 3, "run header telescope positions")?;
        let min_tel_trig = reader.read_i32()?;
        let duration = reader.read_i32()?;

        let target = read_string(reader)?;
        let observer = read_string(reader)?;

        Ok(RunHeader {
            run,
            time,
            run_type,
            tracking_mode,
            reverse_flag,
            direction,
            offset_fov,
            conv_depth,
            conv_ref_pos,
            n_telescopes,
            tel_id,
            tel_pos,
            min_tel_trig,
            duration,
            target,
            observer,
        })
    }
}

/// Monte-Carlo run header, type 2001, version 4.
#[derive(Clone, Debug, PartialEq)]
pub struct McRunHeader {
    pub shower_prog_id: i32,
    pub shower_prog_vers: i32,
    pub shower_prog_start: i32,
    pub detector_prog_id: i32,
    pub detector_prog_vers: i32,
    pub detector_prog_start: i32,
    pub obsheight: f32,
    pub num_showers: i32,
    pub num_use: i32,
    pub core_pos_mode: i32,
    pub core_range: [f32; 2],
    pub alt_range: [f32; 2],
    pub az_range: [f32; 2],
    pub diffuse: i32,
    pub viewcone: [f32; 2],
    pub e_range: [f32; 2],
    pub spectral_index: f32,
    pub b_total: f32,
    pub b_inclination: f32,
    pub b_declination: f32,
    pub injection_height: f32,
    pub atmosphere: i32,
    pub corsika_iact_options: i32,
    pub corsika_low_e_model: i32,
    pub corsika_high_e_model: i32,
    pub corsika_bunchsize: f32,
    pub corsika_wlen_min: f32,
    pub corsika_wlen_max: f32,
    pub corsika_low_e_detail: i32,
    pub corsika_high_e_detail: i32,
}

impl McRunHeader {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<McRunHeader>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "McRunHeader", 4)?;

        Ok(McRunHeader {
            shower_prog_id: reader.read_i32()?,
            shower_prog_vers: reader.read_i32()?,
            shower_prog_start: reader.read_i32()?,
            detector_prog_id: reader.read_i32()?,
            detector_prog_vers: reader.read_i32()?,
            detector_prog_start: reader.read_i32()?,
            obsheight: reader.read_f32()?,
            num_showers: reader.read_i32()?,
            num_use: reader.read_i32()?,
            core_pos_mode: reader.read_i32()?,
            core_range: read_f32_pair(reader)?,
            alt_range: read_f32_pair(reader)?,
            az_range: read_f32_pair(reader)?,
            diffuse: reader.read_i32()?,
            viewcone: read_f32_pair(reader)?,
            e_range: read_f32_pair(reader)?,
            spectral_index: reader.read_f32()?,
            b_total: reader.read_f32()?,
            b_inclination: reader.read_f32()?,
            b_declination: reader.read_f32()?,
            injection_height: reader.read_f32()?,
            atmosphere: reader.read_i32()?,
            corsika_iact_options: reader.read_i32()?,
            corsika_low_e_model: reader.read_i32()?,
            corsika_high_e_model: reader.read_i32()?,
            corsika_bunchsize: reader.read_f32()?,
            corsika_wlen_min: reader.read_f32()?,
            corsika_wlen_max: reader.read_f32()?,
            corsika_low_e_detail: reader.read_i32()?,
            corsika_high_e_detail: reader.read_i32()?,
        })
    }
}

/// Camera geometry, type 2002.
#[derive(Clone, Debug, PartialEq)]
pub struct CamSettings {
    pub telescope_id: u32,
    pub n_pixels: i32,
    pub focal_length: f32,
    pub pixel_x: Box<[f32]>,
    pub pixel_y: Box<[f32]>,
}

impl CamSettings {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<CamSettings>
    where
        B: ReadBytes + FiniteStream,
    {
        let n_pixels = reader.read_i32()?;
        let focal_length = reader.read_f32()?;

        let n = checked_len(n_pixels, "camera pixel count")?;
        let pixel_x = read_array::<f32, B>(reader, n, "camera pixel x positions")?;
        let pixel_y = read_array::<f32, B>(reader, n, "camera pixel y positions")?;

        Ok(CamSettings { telescope_id: header.id, n_pixels, focal_length, pixel_x, pixel_y })
    }
}

/// One camera trigger sector: its type and thresholds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SectorSettings {
    pub sector_type: u8,
    pub threshold: f32,
    pub pixel_threshold: f32,
}

/// Camera organisation, type 2003, version 1.
#[derive(Clone, Debug, PartialEq)]
pub struct CamOrgan {
    pub telescope_id: u32,
    pub num_pixels: i32,
    pub num_drawers: i32,
    pub num_gains: i32,
    pub num_sectors: i32,
    pub drawer: Box<[i16]>,
    /// Readout card per pixel and gain.
    pub card: Matrix<i16>,
    /// Readout chip per pixel and gain.
    pub chip: Matrix<i16>,
    /// Readout channel per pixel and gain.
    pub channel: Matrix<i16>,
    /// Trigger sector membership, one list per pixel.
    pub sectors: Vec<Box<[i16]>>,
    pub sector_settings: Vec<SectorSettings>,
}

impl CamOrgan {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<CamOrgan>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "CamOrgan", 1)?;

        let num_pixels = reader.read_i32()?;
        let num_drawers = reader.read_i32()?;
        let num_gains = reader.read_i32()?;
        let num_sectors = reader.read_i32()?;

        let pixels = checked_len(num_pixels, "camera pixel count")?;
        let gains = checked_len(num_gains, "camera gain count")?;

        let drawer = read_array::<i16, B>(reader, pixels, "pixel drawers")?;
        let card = read_matrix::<i16, B>(reader, pixels, gains, "pixel cards")?;
        let chip = read_matrix::<i16, B>(reader, pixels, gains, "pixel chips")?;
        let channel = read_matrix::<i16, B>(reader, pixels, gains, "pixel channels")?;

        let mut sectors = Vec::with_capacity(pixels);
        for _ in 0..pixels {
            let n = reader.read_i16()?;
            let len = checked_len(i32::from(n), "pixel sector count")?;
            sectors.push(read_array::<i16, B>(reader, len, "pixel sectors")?);
        }

        let sector_count = checked_len(num_sectors, "camera sector count")?;
        let mut sector_settings = Vec::with_capacity(sector_count);
        for _ in 0..sector_count {
            sector_settings.push(SectorSettings {
                sector_type: reader.read_u8()?,
                threshold: reader.read_f32()?,
                pixel_threshold: reader.read_f32()?,
            });
        }

        Ok(CamOrgan {
            telescope_id: header.id,
            num_pixels,
            num_drawers,
            num_gains,
            num_sectors,
            drawer,
            card,
            chip,
            channel,
            sectors,
            sector_settings,
        })
    }
}

/// Pixel settings, type 2004.
///
/// Four dependent fixed-layout parts: the second is sized by the pixel count of the first, the
/// third by the drawer count of the second, and the fourth by the two scount dimensions in
/// between.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelSet {
    pub telescope_id: u32,
    pub setup_id: i32,
    pub trigger_mode: i32,
    pub min_pixel_mult: i32,
    pub num_pixels: i32,
    pub pixel_hv_dac: Box<[i32]>,
    pub num_drawers: i32,
    pub threshold_dac: Box<[i32]>,
    pub adc_start: Box<[i32]>,
    pub adc_count: Box<[i32]>,
    pub nrefshape: i64,
    pub lrefshape: i64,
    pub time_slice: f32,
    pub sum_bins: i32,
    /// Reference pulse shapes, one row per shape.
    pub refshape: Matrix<f32>,
    pub ref_step: f32,
}

impl PixelSet {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<PixelSet>
    where
        B: ReadBytes + FiniteStream,
    {
        let setup_id = reader.read_i32()?;
        let trigger_mode = reader.read_i32()?;
        let min_pixel_mult = reader.read_i32()?;
        let num_pixels = reader.read_i32()?;

        let pixels = checked_len(num_pixels, "pixel count")?;
        let pixel_hv_dac = read_array::<i32, B>(reader, pixels, "pixel HV DAC values")?;
        let num_drawers = reader.read_i32()?;

        let drawers = checked_len(num_drawers, "drawer count")?;
        let threshold_dac = read_array::<i32, B>(reader, drawers, "drawer threshold DACs")?;
        let adc_start = read_array::<i32, B>(reader, drawers, "drawer ADC start values")?;
        let adc_count = read_array::<i32, B>(reader, drawers, "drawer ADC counts")?;

        let nrefshape = read_scount(reader)?;
        let lrefshape = read_scount(reader)?;

        let time_slice = reader.read_f32()?;
        let sum_bins = reader.read_i32()?;

        let shapes = checked_len64(nrefshape, "reference shape count")?;
        let length = checked_len64(lrefshape, "reference shape length")?;
        let refshape = read_matrix::<f32, B>(reader, shapes, length, "reference shapes")?;
        let ref_step = reader.read_f32()?;

        Ok(PixelSet {
            telescope_id: header.id,
            setup_id,
            trigger_mode,
            min_pixel_mult,
            num_pixels,
            pixel_hv_dac,
            num_drawers,
            threshold_dac,
            adc_start,
            adc_count,
            nrefshape,
            lrefshape,
            time_slice,
            sum_bins,
            refshape,
            ref_step,
        })
    }
}

/// Disabled pixels, type 2005, version 0.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelDisable {
    pub telescope_id: u32,
    pub num_trig_disabled: i32,
    pub trigger_disabled: Box<[i32]>,
    pub num_hv_disabled: i32,
    pub hv_disabled: Box<[i32]>,
}

impl PixelDisable {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<PixelDisable>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "PixelDisable", 0)?;

        let num_trig_disabled = reader.read_i32()?;
        let n = checked_len(num_trig_disabled, "trigger-disabled pixel count")?;
        let trigger_disabled = read_array::<i32, B>(reader, n, "trigger-disabled pixels")?;

        let num_hv_disabled = reader.read_i32()?;
        let n = checked_len(num_hv_disabled, "HV-disabled pixel count")?;
        let hv_disabled = read_array::<i32, B>(reader, n, "HV-disabled pixels")?;

        Ok(PixelDisable {
            telescope_id: header.id,
            num_trig_disabled,
            trigger_disabled,
            num_hv_disabled,
            hv_disabled,
        })
    }
}

/// Camera software settings, type 2006, version 0.
#[derive(Clone, Debug, PartialEq)]
pub struct CamSoftSet {
    pub telescope_id: u32,
    pub dyn_trig_mode: i32,
    pub dyn_trig_threshold: i32,
    pub dyn_hv_mode: i32,
    pub dyn_hv_threshold: i32,
    pub data_red_mode: i32,
    pub zero_sup_mode: i32,
    pub zero_sup_num_thr: i32,
    pub zero_sup_thresholds: Box<[i32]>,
    pub unbiased_scale: i32,
    pub dyn_ped_mode: i32,
    pub dyn_ped_events: i32,
    pub dyn_ped_period: i32,
    pub monitor_cur_period: i32,
    pub report_cur_period: i32,
    pub monitor_hv_period: i32,
    pub report_hv_period: i32,
}

impl CamSoftSet {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<CamSoftSet>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "CamSoftSet", 0)?;

        let dyn_trig_mode = reader.read_i32()?;
        let dyn_trig_threshold = reader.read_i32()?;
        let dyn_hv_mode = reader.read_i32()?;
        let dyn_hv_threshold = reader.read_i32()?;
        let data_red_mode = reader.read_i32()?;
        let zero_sup_mode = reader.read_i32()?;
        let zero_sup_num_thr = reader.read_i32()?;

        let n = checked_len(zero_sup_num_thr, "zero suppression threshold count")?;
        let zero_sup_thresholds = read_array::<i32, B>(reader, n, "zero suppression thresholds")?;

        Ok(CamSoftSet {
            telescope_id: header.id,
            dyn_trig_mode,
            dyn_trig_threshold,
            dyn_hv_mode,
            dyn_hv_threshold,
            data_red_mode,
            zero_sup_mode,
            zero_sup_num_thr,
            zero_sup_thresholds,
            unbiased_scale: reader.read_i32()?,
            dyn_ped_mode: reader.read_i32()?,
            dyn_ped_events: reader.read_i32()?,
            dyn_ped_period: reader.read_i32()?,
            monitor_cur_period: reader.read_i32()?,
            report_cur_period: reader.read_i32()?,
            monitor_hv_period: reader.read_i32()?,
            report_hv_period: reader.read_i32()?,
        })
    }
}

/// Pointing correction, type 2007, version 0.
#[derive(Clone, Debug, PartialEq)]
pub struct PointingCor {
    pub telescope_id: u32,
    pub function_type: i32,
    pub num_param: i32,
    pub pointing_param: Box<[f32]>,
}

impl PointingCor {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<PointingCor>
    where
        B: ReadBytes + FiniteStream,
    {
        require_version(header, "PointingCor", 0)?;

        let function_type = reader.read_i32()?;
        let num_param = reader.read_i32()?;

        let n = checked_len(num_param, "pointing parameter count")?;
        let pointing_param = read_array::<f32, B>(reader, n, "pointing parameters")?;

        Ok(PointingCor { telescope_id: header.id, function_type, num_param, pointing_param })
    }
}

/// Tracking settings, type 2008.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackSet {
    pub telescope_id: u32,
    pub drive_type_az: i16,
    pub drive_type_alt: i16,
    pub zeropoint_az: f32,
    pub zeropoint_alt: f32,
    pub sign_az: f32,
    pub sign_alt: f32,
    pub resolution_az: f32,
    pub resolution_alt: f32,
    pub range_low_az: f32,
    pub range_low_alt: f32,
    pub range_high_az: f32,
    pub range_high_alt: f32,
    pub park_pos_az: f32,
    pub park_pos_alt: f32,
}

impl TrackSet {
    pub fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<TrackSet>
    where
        B: ReadBytes + FiniteStream,
    {
        Ok(TrackSet {
            telescope_id: header.id,
            drive_type_az: reader.read_i16()?,
            drive_type_alt: reader.read_i16()?,
            zeropoint_az: reader.read_f32()?,
            zeropoint_alt: reader.read_f32()?,
            sign_az: reader.read_f32()?,
            sign_alt: reader.read_f32()?,
            resolution_az: reader.read_f32()?,
            resolution_alt: reader.read_f32()?,
            range_low_az: reader.read_f32()?,
            range_low_alt: reader.read_f32()?,
            range_high_az: reader.read_f32()?,
            range_high_alt: reader.read_f32()?,
            park_pos_az: reader.read_f32()?,
            park_pos_alt: reader.read_f32()?,
        })
    }
}
