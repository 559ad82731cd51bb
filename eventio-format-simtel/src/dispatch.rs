// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `dispatch` module selects a payload parser for an object header and runs it.

use log::debug;

use eventio_core::errors::{Error, Result};
use eventio_core::header::ObjectHeader;
use eventio_core::io::{FiniteStream, ReadBytes};

use crate::config::{
    CamOrgan, CamSettings, CamSoftSet, McRunHeader, PixelDisable, PixelSet, PointingCor,
    RunHeader, TrackSet,
};
use crate::event::{
    CentralEvent, PixelList, Shower, TelAdcSamp, TelEvent, TelEventHeader, TelImage, TrackEvent,
};
use crate::history::HistoryEntry;
use crate::mc::{McEvent, McPeSum};
use crate::moni::{LasCal, TelMoni};
use crate::types::ObjectType;

/// An object without a payload parser: its header and its raw payload bytes.
///
/// Opaque objects keep the framing layer open-ended; a higher layer can bring its own parser
/// without this crate changing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpaqueObject {
    pub header: ObjectHeader,
    pub data: Box<[u8]>,
}

impl OpaqueObject {
    fn parse<B>(reader: &mut B, header: &ObjectHeader) -> Result<OpaqueObject>
    where
        B: ReadBytes + FiniteStream,
    {
        let data = reader.read_boxed_slice_exact(reader.bytes_available() as usize)?;
        Ok(OpaqueObject { header: *header, data })
    }
}

/// A parsed simtel object.
///
/// Container objects (`History`, `Event`, `TelEvent`) carry no payload fields of their own;
/// their children are reached through the walker.
#[derive(Clone, Debug, PartialEq)]
pub enum SimTelObject {
    /// Type 70: a container of history entries.
    History,
    /// Type 71.
    HistoryCommandLine(HistoryEntry),
    /// Type 72.
    HistoryConfig(HistoryEntry),
    /// Type 2000.
    RunHeader(RunHeader),
    /// Type 2001.
    McRunHeader(McRunHeader),
    /// Type 2002.
    CamSettings(CamSettings),
    /// Type 2003.
    CamOrgan(CamOrgan),
    /// Type 2004.
    PixelSet(PixelSet),
    /// Type 2005.
    PixelDisable(PixelDisable),
    /// Type 2006.
    CamSoftSet(CamSoftSet),
    /// Type 2007.
    PointingCor(PointingCor),
    /// Type 2008.
    TrackSet(TrackSet),
    /// Type 2009.
    CentralEvent(CentralEvent),
    /// Types 2100 and up: tracking data with the telescope ID encoded in the type code.
    TrackEvent(TrackEvent),
    /// Types 2200 and up: a container of per-telescope event data.
    TelEvent(TelEvent),
    /// Type 2011.
    TelEventHeader(TelEventHeader),
    /// Type 2013.
    TelAdcSamp(TelAdcSamp),
    /// Type 2014.
    TelImage(TelImage),
    /// Type 2015.
    Shower(Shower),
    /// Type 2021.
    McEvent(McEvent),
    /// Type 2022.
    TelMoni(TelMoni),
    /// Type 2023.
    LasCal(LasCal),
    /// Type 2026.
    McPeSum(McPeSum),
    /// Type 2027.
    PixelList(PixelList),
    /// Any type without a payload parser, surfaced as raw bytes.
    Opaque(OpaqueObject),
}

/// Parses the payload of an object, selecting the parser by type code.
///
/// The reader must be a view over the payload with the cursor at payload offset zero, as handed
/// out by the walker. Types without a parser, including unknown type codes, are surfaced as
/// [`SimTelObject::Opaque`]; use [`parse_object_strict`] to treat unknown codes as errors.
pub fn parse_object<B>(reader: &mut B, header: &ObjectHeader) -> Result<SimTelObject>
where
    B: ReadBytes + FiniteStream,
{
    match ObjectType::of(header.type_code) {
        ObjectType::Unknown(type_code) => {
            debug!("no parser for object type {}, surfacing raw payload", type_code);
            Ok(SimTelObject::Opaque(OpaqueObject::parse(reader, header)?))
        }
        _ => parse_object_strict(reader, header),
    }
}

/// Parses the payload of an object, failing with [`Error::UnknownType`] for type codes outside
/// the simtel family.
pub fn parse_object_strict<B>(reader: &mut B, header: &ObjectHeader) -> Result<SimTelObject>
where
    B: ReadBytes + FiniteStream,
{
    let object = match ObjectType::of(header.type_code) {
        ObjectType::History => SimTelObject::History,
        ObjectType::HistoryCommandLine => {
            SimTelObject::HistoryCommandLine(HistoryEntry::parse(reader)?)
        }
        ObjectType::HistoryConfig => SimTelObject::HistoryConfig(HistoryEntry::parse(reader)?),
        ObjectType::RunHeader => SimTelObject::RunHeader(RunHeader::parse(reader, header)?),
        ObjectType::McRunHeader => SimTelObject::McRunHeader(McRunHeader::parse(reader, header)?),
        ObjectType::CamSettings => SimTelObject::CamSettings(CamSettings::parse(reader, header)?),
        ObjectType::CamOrgan => SimTelObject::CamOrgan(CamOrgan::parse(reader, header)?),
        ObjectType::PixelSet => SimTelObject::PixelSet(PixelSet::parse(reader, header)?),
        ObjectType::PixelDisable => {
            SimTelObject::PixelDisable(PixelDisable::parse(reader, header)?)
        }
        ObjectType::CamSoftSet => SimTelObject::CamSoftSet(CamSoftSet::parse(reader, header)?),
        ObjectType::PointingCor => SimTelObject::PointingCor(PointingCor::parse(reader, header)?),
        ObjectType::TrackSet => SimTelObject::TrackSet(TrackSet::parse(reader, header)?),
        ObjectType::CentralEvent => {
            SimTelObject::CentralEvent(CentralEvent::parse(reader, header)?)
        }
        ObjectType::TrackEvent(_) => SimTelObject::TrackEvent(TrackEvent::parse(reader, header)?),
        ObjectType::TelEvent(_) => SimTelObject::TelEvent(TelEvent::parse(header)?),
        ObjectType::TelEventHeader => {
            SimTelObject::TelEventHeader(TelEventHeader::parse(reader, header)?)
        }
        ObjectType::TelAdcSamp => SimTelObject::TelAdcSamp(TelAdcSamp::parse(reader, header)?),
        ObjectType::TelImage => SimTelObject::TelImage(TelImage::parse(reader, header)?),
        ObjectType::Shower => SimTelObject::Shower(Shower::parse(reader, header)?),
        ObjectType::McEvent => SimTelObject::McEvent(McEvent::parse(reader, header)?),
        ObjectType::TelMoni => SimTelObject::TelMoni(TelMoni::parse(reader, header)?),
        ObjectType::LasCal => SimTelObject::LasCal(LasCal::parse(reader, header)?),
        ObjectType::McPeSum => SimTelObject::McPeSum(McPeSum::parse(reader, header)?),
        ObjectType::PixelList => SimTelObject::PixelList(PixelList::parse(reader, header)?),
        // Known types whose payloads this crate does not interpret.
        ObjectType::Event
        | ObjectType::TelAdcSum
        | ObjectType::PixelTiming
        | ObjectType::PixelCalib
        | ObjectType::McShower
        | ObjectType::RunStat
        | ObjectType::McRunStat
        | ObjectType::CalibEvent => SimTelObject::Opaque(OpaqueObject::parse(reader, header)?),
        ObjectType::Unknown(type_code) => return Err(Error::UnknownType(type_code)),
    };

    Ok(object)
}

#[cfg(test)]
mod tests {
    use eventio_core::errors::Error;
    use eventio_core::header::ObjectHeader;
    use eventio_core::io::{BufReader, ScopedStream};

    use super::{parse_object, parse_object_strict, SimTelObject};

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
    fn unknown_types_surface_raw_payloads() {
        let payload = [1u8, 2, 3];
        let hdr = header(1234, 0, 0, payload.len() as u64);

        let mut reader = ScopedStream::new(BufReader::new(&payload), payload.len() as u64);
        match parse_object(&mut reader, &hdr).unwrap() {
            SimTelObject::Opaque(opaque) => {
                assert_eq!(opaque.header.type_code, 1234);
                assert_eq!(opaque.data.as_ref(), &payload);
            }
            other => panic!("expected an opaque object, got {:?}", other),
        }

        let mut reader = ScopedStream::new(BufReader::new(&payload), payload.len() as u64);
        assert!(matches!(
            parse_object_strict(&mut reader, &hdr),
            Err(Error::UnknownType(1234))
        ));
    }

    #[test]
    fn known_opaque_types_are_surfaced_in_strict_mode() {
        let payload = [9u8; 4];
        let hdr = header(2012, 0, 1, payload.len() as u64);

        let mut reader = ScopedStream::new(BufReader::new(&payload), payload.len() as u64);
        assert!(matches!(
            parse_object_strict(&mut reader, &hdr).unwrap(),
            SimTelObject::Opaque(_)
        ));
    }

    #[test]
    fn telescope_ranges_dispatch_to_event_parsers() {
        let hdr = header(2205, 1, 42, 0);

        let mut reader = ScopedStream::new(BufReader::new(&[]), 0);
        match parse_object(&mut reader, &hdr).unwrap() {
            SimTelObject::TelEvent(event) => {
                assert_eq!(event.telescope_id, 5);
                assert_eq!(event.global_count, 42);
            }
            other => panic!("expected a telescope event, got {:?}", other),
        }
    }
}
