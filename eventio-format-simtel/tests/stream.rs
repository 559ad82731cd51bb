// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests over synthetic streams: framing, lazy walking, container traversal, and
//! payload dispatch working together.

use std::io::Cursor;

use eventio_core::header::SYNC_MARKER;
use eventio_core::io::SourceStream;
use eventio_core::walker::ObjectIterator;
use eventio_format_simtel::{parse_object, SimTelObject};

fn put_object(buf: &mut Vec<u8>, type_code: u32, version: u32, id: u32, payload: &[u8]) {
    put_framed(buf, type_code, version, id, payload, false, true);
}

fn put_child(buf: &mut Vec<u8>, type_code: u32, version: u32, id: u32, payload: &[u8]) {
    put_framed(buf, type_code, version, id, payload, false, false);
}

fn put_framed(
    buf: &mut Vec<u8>,
    type_code: u32,
    version: u32,
    id: u32,
    payload: &[u8],
    only_sub_objects: bool,
    top_level: bool,
) {
    if top_level {
        buf.extend_from_slice(&SYNC_MARKER.to_le_bytes());
    }

    let type_word = type_code | (u32::from(only_sub_objects) << 22) | (version << 23);
    buf.extend_from_slice(&type_word.to_le_bytes());
    buf.extend_from_slice(&id.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
}

fn put_scount(buf: &mut Vec<u8>, value: i64) {
    let mut unsigned = ((value << 1) ^ (value >> 63)) as u64;

    loop {
        let low = (unsigned & 0x7f) as u8;
        unsigned >>= 7;

        if unsigned == 0 {
            buf.push(low);
            return;
        }

        buf.push(low | 0x80);
    }
}

fn stream_over(buf: Vec<u8>) -> ObjectIterator<SourceStream> {
    ObjectIterator::new(SourceStream::new(Box::new(Cursor::new(buf))))
}

#[test]
fn cam_settings_stream_decodes_end_to_end() {
    let mut payload = Vec::new();
    payload.extend_from_slice(&2i32.to_le_bytes());
    payload.extend_from_slice(&5.0f32.to_le_bytes());
    for value in [0.0f32, 1.0, 0.0, 1.0] {
        payload.extend_from_slice(&value.to_le_bytes());
    }

    let mut buf = Vec::new();
    put_object(&mut buf, 2002, 0, 1, &payload);

    let mut it = stream_over(buf);
    let header = it.next_header().unwrap().unwrap();
    assert_eq!(header.type_code, 2002);

    match parse_object(&mut it.payload(), &header).unwrap() {
        SimTelObject::CamSettings(settings) => {
            assert_eq!(settings.telescope_id, 1);
            assert_eq!(settings.n_pixels, 2);
            assert_eq!(settings.focal_length, 5.0);
            assert_eq!(&settings.pixel_x[..], &[0.0, 1.0]);
            assert_eq!(&settings.pixel_y[..], &[0.0, 1.0]);
        }
        other => panic!("expected camera settings, got {:?}", other),
    }

    assert!(it.next_header().unwrap().is_none());
}

#[test]
fn track_event_reads_both_position_pairs() {
    let mut payload = Vec::new();
    for value in [1.0f32, 1.1, 2.0, 2.1] {
        payload.extend_from_slice(&value.to_le_bytes());
    }

    let mut buf = Vec::new();
    put_object(&mut buf, 2101, 0, 0x0000_0301, &payload);

    let mut it = stream_over(buf);
    let header = it.next_header().unwrap().unwrap();

    match parse_object(&mut it.payload(), &header).unwrap() {
        SimTelObject::TrackEvent(track) => {
            assert_eq!(track.telescope_id, 1);
            assert_eq!(track.azimuth_raw, Some(1.0));
            assert_eq!(track.altitude_raw, Some(1.1));
            assert_eq!(track.azimuth_cor, Some(2.0));
            assert_eq!(track.altitude_cor, Some(2.1));
        }
        other => panic!("expected a track event, got {:?}", other),
    }
}

#[test]
fn central_event_v2_assigns_times_to_trigger_bits() {
    let mut payload = Vec::new();
    for word in [0u32; 4] {
        payload.extend_from_slice(&word.to_le_bytes());
    }
    payload.extend_from_slice(&1i32.to_le_bytes());
    payload.extend_from_slice(&1i32.to_le_bytes());
    payload.extend_from_slice(&1i16.to_le_bytes()); // tels_trigger
    payload.extend_from_slice(&9i16.to_le_bytes());
    payload.extend_from_slice(&0.25f32.to_le_bytes());
    payload.extend_from_slice(&0i16.to_le_bytes()); // tels_data
    payload.push(0b011);
    payload.extend_from_slice(&1.5f32.to_le_bytes());
    payload.extend_from_slice(&2.5f32.to_le_bytes());

    let mut buf = Vec::new();
    put_object(&mut buf, 2009, 2, 1, &payload);

    let mut it = stream_over(buf);
    let header = it.next_header().unwrap().unwrap();

    match parse_object(&mut it.payload(), &header).unwrap() {
        SimTelObject::CentralEvent(event) => {
            let types = event.trigger_types.unwrap();
            assert_eq!(types.times_by_type.len(), 1);

            let (tel_id, times) = &types.times_by_type[0];
            assert_eq!(*tel_id, 9);
            assert_eq!(*times, [Some(1.5), Some(2.5), None]);
        }
        other => panic!("expected a central event, got {:?}", other),
    }
}

#[test]
fn telescope_event_children_parse_within_the_container() {
    // Telescope event header child.
    let mut head_payload = Vec::new();
    head_payload.extend_from_slice(&1i32.to_le_bytes());
    head_payload.extend_from_slice(&2i32.to_le_bytes());
    for word in [0u32; 4] {
        head_payload.extend_from_slice(&word.to_le_bytes());
    }
    head_payload.extend_from_slice(&4i16.to_le_bytes()); // trigger word: source only

    // Zero-suppressed ADC samples child: pixels 0..=1 of 4, one gain, three samples each.
    let mut adc_payload = Vec::new();
    adc_payload.extend_from_slice(&4i32.to_le_bytes());
    adc_payload.extend_from_slice(&1i16.to_le_bytes());
    adc_payload.extend_from_slice(&3i16.to_le_bytes());
    put_scount(&mut adc_payload, 1);
    put_scount(&mut adc_payload, 0);
    put_scount(&mut adc_payload, 1);
    for delta in [5i64, 0, -2, 1, 1, 1] {
        put_scount(&mut adc_payload, delta);
    }

    let mut children = Vec::new();
    put_child(&mut children, 2011, 0, 5, &head_payload);
    put_child(&mut children, 2013, 3, 1 | (5 << 12), &adc_payload);

    let mut buf = Vec::new();
    put_framed(&mut buf, 2205, 1, 42, &children, true, true);

    let mut it = stream_over(buf);
    let header = it.next_header().unwrap().unwrap();
    assert!(header.only_sub_objects);

    match parse_object(&mut it.payload(), &header).unwrap() {
        SimTelObject::TelEvent(event) => assert_eq!(event.telescope_id, 5),
        other => panic!("expected a telescope event, got {:?}", other),
    }

    let mut children = it.children();

    let head = children.next_header().unwrap().unwrap();
    match parse_object(&mut children.payload(), &head).unwrap() {
        SimTelObject::TelEventHeader(event_header) => {
            assert_eq!(event_header.trg_source, 4);
            assert!(event_header.trigger_sectors.is_none());
        }
        other => panic!("expected a telescope event header, got {:?}", other),
    }

    let adc = children.next_header().unwrap().unwrap();
    match parse_object(&mut children.payload(), &adc).unwrap() {
        SimTelObject::TelAdcSamp(samples) => {
            assert_eq!(samples.telescope_id, 5);
            assert_eq!(samples.samples.dims(), (1, 4, 3));
            assert_eq!(samples.samples.trace(0, 0), &[5, 5, 3]);
            assert_eq!(samples.samples.trace(0, 1), &[1, 2, 3]);
            assert_eq!(samples.samples.trace(0, 2), &[0, 0, 0]);
        }
        other => panic!("expected ADC samples, got {:?}", other),
    }

    assert!(children.next_header().unwrap().is_none());
    assert!(it.next_header().unwrap().is_none());
}

#[test]
fn history_children_carry_command_lines() {
    let mut entry = Vec::new();
    entry.extend_from_slice(&7i32.to_le_bytes());
    entry.extend_from_slice(&9u16.to_le_bytes());
    entry.extend_from_slice(b"sim_telar");

    let mut children = Vec::new();
    put_child(&mut children, 71, 0, 0, &entry);

    let mut buf = Vec::new();
    put_framed(&mut buf, 70, 0, 0, &children, true, true);

    let mut it = stream_over(buf);
    let header = it.next_header().unwrap().unwrap();

    assert!(matches!(parse_object(&mut it.payload(), &header).unwrap(), SimTelObject::History));

    let mut children = it.children();
    let child = children.next_header().unwrap().unwrap();

    match parse_object(&mut children.payload(), &child).unwrap() {
        SimTelObject::HistoryCommandLine(entry) => {
            assert_eq!(entry.timestamp, 7);
            assert_eq!(entry.text, b"sim_telar");
        }
        other => panic!("expected a command line entry, got {:?}", other),
    }
}

#[test]
fn unparsed_objects_are_skipped_without_reading_payloads() {
    let mut mc_event = Vec::new();
    mc_event.extend_from_slice(&3i32.to_le_bytes());
    mc_event.extend_from_slice(&1.0f32.to_le_bytes());
    mc_event.extend_from_slice(&2.0f32.to_le_bytes());

    let mut buf = Vec::new();
    put_object(&mut buf, 2020, 0, 0, &[0xaa; 512]); // opaque MC shower
    put_object(&mut buf, 2021, 1, 17, &mc_event);

    let mut it = stream_over(buf);

    let first = it.next_header().unwrap().unwrap();
    assert_eq!(first.type_code, 2020);

    // Never touch the first payload; the walker skips it.
    let second = it.next_header().unwrap().unwrap();
    assert_eq!(second.type_code, 2021);

    match parse_object(&mut it.payload(), &second).unwrap() {
        SimTelObject::McEvent(event) => {
            assert_eq!(event.event, 17);
            assert_eq!(event.shower_num, 3);
        }
        other => panic!("expected an MC event, got {:?}", other),
    }

    assert!(it.next_header().unwrap().is_none());
}

#[test]
fn opaque_objects_keep_their_bytes() {
    let mut buf = Vec::new();
    put_object(&mut buf, 2012, 0, 3, &[1, 2, 3, 4]);

    let mut it = stream_over(buf);
    let header = it.next_header().unwrap().unwrap();

    match parse_object(&mut it.payload(), &header).unwrap() {
        SimTelObject::Opaque(opaque) => {
            assert_eq!(opaque.header.type_code, 2012);
            assert_eq!(opaque.data.as_ref(), &[1, 2, 3, 4]);
        }
        other => panic!("expected an opaque object, got {:?}", other),
    }
}

#[test]
fn extended_length_objects_frame_correctly() {
    // A small payload framed with the extended length form: the high word is zero but the
    // extended bit is set in the type word.
    let payload = [5u8; 6];

    let mut buf = Vec::new();
    buf.extend_from_slice(&SYNC_MARKER.to_le_bytes());
    buf.extend_from_slice(&(2012u32 | (1 << 21)).to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // high-order length word
    buf.extend_from_slice(&payload);
    put_object(&mut buf, 2021, 1, 1, &{
        let mut p = Vec::new();
        p.extend_from_slice(&1i32.to_le_bytes());
        p.extend_from_slice(&0.0f32.to_le_bytes());
        p.extend_from_slice(&0.0f32.to_le_bytes());
        p
    });

    let mut it = stream_over(buf);

    let first = it.next_header().unwrap().unwrap();
    assert!(first.extended);
    assert_eq!(first.length, 6);

    let second = it.next_header().unwrap().unwrap();
    assert_eq!(second.type_code, 2021);
}
