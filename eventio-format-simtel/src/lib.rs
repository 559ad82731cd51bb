// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoder for the simtel_array object family carried in EventIO streams.
//!
//! The framing layer (`eventio-core`) yields object headers and bounded payload views; this
//! crate maps type codes onto payload parsers and turns each payload into a typed record. Type
//! codes without a parser are surfaced as [`dispatch::OpaqueObject`]s so higher layers can add
//! parsers without touching the framing.

pub mod config;
pub mod dispatch;
pub mod event;
pub mod history;
pub mod mc;
pub mod moni;
pub mod records;
pub mod types;

pub use dispatch::{parse_object, parse_object_strict, SimTelObject};
