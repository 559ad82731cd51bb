// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Project EventIO core.
//!
//! The core crate implements the container layer of the EventIO format as produced by the
//! `simtel_array` simulation chain: byte sources and positioned readers, the primitive codecs
//! shared by all payload layouts, the object header framing, and the lazy object walker.
//!
//! Payload layouts for concrete object families live in the format crates built on top of this
//! one (`eventio-format-simtel`).

pub mod codec;
pub mod errors;
pub mod header;
pub mod io;
pub mod walker;
