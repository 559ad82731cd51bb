// EventIO
// Copyright (c) 2019-2022 The Project EventIO Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bookkeeping objects: the history container (type 70) and its command-line and configuration
//! entries (types 71 and 72).

use eventio_core::codec::read_string;
use eventio_core::errors::Result;
use eventio_core::io::ReadBytes;

/// One recorded command line or configuration line, with the time it was captured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: i32,
    pub text: Vec<u8>,
}

impl HistoryEntry {
    pub fn parse<B: ReadBytes>(reader: &mut B) -> Result<HistoryEntry> {
        let timestamp = reader.read_i32()?;
        let text = read_string(reader)?;

        Ok(HistoryEntry { timestamp, text })
    }
}

#[cfg(test)]
mod tests {
    use eventio_core::io::BufReader;

    use super::HistoryEntry;

    #[test]
    fn entry_is_timestamp_then_string() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1_234_567_890i32.to_le_bytes());
        buf.extend_from_slice(&7u16.to_le_bytes());
        buf.extend_from_slice(b"sim_cmd");

        let entry = HistoryEntry::parse(&mut BufReader::new(&buf)).unwrap();
        assert_eq!(entry.timestamp, 1_234_567_890);
        assert_eq!(entry.text, b"sim_cmd");
    }
}
