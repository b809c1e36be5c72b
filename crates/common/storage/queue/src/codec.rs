// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! On-disk snapshot format.
//!
//! Every persist writes the whole sequence as one snapshot. The payload is the
//! bincode encoding of the sequence; the header lets a reader reject torn or
//! foreign files before handing bytes to bincode.
//!
//! ## Binary Format
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │ Header (32 bytes)                                      │
//! ├──────────────────┬─────────────────────────────────────┤
//! │ magic: [u8; 4]   │ "PQUE" (0x50515545)                 │
//! │ version: u32     │ Format version, currently 1         │
//! │ count: u64       │ Number of elements                  │
//! │ payload_len: u64 │ Length of the bincode payload       │
//! │ checksum: u32    │ CRC32 of count, payload_len, payload│
//! │ reserved: [u8;4] │ Reserved for future use             │
//! ├──────────────────┴─────────────────────────────────────┤
//! │ Payload: bincode(seq of T) (payload_len bytes)         │
//! └────────────────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;

use serde::{Serialize, de::DeserializeOwned};
use snafu::{ResultExt, ensure};

use crate::{
    Result,
    crc::{snapshot_crc, verify_snapshot_crc},
    error::{CorruptedSnafu, DecodeSnafu, EncodeSnafu, TypeMismatchSnafu, UnsupportedVersionSnafu},
};

/// Magic bytes identifying a queue snapshot: "PQUE"
pub const SNAPSHOT_MAGIC: [u8; 4] = [0x50, 0x51, 0x55, 0x45];

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Size of the snapshot header in bytes.
pub const SNAPSHOT_HEADER_SIZE: usize = 32;

const fn bincode_config() -> bincode::config::Configuration { bincode::config::standard() }

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Encode the full sequence into a framed snapshot.
pub fn encode<T: Serialize>(items: &VecDeque<T>) -> Result<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(items, bincode_config()).context(EncodeSnafu)?;
    let count = items.len() as u64;
    let checksum = snapshot_crc(count, &payload);

    let mut header = [0u8; SNAPSHOT_HEADER_SIZE];
    header[0..4].copy_from_slice(&SNAPSHOT_MAGIC);
    header[4..8].copy_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    header[8..16].copy_from_slice(&count.to_le_bytes());
    header[16..24].copy_from_slice(&(payload.len() as u64).to_le_bytes());
    header[24..28].copy_from_slice(&checksum.to_le_bytes());

    let mut result = Vec::with_capacity(SNAPSHOT_HEADER_SIZE + payload.len());
    result.extend_from_slice(&header);
    result.extend(payload);
    Ok(result)
}

/// Decode a framed snapshot back into the sequence.
///
/// Validates magic, version, length and checksum before decoding the payload.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<VecDeque<T>> {
    ensure!(
        data.len() >= SNAPSHOT_HEADER_SIZE,
        CorruptedSnafu {
            reason: format!(
                "data too short: {} bytes, expected at least {SNAPSHOT_HEADER_SIZE}",
                data.len()
            ),
        }
    );

    let magic = &data[0..4];
    ensure!(
        magic == SNAPSHOT_MAGIC,
        CorruptedSnafu {
            reason: format!("invalid magic: {magic:?}"),
        }
    );

    let version = le_u32(&data[4..8]);
    ensure!(
        version == SNAPSHOT_VERSION,
        UnsupportedVersionSnafu { version }
    );

    let count = le_u64(&data[8..16]);
    let payload_len = le_u64(&data[16..24]);
    let stored_checksum = le_u32(&data[24..28]);

    let payload = &data[SNAPSHOT_HEADER_SIZE..];
    ensure!(
        payload.len() as u64 == payload_len,
        CorruptedSnafu {
            reason: format!(
                "payload length mismatch: header={payload_len}, actual={}",
                payload.len()
            ),
        }
    );
    ensure!(
        verify_snapshot_crc(count, payload, stored_checksum),
        CorruptedSnafu {
            reason: format!(
                "checksum mismatch: stored={stored_checksum:#x}, computed={:#x}",
                snapshot_crc(count, payload)
            ),
        }
    );

    let (items, consumed): (VecDeque<T>, usize) =
        bincode::serde::decode_from_slice(payload, bincode_config()).context(DecodeSnafu)?;

    ensure!(
        consumed == payload.len(),
        TypeMismatchSnafu {
            reason: format!(
                "{} trailing bytes after decoding {} elements",
                payload.len() - consumed,
                items.len()
            ),
        }
    );
    ensure!(
        items.len() as u64 == count,
        TypeMismatchSnafu {
            reason: format!("expected {count} elements, decoded {}", items.len()),
        }
    );

    Ok(items)
}
