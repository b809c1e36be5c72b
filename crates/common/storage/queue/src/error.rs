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

use std::{io, path::PathBuf};

use snafu::Snafu;

/// Coarse classification of a queue failure, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// The storage medium refused a read or write.
    Io,
    /// The stored bytes are not a well-formed snapshot.
    Corruption,
    /// The snapshot is intact but does not decode into the element type.
    TypeMismatch,
    /// The in-memory sequence could not be serialized.
    Encoding,
}

/// Queue operation errors.
#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum QueueError {
    /// Filesystem I/O failure.
    #[snafu(display("IO error on {}", path.display()))]
    Io {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Failed to encode queue contents"))]
    Encode {
        source: bincode::error::EncodeError,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Failed to decode queue contents"))]
    Decode {
        source: bincode::error::DecodeError,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    /// Framing or checksum check failed while loading a snapshot.
    #[snafu(display("Corrupted queue file: {reason}"))]
    Corrupted { reason: String },

    /// Snapshot is intact but holds a different element type.
    #[snafu(display("Queue file does not match the element type: {reason}"))]
    TypeMismatch { reason: String },

    #[snafu(display("Unsupported queue file version {version}"))]
    UnsupportedVersion { version: u32 },

    /// Storage name rejected by [`StorageRoot`](crate::StorageRoot).
    #[snafu(display("Invalid storage name: {name:?}"))]
    InvalidName { name: String },
}

impl QueueError {
    /// Classify this error for reporting.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Io { .. } | Self::InvalidName { .. } => FailureKind::Io,
            Self::Encode { .. } => FailureKind::Encoding,
            Self::Decode { .. } | Self::TypeMismatch { .. } => FailureKind::TypeMismatch,
            Self::Corrupted { .. } | Self::UnsupportedVersion { .. } => FailureKind::Corruption,
        }
    }
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
