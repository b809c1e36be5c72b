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

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Queue-level behaviour.
///
/// Durability of each write belongs to the [`Storage`](crate::Storage)
/// backend, so [`FlushMode`] is set on [`FileStorage`](crate::FileStorage),
/// [`StorageRoot`](crate::StorageRoot) or [`QueueBuilder`](crate::QueueBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct QueueConfig {
    pub on_persist_failure: PersistFailurePolicy,
}

/// How far a snapshot is pushed before a mutating call returns.
///
/// Both modes write synchronously on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
    /// `fsync` the snapshot file and its directory before returning.
    #[default]
    Sync,
    /// Leave the written bytes in the OS page cache.
    Buffered,
}

impl FlushMode {
    pub const fn is_sync(self) -> bool { matches!(self, Self::Sync) }
}

/// What a mutating call does with its in-memory change when the snapshot
/// cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(rename_all = "snake_case")]
pub enum PersistFailurePolicy {
    /// Keep the change. Memory and disk diverge until the next successful
    /// persist; the call reports success.
    #[default]
    KeepInMemory,
    /// Undo the change. Memory stays equal to the last persisted snapshot and
    /// the call reports that nothing happened.
    RollBack,
}
