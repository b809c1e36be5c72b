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

//! A crash-resistant in-process queue.
//!
//! [`PersistentQueue`] holds its elements in memory and writes the complete
//! sequence to a [`Storage`] handle after every mutation. On startup it
//! reloads the last complete snapshot; anything unreadable yields an empty
//! queue instead of an error.

pub mod builder;
pub mod codec;
pub mod config;
mod crc;
pub mod error;
pub mod queue;
pub mod storage;

pub use builder::QueueBuilder;
pub use config::{FlushMode, PersistFailurePolicy, QueueConfig};
pub use error::{FailureKind, QueueError, Result};
pub use queue::{Element, PersistentQueue};
pub use storage::{FileStorage, Storage, StorageRoot};
