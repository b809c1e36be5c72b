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

use std::path::PathBuf;

use crate::{Element, FileStorage, FlushMode, PersistFailurePolicy, PersistentQueue, QueueConfig};

pub struct QueueBuilder {
    path:       PathBuf,
    flush_mode: FlushMode,
    config:     QueueConfig,
}

impl QueueBuilder {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path:       path.into(),
            flush_mode: FlushMode::default(),
            config:     QueueConfig::default(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn flush_mode(mut self, mode: FlushMode) -> Self {
        self.flush_mode = mode;
        self
    }

    #[must_use]
    pub fn on_persist_failure(mut self, policy: PersistFailurePolicy) -> Self {
        self.config.on_persist_failure = policy;
        self
    }

    /// Open the queue, loading whatever is stored at the configured path.
    pub fn build<T: Element>(self) -> PersistentQueue<T> {
        let storage = FileStorage::with_flush_mode(self.path, self.flush_mode);
        PersistentQueue::with_config(storage, self.config)
    }
}
