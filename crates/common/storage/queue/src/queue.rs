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

//! The persistent queue and its mutate-then-persist cycle.
//!
//! The [`PersistentQueue`] keeps the whole sequence in memory and rewrites the
//! full snapshot to its [`Storage`] after every mutation:
//! - Construction loads the last snapshot, falling back to an empty queue
//! - Mutations hold the write lock across the change and the snapshot write
//! - Reads hold the read lock, so they never observe a half-applied change
//!
//! ## Usage
//!
//! ```ignore
//! let queue: PersistentQueue<String> = PersistentQueue::open("/path/to/pending.q");
//!
//! queue.enqueue("hello".to_string());
//! assert_eq!(queue.peek().as_deref(), Some("hello"));
//! assert_eq!(queue.dequeue().as_deref(), Some("hello"));
//! ```

use std::{
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{error, info, warn};

use crate::{
    FileStorage, PersistFailurePolicy, QueueBuilder, QueueConfig, Result, codec, storage::Storage,
};

/// Element types a [`PersistentQueue`] can hold.
///
/// Anything serde can round-trip and that can be shared across threads.
pub trait Element: Serialize + DeserializeOwned + Clone + Send + Sync {}

impl<T> Element for T where T: Serialize + DeserializeOwned + Clone + Send + Sync {}

struct State<T> {
    items:     VecDeque<T>,
    /// Whether storage holds exactly `items`.
    persisted: bool,
}

/// A FIFO queue whose full contents are written to durable storage after
/// every mutation.
///
/// The queue is thread-safe. Mutations are serialized against each other,
/// including their snapshot write. None of the queue operations return
/// errors: load and persist failures are logged, and out-of-range indices
/// are reported through `Option`/`bool` results.
pub struct PersistentQueue<T, S = FileStorage> {
    /// Where snapshots are read from and written to.
    storage: S,
    /// Flush and failure policy.
    config:  QueueConfig,
    /// In-memory sequence plus its persistence status.
    state:   RwLock<State<T>>,
}

impl<T: Element> PersistentQueue<T, FileStorage> {
    /// Open the queue stored at `path` with the default configuration.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self { QueueBuilder::new(path).build() }
}

impl<T: Element, S: Storage> PersistentQueue<T, S> {
    pub fn with_storage(storage: S) -> Self { Self::with_config(storage, QueueConfig::default()) }

    /// Attach to `storage`, loading any previously persisted sequence.
    ///
    /// A missing, unreadable or corrupt snapshot yields an empty queue; the
    /// failure is logged and never returned.
    pub fn with_config(storage: S, config: QueueConfig) -> Self {
        let (items, persisted) = Self::load(&storage);

        Self {
            storage,
            config,
            state: RwLock::new(State { items, persisted }),
        }
    }

    fn load(storage: &S) -> (VecDeque<T>, bool) {
        let loaded = storage
            .read()
            .and_then(|bytes| bytes.map(|bytes| codec::decode(&bytes)).transpose());

        match loaded {
            Ok(Some(items)) => {
                info!(path = ?storage.location(), len = items.len(), "Queue loaded");
                (items, true)
            }
            Ok(None) => {
                info!(path = ?storage.location(), "No stored queue found, starting empty");
                (VecDeque::new(), true)
            }
            Err(err) => {
                warn!(
                    path = ?storage.location(),
                    kind = %err.kind(),
                    error = %err,
                    "Failed to load stored queue, starting empty"
                );
                (VecDeque::new(), false)
            }
        }
    }

    /// Append `element` to the tail and persist.
    pub fn enqueue(&self, element: T) {
        let mut state = self.write_state();
        state.items.push_back(element);
        self.commit(&mut state, "enqueue", |items| {
            items.pop_back();
        });
    }

    /// Remove and return the head, or `None` if the queue is empty.
    ///
    /// An empty queue is left untouched and nothing is written.
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.write_state();
        let mut head = Some(state.items.pop_front()?);

        self.commit(&mut state, "dequeue", |items| {
            if let Some(head) = head.take() {
                items.push_front(head);
            }
        });
        head
    }

    /// Insert `element` before position `index`; `index == size()` appends.
    ///
    /// Returns `false` without touching storage if `index > size()`.
    pub fn insert_at(&self, index: usize, element: T) -> bool {
        let mut state = self.write_state();
        if index > state.items.len() {
            return false;
        }

        state.items.insert(index, element);
        self.commit(&mut state, "insert_at", |items| {
            items.remove(index);
        })
    }

    /// Remove the element at `index`.
    ///
    /// Returns `false` without touching storage if `index >= size()`.
    pub fn remove_at(&self, index: usize) -> bool {
        let mut state = self.write_state();
        let Some(removed) = state.items.remove(index) else {
            return false;
        };

        self.commit(&mut state, "remove_at", move |items| {
            items.insert(index, removed);
        })
    }

    pub fn peek(&self) -> Option<T> { self.read_state().items.front().cloned() }

    pub fn peek_at(&self, index: usize) -> Option<T> { self.read_state().items.get(index).cloned() }

    pub fn size(&self) -> usize { self.read_state().items.len() }

    pub fn is_empty(&self) -> bool { self.read_state().items.is_empty() }

    /// Copy of the current contents, head first.
    pub fn to_vec(&self) -> Vec<T> { self.read_state().items.iter().cloned().collect() }

    /// Whether storage currently holds exactly the in-memory sequence.
    ///
    /// `false` after a failed persist kept under
    /// [`PersistFailurePolicy::KeepInMemory`], or after a failed load, until
    /// the next successful write.
    pub fn is_persisted(&self) -> bool { self.read_state().persisted }

    /// Write the current sequence to storage.
    ///
    /// Mutations persist on their own; this exists to re-converge storage
    /// with memory after a failure and is the one call that reports the
    /// error to the caller.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.write_state();
        state.persisted = false;
        self.write_snapshot(&state.items)?;
        state.persisted = true;
        Ok(())
    }

    pub const fn storage(&self) -> &S { &self.storage }

    pub const fn config(&self) -> &QueueConfig { &self.config }

    fn write_snapshot(&self, items: &VecDeque<T>) -> Result<()> {
        let bytes = codec::encode(items)?;
        self.storage.write(&bytes)
    }

    /// Persist the already-mutated state.
    ///
    /// If the write fails or panics under [`PersistFailurePolicy::RollBack`],
    /// `undo` restores the pre-mutation sequence before this returns or the
    /// panic resumes. Returns whether the mutation stands.
    fn commit(
        &self,
        state: &mut State<T>,
        op: &'static str,
        undo: impl FnOnce(&mut VecDeque<T>),
    ) -> bool {
        let was_persisted = state.persisted;
        state.persisted = false;
        let roll_back = self.config.on_persist_failure == PersistFailurePolicy::RollBack;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.write_snapshot(&state.items)));
        match outcome {
            Ok(Ok(())) => {
                state.persisted = true;
                true
            }
            Ok(Err(err)) => {
                error!(
                    op,
                    path = ?self.storage.location(),
                    kind = %err.kind(),
                    error = %err,
                    kept_in_memory = !roll_back,
                    "Failed to persist queue"
                );
                if roll_back {
                    undo(&mut state.items);
                    state.persisted = was_persisted;
                }
                !roll_back
            }
            Err(payload) => {
                // Storage contents are unknown after a panic, so `persisted`
                // stays false under both policies.
                error!(
                    op,
                    path = ?self.storage.location(),
                    kept_in_memory = !roll_back,
                    "Panic while persisting queue"
                );
                if roll_back {
                    undo(&mut state.items);
                }
                panic::resume_unwind(payload)
            }
        }
    }

    // Poisoning is ignored: `commit` finishes the mutation or its undo, and
    // the `persisted` flag, before a storage panic leaves the lock.
    fn read_state(&self) -> RwLockReadGuard<'_, State<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
