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

//! Storage handles the queue reads its snapshot from and writes it to.

use std::{
    ffi::OsString,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::{
    FlushMode, Result,
    error::{InvalidNameSnafu, IoSnafu},
};

const TMP_SUFFIX: &str = ".tmp";

/// A durable location holding one queue snapshot.
///
/// A storage handle is exclusively owned by one queue for its lifetime.
pub trait Storage: Send + Sync {
    /// Read the last stored snapshot, or `None` if nothing was ever stored.
    fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the stored snapshot with `bytes`.
    fn write(&self, bytes: &[u8]) -> Result<()>;

    /// Where the snapshot lives, for log output.
    fn location(&self) -> &Path;
}

/// Snapshot stored in a single file.
///
/// Writes go to a sibling `.tmp` file which is renamed over the target, so a
/// crash mid-write leaves the previous snapshot in place.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path:       PathBuf,
    flush_mode: FlushMode,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self { Self::with_flush_mode(path, FlushMode::Sync) }

    pub fn with_flush_mode<P: Into<PathBuf>>(path: P, flush_mode: FlushMode) -> Self {
        Self {
            path: path.into(),
            flush_mode,
        }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub const fn flush_mode(&self) -> FlushMode { self.flush_mode }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(TMP_SUFFIX);
        PathBuf::from(name)
    }

    #[cfg(unix)]
    fn sync_parent(&self) -> Result<()> {
        if let Some(parent) = self.parent_dir() {
            fs::File::open(parent)
                .and_then(|dir| dir.sync_all())
                .context(IoSnafu { path: parent })?;
        }
        Ok(())
    }

    // Directory handles cannot be synced here; the rename is still atomic.
    #[cfg(not(unix))]
    fn sync_parent(&self) -> Result<()> { Ok(()) }

    fn replace_with(&self, tmp_path: &Path, bytes: &[u8]) -> Result<()> {
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(tmp_path)
                .context(IoSnafu { path: tmp_path })?;
            file.write_all(bytes).context(IoSnafu { path: tmp_path })?;
            if self.flush_mode.is_sync() {
                file.sync_all().context(IoSnafu { path: tmp_path })?;
            }
        }

        fs::rename(tmp_path, &self.path).context(IoSnafu { path: &self.path })?;
        if self.flush_mode.is_sync() {
            self.sync_parent()?;
        }
        Ok(())
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }
}

impl Storage for FileStorage {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).context(IoSnafu { path: &self.path }),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent).context(IoSnafu { path: parent })?;
        }

        let tmp_path = self.tmp_path();
        if let Err(err) = self.replace_with(&tmp_path, bytes) {
            discard_tmp(&tmp_path);
            return Err(err);
        }

        debug!(path = ?self.path, len = bytes.len(), "Snapshot written");
        Ok(())
    }

    fn location(&self) -> &Path { &self.path }
}

// Best effort: the write error is what the caller needs to see.
fn discard_tmp(tmp_path: &Path) {
    match fs::remove_file(tmp_path) {
        Ok(()) => debug!(path = ?tmp_path, "Removed partial snapshot"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => debug!(path = ?tmp_path, error = %err, "Failed to remove partial snapshot"),
    }
}

/// An application-private directory holding named queue files.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    dir:        PathBuf,
    flush_mode: FlushMode,
}

impl StorageRoot {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir:        dir.into(),
            flush_mode: FlushMode::Sync,
        }
    }

    #[must_use]
    pub fn flush_mode(mut self, mode: FlushMode) -> Self {
        self.flush_mode = mode;
        self
    }

    pub fn dir(&self) -> &Path { &self.dir }

    /// Open the file `name` inside this root.
    ///
    /// `name` must be a bare file name: no separators, not `.` or `..`, and
    /// not ending in the temporary-file suffix.
    pub fn open(&self, name: &str) -> Result<FileStorage> {
        ensure!(is_bare_file_name(name), InvalidNameSnafu { name });
        Ok(FileStorage::with_flush_mode(
            self.dir.join(name),
            self.flush_mode,
        ))
    }
}

fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.ends_with(TMP_SUFFIX)
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}
