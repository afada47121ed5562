// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Session-scoped file handles.
//!
//! Stored songs only carry serializable fields. The handle for a file the
//! user picked or imported sits in this side table, keyed by song id, and
//! goes away when the table is dropped at the end of the session.
//!
//! A handle records that the file was readable when it was granted and the
//! URL it plays from. It holds no open descriptor, so a folder of any size
//! can be granted at once.

use std::{
    collections::HashMap,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use url::Url;

/// A granted audio file: its absolute path and a loadable URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    path: PathBuf,
    url: String,
}

impl MediaHandle {
    /// Checks `path` can be read and resolves it to an absolute location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or has no `file://`
    /// form.
    pub fn open(path: &Path) -> io::Result<Self> {
        let path = path.canonicalize()?;
        drop(File::open(&path)?);

        let url = Url::from_file_path(&path).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no file URL for {}", path.display()),
            )
        })?;

        Ok(Self {
            path,
            url: url.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The URL the rendering layer loads for as long as the session lasts.
    pub fn object_url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Default)]
pub struct SessionHandles {
    handles: HashMap<String, MediaHandle>,
}

impl SessionHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handle, returning the one it replaced.
    pub fn insert(&mut self, id: impl Into<String>, handle: MediaHandle) -> Option<MediaHandle> {
        self.handles.insert(id.into(), handle)
    }

    pub fn get(&self, id: &str) -> Option<&MediaHandle> {
        self.handles.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    /// Drops the handle for `id`, closing the file.
    pub fn release(&mut self, id: &str) -> bool {
        self.handles.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
