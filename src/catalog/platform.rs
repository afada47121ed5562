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

//! Platform file access.
//!
//! Discovery only ever reaches the file system through [`PlatformAccess`]:
//! a storage permission check, a bounded directory enumeration and the
//! conversion of a device path into a URL the player can load. Any of these
//! may fail, and callers treat failure as "nothing found here".

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use url::Url;
use walkdir::WalkDir;

use crate::catalog::CatalogError;

pub trait PlatformAccess: Send + Sync {
    /// Succeeds when at least one of `roots` can be read, or none exist.
    fn ensure_storage_permission(&self, roots: &[PathBuf]) -> Result<(), CatalogError>;

    /// Lists the regular files below `root`, at most `max_depth` levels deep.
    fn enumerate(&self, root: &Path, max_depth: usize) -> io::Result<Vec<PathBuf>>;

    fn playable_url(&self, path: &Path) -> Option<String>;
}

/// [`PlatformAccess`] backed by the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl PlatformAccess for LocalFilesystem {
    fn ensure_storage_permission(&self, roots: &[PathBuf]) -> Result<(), CatalogError> {
        let mut denied = Vec::new();

        for root in roots.iter().filter(|r| r.exists()) {
            match fs::read_dir(root) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    denied.push(root.display().to_string());
                }
                Err(e) => tracing::debug!("Cannot read {}: {}", root.display(), e),
            }
        }

        if denied.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::PermissionDenied(format!(
                "storage access refused for {}",
                denied.join(", ")
            )))
        }
    }

    fn enumerate(&self, root: &Path, max_depth: usize) -> io::Result<Vec<PathBuf>> {
        // Surface a missing or unreadable root as an error rather than an
        // empty walk.
        fs::read_dir(root)?;

        let files = WalkDir::new(root)
            .max_depth(max_depth)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();

        Ok(files)
    }

    fn playable_url(&self, path: &Path) -> Option<String> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().ok()?.join(path)
        };
        Url::from_file_path(absolute).ok().map(String::from)
    }
}
