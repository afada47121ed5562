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

//! Picked-directory discovery.
//!
//! Scans a directory the user chose explicitly. Every match is opened, its
//! handle registered for the session, and its metadata read under a timeout.
//! The folder is remembered so later sessions can sync it without asking.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use walkdir::WalkDir;

use crate::{
    catalog::{
        CatalogError, DiscoveryKind, DiscoveryProvider, ScanProgress,
        handles::{MediaHandle, SessionHandles},
        metadata,
    },
    model::LocalSong,
};

/// Default depth for walking a picked directory.
pub const PICKER_SCAN_DEPTH: usize = 10;

pub struct PickerScanProvider {
    folder: PathBuf,
    max_depth: usize,
    metadata_timeout: Duration,
}

impl PickerScanProvider {
    /// A relative `folder` is resolved against the working directory when it
    /// exists, so the songs found get absolute paths and URLs.
    pub fn new(folder: PathBuf, max_depth: usize, metadata_timeout: Duration) -> Self {
        let folder = folder.canonicalize().unwrap_or(folder);
        Self {
            folder,
            max_depth,
            metadata_timeout,
        }
    }

    /// Reading the folder stands in for the access grant.
    fn request_access(&self) -> Result<(), CatalogError> {
        fs::read_dir(&self.folder).map(|_| ()).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CatalogError::PermissionDenied(format!(
                "{} does not exist",
                self.folder.display()
            )),
            _ => CatalogError::PermissionDenied(format!(
                "access to {} was refused: {}",
                self.folder.display(),
                e
            )),
        })
    }
}

impl DiscoveryProvider for PickerScanProvider {
    fn kind(&self) -> DiscoveryKind {
        DiscoveryKind::Picker
    }

    /// Scans the picked folder.
    ///
    /// # Errors
    ///
    /// * [`CatalogError::PermissionDenied`] if the folder cannot be read.
    /// * [`CatalogError::NoAudioFiles`] if nothing playable was found.
    fn discover(
        &self,
        handles: &mut SessionHandles,
        progress: &mut ScanProgress,
    ) -> Result<Vec<LocalSong>, CatalogError> {
        self.request_access()?;

        progress.prepare_scan(std::slice::from_ref(&self.folder));
        progress.begin_scan_directory(&self.folder);

        let mut songs = Vec::new();
        for entry in WalkDir::new(&self.folder)
            .max_depth(self.max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && metadata::is_audio_file(e.path()))
        {
            let handle = match MediaHandle::open(entry.path()) {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let path = handle.path();
            let extracted = metadata::extract_metadata(path, self.metadata_timeout);
            let song = metadata::build_local_song(path, handle.object_url().to_string(), extracted);

            handles.insert(song.song.id.clone(), handle);
            songs.push(song);
            progress.update_scan_directory(songs.len());
        }

        progress.end_scan_directory();
        progress.finish_scan();

        if songs.is_empty() {
            return Err(CatalogError::NoAudioFiles(self.folder.display().to_string()));
        }

        Ok(songs)
    }

    fn granted_folder(&self) -> Option<&Path> {
        Some(&self.folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::metadata::METADATA_TIMEOUT;

    #[test]
    fn picked_folder_registers_handles() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("live")).unwrap();
        fs::write(dir.path().join("Kites - Harbour.mp3"), b"junk").unwrap();
        fs::write(dir.path().join("live").join("set.aiff"), b"junk").unwrap();
        fs::write(dir.path().join("notes.txt"), b"junk").unwrap();

        let provider =
            PickerScanProvider::new(dir.path().to_path_buf(), PICKER_SCAN_DEPTH, METADATA_TIMEOUT);
        let mut handles = SessionHandles::new();
        let songs = provider
            .discover(&mut handles, &mut ScanProgress::new())
            .unwrap();

        assert_eq!(songs.len(), 2);
        assert_eq!(handles.len(), 2);
        for song in &songs {
            assert!(handles.contains(&song.song.id));
            assert!(song.song.audio_url.starts_with("file://"));
        }
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(provider.granted_folder(), Some(canonical.as_path()));
    }

    #[test]
    fn large_folder_is_catalogued_in_full() {
        // More files than a default open-descriptor limit.
        const FILES: usize = 1500;

        let dir = tempfile::tempdir().unwrap();
        for i in 0..FILES {
            fs::write(dir.path().join(format!("Artist - Song {i}.mp3")), b"").unwrap();
        }

        let provider = PickerScanProvider::new(
            dir.path().to_path_buf(),
            PICKER_SCAN_DEPTH,
            Duration::from_millis(500),
        );
        let mut handles = SessionHandles::new();
        let songs = provider
            .discover(&mut handles, &mut ScanProgress::new())
            .unwrap();

        assert_eq!(songs.len(), FILES);
        assert_eq!(handles.len(), FILES);
    }

    #[test]
    fn relative_folder_yields_absolute_urls() {
        let dir = tempfile::tempdir_in(".").unwrap();
        fs::write(dir.path().join("Artist - Song.mp3"), b"").unwrap();
        let relative = PathBuf::from(dir.path().file_name().unwrap());

        let provider = PickerScanProvider::new(relative, PICKER_SCAN_DEPTH, METADATA_TIMEOUT);
        let songs = provider
            .discover(&mut SessionHandles::new(), &mut ScanProgress::new())
            .unwrap();

        assert_eq!(songs.len(), 1);
        assert!(songs[0].song.audio_url.starts_with("file:///"));
        assert!(provider.granted_folder().unwrap().is_absolute());
    }

    #[test]
    fn empty_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let provider =
            PickerScanProvider::new(dir.path().to_path_buf(), PICKER_SCAN_DEPTH, METADATA_TIMEOUT);
        let result = provider.discover(&mut SessionHandles::new(), &mut ScanProgress::new());

        assert!(matches!(result, Err(CatalogError::NoAudioFiles(_))));
    }

    #[test]
    fn missing_folder_is_refused() {
        let provider = PickerScanProvider::new(
            PathBuf::from("/no/such/folder"),
            PICKER_SCAN_DEPTH,
            METADATA_TIMEOUT,
        );
        let result = provider.discover(&mut SessionHandles::new(), &mut ScanProgress::new());

        assert!(matches!(result, Err(CatalogError::PermissionDenied(_))));
    }
}
