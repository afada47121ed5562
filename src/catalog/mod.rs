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

//! Local music discovery and cataloguing.
//!
//! This module finds playable audio outside the remote backend and records it
//! in the local store. Discovery goes through a [`DiscoveryProvider`], of
//! which there are two:
//!
//! * [`native::NativeScanProvider`] walks the well-known media directories.
//! * [`picker::PickerScanProvider`] walks a directory the user picked.
//!
//! [`probe_provider`] chooses one at startup. Whichever runs, results are
//! persisted before they are returned.

pub mod handles;
pub mod metadata;
pub mod native;
pub mod picker;
pub mod platform;

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Duration,
};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    catalog::{
        handles::{MediaHandle, SessionHandles},
        native::{NATIVE_SCAN_DEPTH, NativeScanProvider},
        picker::{PICKER_SCAN_DEPTH, PickerScanProvider},
    },
    db::{self, MUSIC_FOLDER_KEY, SongTable},
    model::LocalSong,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("no audio files found in {0}")]
    NoAudioFiles(String),

    #[error("local store failure: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryKind {
    Native,
    Picker,
}

/// How [`probe_provider`] should choose a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    #[default]
    Auto,
    Native,
    Picker,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub mode: DiscoveryMode,
    pub media_dirs: Vec<PathBuf>,
    pub native_depth: usize,
    pub picker_depth: usize,
    pub metadata_timeout: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            mode: DiscoveryMode::Auto,
            media_dirs: vec![],
            native_depth: NATIVE_SCAN_DEPTH,
            picker_depth: PICKER_SCAN_DEPTH,
            metadata_timeout: metadata::METADATA_TIMEOUT,
        }
    }
}

pub trait DiscoveryProvider {
    fn kind(&self) -> DiscoveryKind;

    /// Finds songs. Handles for files that were opened are registered in
    /// `handles`.
    fn discover(
        &self,
        handles: &mut SessionHandles,
        progress: &mut ScanProgress,
    ) -> Result<Vec<LocalSong>, CatalogError>;

    /// The folder the user granted access to, worth remembering for
    /// auto-sync.
    fn granted_folder(&self) -> Option<&Path> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStatus {
    Idle,
    Scanning,
    Finished,
}

#[derive(Debug, Clone)]
pub struct DirectoryStatus {
    pub status: CatalogStatus,
    pub path: PathBuf,
    pub count: usize,
}

/// Progress of a single discovery run, one entry per scanned root.
#[derive(Debug)]
pub struct ScanProgress {
    pub status: CatalogStatus,
    pub directory_status: Vec<DirectoryStatus>,
    current_directory_index: Option<usize>,
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanProgress {
    pub fn new() -> Self {
        Self {
            status: CatalogStatus::Idle,
            directory_status: vec![],
            current_directory_index: None,
        }
    }

    pub fn prepare_scan(&mut self, directories: &[PathBuf]) {
        self.status = CatalogStatus::Scanning;

        self.directory_status = directories
            .iter()
            .map(|d| DirectoryStatus {
                status: CatalogStatus::Idle,
                path: d.clone(),
                count: 0,
            })
            .collect();
    }

    pub fn begin_scan_directory(&mut self, directory: &Path) {
        self.current_directory_index = self
            .directory_status
            .iter()
            .position(|s| s.path == directory && s.status == CatalogStatus::Idle);

        if let Some(idx) = self.current_directory_index {
            self.directory_status[idx].status = CatalogStatus::Scanning;
        }
        tracing::debug!("Scanning {}", directory.display());
    }

    pub fn update_scan_directory(&mut self, count: usize) {
        if let Some(idx) = self.current_directory_index {
            if let Some(status) = self.directory_status.get_mut(idx) {
                status.count = count;
            }
        }
    }

    pub fn end_scan_directory(&mut self) {
        if let Some(idx) = self.current_directory_index {
            let status = &mut self.directory_status[idx];
            status.status = CatalogStatus::Finished;
            tracing::debug!("Found {} songs in {}", status.count, status.path.display());
        }
        self.current_directory_index = None;
    }

    pub fn finish_scan(&mut self) {
        self.status = CatalogStatus::Finished;
    }

    pub fn total(&self) -> usize {
        self.directory_status.iter().map(|s| s.count).sum()
    }
}

/// Chooses a discovery provider from what is available.
///
/// An explicitly requested folder always means a picker scan. Otherwise the
/// configured mode decides, and in `auto` mode a previously granted folder
/// selects the picker while its absence falls back to the native scan.
pub fn probe_provider(
    conn: &Connection,
    settings: &CatalogSettings,
    requested_folder: Option<PathBuf>,
) -> Box<dyn DiscoveryProvider> {
    let picker = |folder: PathBuf| -> Box<dyn DiscoveryProvider> {
        Box::new(PickerScanProvider::new(
            folder,
            settings.picker_depth,
            settings.metadata_timeout,
        ))
    };
    let native = || -> Box<dyn DiscoveryProvider> {
        Box::new(NativeScanProvider::new(
            NativeScanProvider::well_known_roots(&settings.media_dirs),
            settings.native_depth,
        ))
    };

    if let Some(folder) = requested_folder {
        return picker(folder);
    }

    let saved_folder = match db::load_folder(conn, MUSIC_FOLDER_KEY) {
        Ok(folder) => folder,
        Err(e) => {
            tracing::warn!("Could not read saved music folder: {:#}", e);
            None
        }
    };

    match settings.mode {
        DiscoveryMode::Native => native(),
        DiscoveryMode::Picker => match saved_folder.or_else(|| settings.media_dirs.first().cloned()) {
            Some(folder) => picker(folder),
            None => {
                tracing::warn!("No folder to scan, falling back to the native scan");
                native()
            }
        },
        DiscoveryMode::Auto => match saved_folder {
            Some(folder) => picker(folder),
            None => native(),
        },
    }
}

/// Runs discovery and stores what it found.
///
/// Errors are returned to the caller, this is the user-initiated path. On
/// error nothing is written.
pub fn discover(
    conn: &mut Connection,
    handles: &mut SessionHandles,
    provider: &dyn DiscoveryProvider,
) -> Result<Vec<LocalSong>, CatalogError> {
    let mut progress = ScanProgress::new();
    let songs = provider.discover(handles, &mut progress)?;

    db::put_songs(conn, SongTable::Local, &songs)?;
    if let Some(folder) = provider.granted_folder() {
        db::save_folder(conn, MUSIC_FOLDER_KEY, folder)?;
    }

    tracing::info!(
        "Discovered {} songs in {} directories ({:?} scan)",
        songs.len(),
        progress.directory_status.len(),
        provider.kind()
    );

    Ok(songs)
}

/// Re-runs discovery in the background, returning how many songs were synced.
///
/// Failures are logged and reported as zero.
pub fn auto_sync(
    conn: &mut Connection,
    handles: &mut SessionHandles,
    settings: &CatalogSettings,
) -> usize {
    let provider = probe_provider(conn, settings, None);
    match discover(conn, handles, provider.as_ref()) {
        Ok(songs) => songs.len(),
        Err(e) => {
            tracing::warn!("Auto-sync failed: {}", e);
            0
        }
    }
}

/// Imports specific files chosen by the user.
///
/// Paths that are not audio, or cannot be opened, are skipped. A file named
/// more than once is imported once.
///
/// # Errors
///
/// Returns [`CatalogError::NoAudioFiles`] when none of `paths` could be
/// imported.
pub fn import_files(
    conn: &mut Connection,
    handles: &mut SessionHandles,
    paths: &[PathBuf],
    metadata_timeout: Duration,
) -> Result<Vec<LocalSong>, CatalogError> {
    let mut seen = HashSet::new();
    let mut songs = Vec::new();
    let mut opened = Vec::new();

    for path in paths.iter().filter(|p| metadata::is_audio_file(p)) {
        let handle = match MediaHandle::open(path) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let id = metadata::local_song_id(handle.path());
        if !seen.insert(id) {
            continue;
        }

        let extracted = metadata::extract_metadata(handle.path(), metadata_timeout);
        let song =
            metadata::build_local_song(handle.path(), handle.object_url().to_string(), extracted);

        opened.push((song.song.id.clone(), handle));
        songs.push(song);
    }

    if songs.is_empty() {
        return Err(CatalogError::NoAudioFiles(format!(
            "{} selected file(s)",
            paths.len()
        )));
    }

    db::put_songs(conn, SongTable::Local, &songs)?;
    for (id, handle) in opened {
        handles.insert(id, handle);
    }

    tracing::info!("Imported {} songs", songs.len());

    Ok(songs)
}

/// Deletes one local song and releases its handle.
pub fn remove_local_song(
    conn: &Connection,
    handles: &mut SessionHandles,
    id: &str,
) -> Result<bool, CatalogError> {
    handles.release(id);
    Ok(db::delete_song(conn, SongTable::Local, id)?)
}

/// Deletes every local song, releases all handles and forgets the granted
/// folder.
pub fn clear_local_songs(
    conn: &Connection,
    handles: &mut SessionHandles,
) -> Result<usize, CatalogError> {
    handles.clear();
    let removed = db::clear_songs(conn, SongTable::Local)?;
    db::forget_folder(conn, MUSIC_FOLDER_KEY)?;

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn store() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = db::init_db(&dir.path().join("riffline.db")).unwrap();
        (dir, conn)
    }

    #[test]
    fn repeated_native_scans_do_not_duplicate() {
        let (dir, mut conn) = store();
        let music = dir.path().join("Music");
        fs::create_dir_all(&music).unwrap();
        fs::write(music.join("Kites - Harbour.mp3"), b"").unwrap();
        fs::write(music.join("Kites - Pier.mp3"), b"").unwrap();

        let provider = NativeScanProvider::new(vec![music], NATIVE_SCAN_DEPTH);
        let mut handles = SessionHandles::new();

        discover(&mut conn, &mut handles, &provider).unwrap();
        discover(&mut conn, &mut handles, &provider).unwrap();

        assert_eq!(db::fetch_songs(&conn, SongTable::Local).unwrap().len(), 2);
    }

    #[test]
    fn picker_scan_remembers_folder_and_auto_sync_reuses_it() {
        let (dir, mut conn) = store();
        let picked = dir.path().join("picked");
        fs::create_dir_all(&picked).unwrap();
        fs::write(picked.join("Kites - Harbour.mp3"), b"junk").unwrap();

        let settings = CatalogSettings::default();
        let provider = probe_provider(&conn, &settings, Some(picked.clone()));
        assert_eq!(provider.kind(), DiscoveryKind::Picker);

        let mut handles = SessionHandles::new();
        discover(&mut conn, &mut handles, provider.as_ref()).unwrap();
        assert_eq!(
            db::load_folder(&conn, MUSIC_FOLDER_KEY).unwrap(),
            Some(picked.canonicalize().unwrap())
        );

        let reprobed = probe_provider(&conn, &settings, None);
        assert_eq!(reprobed.kind(), DiscoveryKind::Picker);

        fs::write(picked.join("Kites - Pier.mp3"), b"junk").unwrap();
        let mut fresh_session = SessionHandles::new();
        assert_eq!(auto_sync(&mut conn, &mut fresh_session, &settings), 2);
        assert_eq!(fresh_session.len(), 2);
        assert_eq!(db::fetch_songs(&conn, SongTable::Local).unwrap().len(), 2);
    }

    #[test]
    fn auto_sync_failure_is_absorbed() {
        let (dir, mut conn) = store();
        db::save_folder(&conn, MUSIC_FOLDER_KEY, &dir.path().join("gone")).unwrap();

        let count = auto_sync(&mut conn, &mut SessionHandles::new(), &CatalogSettings::default());

        assert_eq!(count, 0);
        assert!(db::fetch_songs(&conn, SongTable::Local).unwrap().is_empty());
    }

    #[test]
    fn native_mode_ignores_saved_folder() {
        let (dir, conn) = store();
        db::save_folder(&conn, MUSIC_FOLDER_KEY, dir.path()).unwrap();

        let settings = CatalogSettings {
            mode: DiscoveryMode::Native,
            ..Default::default()
        };
        assert_eq!(probe_provider(&conn, &settings, None).kind(), DiscoveryKind::Native);
    }

    #[test]
    fn import_skips_non_audio_and_fails_when_nothing_is_left() {
        let (dir, mut conn) = store();
        let song = dir.path().join("Kites - Harbour.ogg");
        let notes = dir.path().join("notes.txt");
        fs::write(&song, b"junk").unwrap();
        fs::write(&notes, b"junk").unwrap();

        let mut handles = SessionHandles::new();
        let imported = import_files(
            &mut conn,
            &mut handles,
            &[song.clone(), notes.clone()],
            metadata::METADATA_TIMEOUT,
        )
        .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].song.title, "Harbour");
        assert!(handles.contains(&imported[0].song.id));

        let result = import_files(&mut conn, &mut handles, &[notes], metadata::METADATA_TIMEOUT);
        assert!(matches!(result, Err(CatalogError::NoAudioFiles(_))));
    }

    #[test]
    fn importing_the_same_file_twice_yields_one_song() {
        let (dir, mut conn) = store();
        let song = dir.path().join("Kites - Harbour.mp3");
        fs::write(&song, b"junk").unwrap();
        let indirect = dir.path().join(".").join("Kites - Harbour.mp3");

        let mut handles = SessionHandles::new();
        let imported = import_files(
            &mut conn,
            &mut handles,
            &[song.clone(), song, indirect],
            metadata::METADATA_TIMEOUT,
        )
        .unwrap();

        assert_eq!(imported.len(), 1);
        assert_eq!(handles.len(), 1);
        assert_eq!(db::fetch_songs(&conn, SongTable::Local).unwrap().len(), 1);
    }

    #[test]
    fn remove_and_clear_release_handles() {
        let (dir, mut conn) = store();
        let a = dir.path().join("a.mp3");
        let b = dir.path().join("b.mp3");
        fs::write(&a, b"junk").unwrap();
        fs::write(&b, b"junk").unwrap();

        let mut handles = SessionHandles::new();
        let songs = import_files(&mut conn, &mut handles, &[a, b], metadata::METADATA_TIMEOUT)
            .unwrap();

        assert!(remove_local_song(&conn, &mut handles, &songs[0].song.id).unwrap());
        assert_eq!(handles.len(), 1);

        assert_eq!(clear_local_songs(&conn, &mut handles).unwrap(), 1);
        assert!(handles.is_empty());
    }
}
