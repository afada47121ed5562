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

//! The unified library.
//!
//! Merges the three places a song can come from into one list without
//! duplicates:
//!
//! 1. **Online**: the user's uploads followed by the songs they liked.
//! 2. **Downloaded**: remote songs saved on this device.
//! 3. **Local**: files found by discovery or imported.
//!
//! When an id appears in more than one source the later source wins, giving
//! local over downloaded over online. The winner takes over the slot of the
//! first occurrence, so the order of `all` is the order ids were first seen.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

use crate::{
    db::{self, SongTable},
    model::{LocalSong, Song, SongSource, UnifiedSong},
    remote::RemoteBackend,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnifiedLibrary {
    pub all: Vec<UnifiedSong>,
    pub online: Vec<UnifiedSong>,
    pub downloaded: Vec<UnifiedSong>,
    pub local: Vec<UnifiedSong>,
}

impl UnifiedLibrary {
    pub fn by_source(&self, source: SongSource) -> &[UnifiedSong] {
        match source {
            SongSource::Online => &self.online,
            SongSource::Downloaded => &self.downloaded,
            SongSource::Local => &self.local,
        }
    }

    pub fn find(&self, id: &str) -> Option<&UnifiedSong> {
        self.all.iter().find(|s| s.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Builds the unified library for `user_id`, or for nobody when signed out.
///
/// Any failure, remote or local, is logged and yields an empty library.
pub fn get_unified_library(
    conn: &Connection,
    backend: &dyn RemoteBackend,
    user_id: Option<&str>,
) -> UnifiedLibrary {
    match build_library(conn, backend, user_id) {
        Ok(library) => library,
        Err(e) => {
            tracing::error!("Failed to load library: {:#}", e);
            UnifiedLibrary::default()
        }
    }
}

fn build_library(
    conn: &Connection,
    backend: &dyn RemoteBackend,
    user_id: Option<&str>,
) -> Result<UnifiedLibrary> {
    let online = match user_id {
        Some(user_id) => fetch_online(backend, user_id)?,
        None => vec![],
    };

    let downloaded: Vec<UnifiedSong> = db::fetch_songs(conn, SongTable::Downloads)?
        .into_iter()
        .map(|local| UnifiedSong::offline(local.song, SongSource::Downloaded))
        .collect();

    let local: Vec<UnifiedSong> = db::fetch_songs(conn, SongTable::Local)?
        .into_iter()
        .map(|local| UnifiedSong::offline(local.song, SongSource::Local))
        .collect();

    let all = merge(&[&online, &downloaded, &local]);

    Ok(UnifiedLibrary {
        all,
        online,
        downloaded,
        local,
    })
}

/// Uploads then likes, keeping the first copy of each id.
fn fetch_online(backend: &dyn RemoteBackend, user_id: &str) -> Result<Vec<UnifiedSong>> {
    let uploads = backend
        .fetch_uploads(user_id)
        .context("Failed to fetch uploads")?;
    let liked = backend
        .fetch_liked(user_id)
        .context("Failed to fetch liked songs")?;

    let mut seen = std::collections::HashSet::new();
    Ok(uploads
        .into_iter()
        .chain(liked)
        .filter(|song| seen.insert(song.id.clone()))
        .map(UnifiedSong::online)
        .collect())
}

/// Merges sources in increasing priority.
fn merge(sources: &[&Vec<UnifiedSong>]) -> Vec<UnifiedSong> {
    let mut merged: Vec<UnifiedSong> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for song in sources.iter().flat_map(|source| source.iter()) {
        match slots.get(song.id()) {
            Some(&slot) => merged[slot] = song.clone(),
            None => {
                slots.insert(song.id().to_string(), merged.len());
                merged.push(song.clone());
            }
        }
    }

    merged
}

/// A file name unique to the song id: a readable prefix plus the id's hash.
fn download_file_name(song: &Song) -> String {
    let extension = Url::parse(&song.audio_url)
        .ok()
        .and_then(|url| {
            Path::new(url.path())
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
        })
        .filter(|e| e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "mp3".to_string());

    let stem: String = song
        .id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();

    format!("{stem}-{:016x}.{extension}", xxh3_64(song.id.as_bytes()))
}

/// Saves a remote song's audio under `dir` and records it as downloaded.
///
/// The stored copy points at the saved file, so it keeps playing offline.
pub fn download_song(
    conn: &mut Connection,
    backend: &dyn RemoteBackend,
    song: &Song,
    dir: &Path,
) -> Result<LocalSong> {
    let bytes = backend
        .fetch_audio(&song.audio_url)
        .with_context(|| format!("Failed to download {}", song.title))?;

    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path: PathBuf = dir.join(download_file_name(song));
    fs::write(&path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;

    let absolute = path.canonicalize()?;
    let mut stored = song.clone();
    stored.audio_url = Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| anyhow::anyhow!("Cannot build a URL for {}", absolute.display()))?;

    let download = LocalSong::downloaded(stored, absolute);
    db::put_songs(conn, SongTable::Downloads, std::slice::from_ref(&download))?;

    tracing::info!("Downloaded '{}' ({} bytes)", song.title, bytes.len());

    Ok(download)
}

/// Deletes a download and its saved file, returning whether it existed.
pub fn remove_download(conn: &Connection, id: &str) -> Result<bool> {
    let Some(download) = db::fetch_song(conn, SongTable::Downloads, id)? else {
        return Ok(false);
    };

    if let Some(path) = &download.path {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Could not delete {}: {}", path.display(), e);
        }
    }

    db::delete_song(conn, SongTable::Downloads, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;

    #[derive(Default)]
    struct FakeBackend {
        uploads: Vec<Song>,
        liked: Vec<Song>,
        fail: bool,
    }

    impl RemoteBackend for FakeBackend {
        fn fetch_uploads(&self, _user_id: &str) -> Result<Vec<Song>, RemoteError> {
            if self.fail {
                return Err(RemoteError::NotConfigured);
            }
            Ok(self.uploads.clone())
        }

        fn fetch_liked(&self, _user_id: &str) -> Result<Vec<Song>, RemoteError> {
            Ok(self.liked.clone())
        }

        fn record_listen(&self, _user_id: &str, _song_id: &str) -> Result<(), RemoteError> {
            Ok(())
        }

        fn increment_plays(&self, _song_id: &str) -> Result<(), RemoteError> {
            Ok(())
        }

        fn fetch_audio(&self, _url: &str) -> Result<Vec<u8>, RemoteError> {
            Ok(b"ID3 fake audio".to_vec())
        }
    }

    fn song(id: &str, title: &str) -> Song {
        Song::new(id, title, "Neon Coast", format!("https://cdn.example/{id}.ogg"))
    }

    fn store() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = db::init_db(&dir.path().join("riffline.db")).unwrap();
        (dir, conn)
    }

    fn ids(songs: &[UnifiedSong]) -> Vec<&str> {
        songs.iter().map(|s| s.id()).collect()
    }

    #[test]
    fn local_copy_wins_over_download_and_online() {
        let (_dir, mut conn) = store();
        let backend = FakeBackend {
            uploads: vec![song("x", "Online")],
            ..Default::default()
        };
        db::put_songs(
            &mut conn,
            SongTable::Downloads,
            &[LocalSong::downloaded(song("x", "Downloaded"), "/d/x.ogg".into())],
        )
        .unwrap();
        db::put_songs(
            &mut conn,
            SongTable::Local,
            &[LocalSong::discovered(song("x", "Local"), "/l/x.ogg".into())],
        )
        .unwrap();

        let library = get_unified_library(&conn, &backend, Some("user-1"));

        assert_eq!(library.all.len(), 1);
        assert_eq!(library.all[0].source, SongSource::Local);
        assert_eq!(library.all[0].song.title, "Local");
        assert!(library.all[0].is_available_offline);
        assert_eq!(library.online.len(), 1);
        assert_eq!(library.downloaded.len(), 1);
        assert_eq!(library.local.len(), 1);
    }

    #[test]
    fn merge_keeps_first_seen_order() {
        let (_dir, mut conn) = store();
        let backend = FakeBackend {
            uploads: vec![song("a", "A"), song("b", "B")],
            liked: vec![song("b", "B liked"), song("c", "C")],
            ..Default::default()
        };
        db::put_songs(
            &mut conn,
            SongTable::Downloads,
            &[
                LocalSong::downloaded(song("d", "D"), "/d/d.ogg".into()),
                LocalSong::downloaded(song("b", "B"), "/d/b.ogg".into()),
            ],
        )
        .unwrap();

        let library = get_unified_library(&conn, &backend, Some("user-1"));

        assert_eq!(ids(&library.online), vec!["a", "b", "c"]);
        assert_eq!(library.online[1].song.title, "B");
        assert_eq!(ids(&library.all), vec!["a", "b", "c", "d"]);
        assert_eq!(library.all[1].source, SongSource::Downloaded);
        assert!(!library.all[0].is_available_offline);
    }

    #[test]
    fn signed_out_library_has_no_online_songs() {
        let (_dir, mut conn) = store();
        let backend = FakeBackend {
            uploads: vec![song("a", "A")],
            ..Default::default()
        };
        db::put_songs(
            &mut conn,
            SongTable::Local,
            &[LocalSong::discovered(song("l", "L"), "/l/l.ogg".into())],
        )
        .unwrap();

        let library = get_unified_library(&conn, &backend, None);

        assert!(library.online.is_empty());
        assert_eq!(ids(&library.all), vec!["l"]);
    }

    #[test]
    fn remote_failure_yields_an_empty_library() {
        let (_dir, mut conn) = store();
        db::put_songs(
            &mut conn,
            SongTable::Local,
            &[LocalSong::discovered(song("l", "L"), "/l/l.ogg".into())],
        )
        .unwrap();
        let backend = FakeBackend {
            fail: true,
            ..Default::default()
        };

        let library = get_unified_library(&conn, &backend, Some("user-1"));

        assert_eq!(library, UnifiedLibrary::default());
    }

    #[test]
    fn downloads_are_saved_and_removed() {
        let (dir, mut conn) = store();
        let downloads = dir.path().join("downloads");
        let remote = song("9b/2c", "Midnight Drive");

        let saved = download_song(&mut conn, &FakeBackend::default(), &remote, &downloads).unwrap();

        let path = saved.path.clone().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("9b_2c-"));
        assert!(name.ends_with(".ogg"));
        assert_eq!(fs::read(&path).unwrap(), b"ID3 fake audio");
        assert!(saved.downloaded);
        assert!(saved.song.audio_url.starts_with("file://"));

        let library = get_unified_library(&conn, &FakeBackend::default(), None);
        assert_eq!(library.downloaded[0].id(), "9b/2c");

        assert!(remove_download(&conn, "9b/2c").unwrap());
        assert!(!path.exists());
        assert!(!remove_download(&conn, "9b/2c").unwrap());
    }

    #[test]
    fn similar_ids_download_to_different_files() {
        let (dir, mut conn) = store();
        let downloads = dir.path().join("downloads");

        let first = download_song(
            &mut conn,
            &FakeBackend::default(),
            &song("a/b", "First"),
            &downloads,
        )
        .unwrap();
        let second = download_song(
            &mut conn,
            &FakeBackend::default(),
            &song("a_b", "Second"),
            &downloads,
        )
        .unwrap();

        assert_ne!(first.path, second.path);
        assert!(first.path.unwrap().exists());
        assert_eq!(db::fetch_songs(&conn, SongTable::Downloads).unwrap().len(), 2);
    }
}
