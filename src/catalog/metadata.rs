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

//! Best-effort metadata extraction.
//!
//! Tags and duration are read with `lofty`. Reading is raced against a
//! timeout so a file that stalls the decoder yields empty metadata instead of
//! holding up the whole scan. Names fall back to a guess from the filename.

use std::{
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
    time::Duration,
};

use lofty::prelude::*;
use lofty::probe::Probe;
use xxhash_rust::xxh3::xxh3_64;

use crate::model::{LocalSong, Song, UNKNOWN_ARTIST};

/// File extensions accepted as audio.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "ogg", "m4a", "aac", "flac", "opus", "wma", "webm",
];

/// How long metadata extraction may take before it is abandoned.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(3);

/// Every on-device song id starts with this.
pub const LOCAL_ID_PREFIX: &str = "local-";

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

pub fn is_audio_extension(path: &Path) -> bool {
    extension(path).is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}

/// The MIME type a browser would report for `path`, if it is a known media
/// type.
pub fn mime_type(path: &Path) -> Option<&'static str> {
    let mime = match extension(path)?.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "wma" => "audio/x-ms-wma",
        "aif" | "aiff" => "audio/aiff",
        "mid" | "midi" => "audio/midi",
        "weba" => "audio/webm",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime)
}

/// Accepts a file when its MIME type is audio or its extension is allowed.
pub fn is_audio_file(path: &Path) -> bool {
    mime_type(path).is_some_and(|m| m.starts_with("audio/")) || is_audio_extension(path)
}

/// Guesses `(artist, title)` from a filename.
///
/// `Artist-Title.mp3` splits into its two parts. Anything else, including
/// names with more than one hyphen, becomes the title with an unknown
/// artist.
pub fn guess_from_filename(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let parts: Vec<&str> = stem.split('-').map(str::trim).collect();
    if let [artist, title] = parts.as_slice() {
        if !artist.is_empty() && !title.is_empty() {
            return (artist.to_string(), title.to_string());
        }
    }

    (UNKNOWN_ARTIST.to_string(), stem.trim().to_string())
}

/// A stable identifier for a file on this device.
///
/// Derived from the canonical path so that scanning the same files again
/// yields the same ids.
pub fn local_song_id(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let hash = xxh3_64(canonical.to_string_lossy().as_bytes());
    format!("{LOCAL_ID_PREFIX}{hash:016x}")
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub duration: f64,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
}

fn non_empty(value: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads tags and duration, `None` when the file cannot be parsed.
pub fn read_metadata(path: &Path) -> Option<ExtractedMetadata> {
    let tagged_file = match Probe::open(path).and_then(|p| p.read()) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!("No readable metadata in {}: {}", path.display(), e);
            return None;
        }
    };

    let duration = tagged_file.properties().duration().as_secs_f64();
    let mut metadata = ExtractedMetadata {
        duration,
        ..Default::default()
    };

    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        metadata.title = non_empty(tag.title());
        metadata.artist = non_empty(tag.artist());
        metadata.album = non_empty(tag.album());
        metadata.genre = non_empty(tag.genre());
    }

    Some(metadata)
}

/// Runs `work` on its own thread and waits at most `timeout` for it.
///
/// On timeout the worker is left to finish in the background and its result
/// is discarded.
pub fn race_with_timeout<T, F>(work: F, timeout: Duration) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> Option<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let _ = tx.send(work());
    });

    rx.recv_timeout(timeout).ok().flatten()
}

/// Reads metadata for `path`, degrading to zero duration and empty fields on
/// failure or timeout.
pub fn extract_metadata(path: &Path, timeout: Duration) -> ExtractedMetadata {
    let owned: PathBuf = path.to_path_buf();
    match race_with_timeout(move || read_metadata(&owned), timeout) {
        Some(metadata) => metadata,
        None => {
            tracing::debug!("Metadata unavailable for {}", path.display());
            ExtractedMetadata::default()
        }
    }
}

/// Builds a discovered song from a path, its playable URL and whatever
/// metadata was found. Tag values win over the filename guess.
pub fn build_local_song(path: &Path, audio_url: String, metadata: ExtractedMetadata) -> LocalSong {
    let (guessed_artist, guessed_title) = guess_from_filename(path);

    let song = Song::new(
        local_song_id(path),
        metadata.title.unwrap_or(guessed_title),
        metadata.artist.unwrap_or(guessed_artist),
        audio_url,
    )
    .with_duration(metadata.duration)
    .with_album(metadata.album)
    .with_genre(metadata.genre);

    LocalSong::discovered(song, path.to_path_buf())
}
