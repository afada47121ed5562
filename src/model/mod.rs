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

//! Domain models and core data structures.
//!
//! This module defines the central entities of the application, songs in their
//! three shapes: the plain [`Song`] shared by every source, the persisted
//! [`LocalSong`] produced by discovery and downloads, and the view-only
//! [`UnifiedSong`] returned by the library merge.

pub mod queue;
pub mod search;
pub mod settings;

use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

/// Placeholder used when no artist could be determined for a song.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// A playable audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Duration in seconds, zero when unknown.
    pub duration: f64,
    pub audio_url: String,
    pub cover_url: Option<String>,
    pub genre: Option<String>,
    pub release_date: Option<String>,
    pub plays: i64,
    pub likes: i64,
    pub description: Option<String>,
    pub hashtags: Vec<String>,
}

impl Song {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        audio_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration: 0.0,
            audio_url: audio_url.into(),
            cover_url: None,
            genre: None,
            release_date: None,
            plays: 0,
            likes: 0,
            description: None,
            hashtags: Vec::new(),
        }
    }

    /// Sets the duration, clamping negative and non-finite values to zero.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = clamp_duration(seconds);
        self
    }

    pub fn with_album(mut self, album: Option<String>) -> Self {
        self.album = album;
        self
    }

    pub fn with_genre(mut self, genre: Option<String>) -> Self {
        self.genre = genre;
        self
    }
}

pub(crate) fn clamp_duration(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// A song stored on this device, either discovered/imported or downloaded.
///
/// Live file handles are never part of this record, see
/// [`crate::catalog::handles::SessionHandles`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSong {
    pub song: Song,
    pub is_local: bool,
    pub downloaded: bool,
    pub path: Option<PathBuf>,
}

impl LocalSong {
    pub fn discovered(song: Song, path: PathBuf) -> Self {
        Self {
            song,
            is_local: true,
            downloaded: false,
            path: Some(path),
        }
    }

    pub fn downloaded(song: Song, path: PathBuf) -> Self {
        Self {
            song,
            is_local: false,
            downloaded: true,
            path: Some(path),
        }
    }

    pub fn id(&self) -> &str {
        &self.song.id
    }
}

/// Where a song in the unified library came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongSource {
    Online,
    Downloaded,
    Local,
}

impl SongSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SongSource::Online => "online",
            SongSource::Downloaded => "downloaded",
            SongSource::Local => "local",
        }
    }
}

impl fmt::Display for SongSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SongSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "online" => Ok(SongSource::Online),
            "downloaded" => Ok(SongSource::Downloaded),
            "local" => Ok(SongSource::Local),
            other => Err(format!("unknown song source: {other}")),
        }
    }
}

/// A song as presented by the unified library view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedSong {
    pub song: Song,
    pub source: SongSource,
    pub is_available_offline: bool,
}

impl UnifiedSong {
    pub fn online(song: Song) -> Self {
        Self {
            song,
            source: SongSource::Online,
            is_available_offline: false,
        }
    }

    pub fn offline(song: Song, source: SongSource) -> Self {
        Self {
            song,
            source,
            is_available_offline: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.song.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_duration_is_clamped() {
        let song = Song::new("s1", "A", "B", "file:///a.mp3").with_duration(-4.0);
        assert_eq!(song.duration, 0.0);

        let song = song.with_duration(f64::NAN);
        assert_eq!(song.duration, 0.0);

        let song = song.with_duration(12.5);
        assert_eq!(song.duration, 12.5);
    }

    #[test]
    fn source_parses_case_insensitively() {
        assert_eq!("Local".parse::<SongSource>(), Ok(SongSource::Local));
        assert_eq!("online".parse::<SongSource>(), Ok(SongSource::Online));
        assert!("cloud".parse::<SongSource>().is_err());
    }
}
