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

//! Remote backend boundary.
//!
//! The hosted backend owns uploads, likes and listening history. This crate
//! only needs a handful of calls against it, collected in [`RemoteBackend`].
//! Rows arrive in snake_case and are mapped to [`Song`] here, at the
//! boundary.

pub mod rest;

use serde::Deserialize;
use thiserror::Error;

use crate::model::{Song, UNKNOWN_ARTIST};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("no remote backend is configured")]
    NotConfigured,
}

pub trait RemoteBackend: Send + Sync {
    /// Songs uploaded by `user_id`.
    fn fetch_uploads(&self, user_id: &str) -> Result<Vec<Song>, RemoteError>;

    /// Songs liked by `user_id`.
    fn fetch_liked(&self, user_id: &str) -> Result<Vec<Song>, RemoteError>;

    /// Inserts a listening-history row.
    fn record_listen(&self, user_id: &str, song_id: &str) -> Result<(), RemoteError>;

    fn increment_plays(&self, song_id: &str) -> Result<(), RemoteError>;

    /// Downloads an audio payload.
    fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, RemoteError>;
}

/// The backend used when none is configured: it has no songs and refuses
/// writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineBackend;

impl RemoteBackend for OfflineBackend {
    fn fetch_uploads(&self, _user_id: &str) -> Result<Vec<Song>, RemoteError> {
        Ok(vec![])
    }

    fn fetch_liked(&self, _user_id: &str) -> Result<Vec<Song>, RemoteError> {
        Ok(vec![])
    }

    fn record_listen(&self, _user_id: &str, _song_id: &str) -> Result<(), RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    fn increment_plays(&self, _song_id: &str) -> Result<(), RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    fn fetch_audio(&self, _url: &str) -> Result<Vec<u8>, RemoteError> {
        Err(RemoteError::NotConfigured)
    }
}

/// A row of the backend's `songs` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SongRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    pub audio_url: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub plays: Option<i64>,
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hashtags: Option<Vec<String>>,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        let artist = row
            .artist
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

        let mut song = Song::new(row.id, row.title, artist, row.audio_url)
            .with_duration(row.duration.unwrap_or_default())
            .with_album(row.album)
            .with_genre(row.genre);
        song.cover_url = row.cover_url;
        song.plays = row.plays.unwrap_or_default();
        song.likes = row.likes.unwrap_or_default();
        song.release_date = row.release_date;
        song.description = row.description;
        song.hashtags = row.hashtags.unwrap_or_default();
        song
    }
}

/// A row of `likes` with the liked song embedded.
///
/// The embedded song is missing when it has since been deleted.
#[derive(Debug, Clone, Deserialize)]
pub struct LikedRow {
    #[serde(default)]
    pub songs: Option<SongRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_map_to_songs() {
        let row: SongRow = serde_json::from_str(
            r#"{
                "id": "9b2c",
                "title": "Midnight Drive",
                "artist": "Neon Coast",
                "album": null,
                "duration": 201.4,
                "audio_url": "https://cdn.example/9b2c.mp3",
                "cover_url": "https://cdn.example/9b2c.jpg",
                "plays": 42,
                "likes": 7,
                "release_date": "2025-06-01",
                "genre": "Synthwave",
                "description": "late night",
                "hashtags": ["retro"]
            }"#,
        )
        .unwrap();

        let song = Song::from(row);

        assert_eq!(song.id, "9b2c");
        assert_eq!(song.artist, "Neon Coast");
        assert_eq!(song.duration, 201.4);
        assert_eq!(song.plays, 42);
        assert_eq!(song.likes, 7);
        assert_eq!(song.hashtags, vec!["retro"]);
        assert_eq!(song.album, None);
    }

    #[test]
    fn sparse_rows_get_defaults() {
        let row: SongRow = serde_json::from_str(
            r#"{"id": "1", "title": "Demo", "audio_url": "https://cdn.example/1.mp3", "duration": -3}"#,
        )
        .unwrap();

        let song = Song::from(row);

        assert_eq!(song.artist, UNKNOWN_ARTIST);
        assert_eq!(song.duration, 0.0);
        assert_eq!(song.plays, 0);
        assert!(song.hashtags.is_empty());
    }

    #[test]
    fn liked_rows_unwrap_embedded_song() {
        let rows: Vec<LikedRow> = serde_json::from_str(
            r#"[{"songs": {"id": "1", "title": "A", "audio_url": "u"}}, {"songs": null}]"#,
        )
        .unwrap();

        let songs: Vec<Song> = rows.into_iter().filter_map(|r| r.songs).map(Song::from).collect();
        assert_eq!(songs.len(), 1);
    }
}
