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

//! Database row mapping for domain models.
//!
//! This module provides the conversion logic between raw SQLite result rows
//! and stored songs.

use std::path::PathBuf;

use rusqlite::{Row, types::Type};

use crate::model::{LocalSong, Song, clamp_duration};

impl LocalSong {
    /// Maps an SQLite row to a [`LocalSong`] instance.
    ///
    /// The row must follow the column order of `SONG_COLUMNS`.
    ///
    /// # Errors
    ///
    /// Returns a [`rusqlite::Error`] if:
    /// * The row does not contain enough columns.
    /// * The data in a column cannot be converted to the required Rust type.
    /// * The stored hashtag list is not valid JSON.
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let hashtags: String = row.get(12)?;
        let hashtags: Vec<String> = serde_json::from_str(&hashtags)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;

        let duration: f64 = row.get(4)?;
        let path: Option<String> = row.get(15)?;

        Ok(Self {
            song: Song {
                id: row.get(0)?,
                title: row.get(1)?,
                artist: row.get(2)?,
                album: row.get(3)?,
                duration: clamp_duration(duration),
                audio_url: row.get(5)?,
                cover_url: row.get(6)?,
                genre: row.get(7)?,
                release_date: row.get(8)?,
                plays: row.get(9)?,
                likes: row.get(10)?,
                description: row.get(11)?,
                hashtags,
            },
            is_local: row.get(13)?,
            downloaded: row.get(14)?,
            path: path.map(PathBuf::from),
        })
    }
}
