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

//! Library search and statistics.
//!
//! Both are pure views over a single merge result, nothing here touches the
//! store or the network.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::{SongSource, UnifiedSong};

/// Returns the songs whose title, artist, album or genre contains `term`,
/// ignoring case. A blank term matches everything.
pub fn search<'a>(songs: &'a [UnifiedSong], term: &str) -> Vec<&'a UnifiedSong> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return songs.iter().collect();
    }

    songs
        .iter()
        .filter(|unified| {
            let song = &unified.song;
            [
                Some(song.title.as_str()),
                Some(song.artist.as_str()),
                song.album.as_deref(),
                song.genre.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LibraryStats {
    pub total_songs: usize,
    pub online: usize,
    pub downloaded: usize,
    pub local: usize,
    pub available_offline: usize,
    pub total_duration: f64,
    pub total_plays: i64,
    pub total_likes: i64,
    pub artists: usize,
    pub albums: usize,
    pub genres: usize,
}

pub fn stats(songs: &[UnifiedSong]) -> LibraryStats {
    let mut stats = LibraryStats::default();
    let mut artists = HashSet::new();
    let mut albums = HashSet::new();
    let mut genres = HashSet::new();

    for unified in songs {
        let song = &unified.song;

        stats.total_songs += 1;
        match unified.source {
            SongSource::Online => stats.online += 1,
            SongSource::Downloaded => stats.downloaded += 1,
            SongSource::Local => stats.local += 1,
        }
        if unified.is_available_offline {
            stats.available_offline += 1;
        }

        stats.total_duration += song.duration;
        stats.total_plays += song.plays;
        stats.total_likes += song.likes;

        artists.insert(song.artist.to_lowercase());
        if let Some(album) = song.album.as_deref().filter(|a| !a.is_empty()) {
            albums.insert(album.to_lowercase());
        }
        if let Some(genre) = song.genre.as_deref().filter(|g| !g.is_empty()) {
            genres.insert(genre.to_lowercase());
        }
    }

    stats.artists = artists.len();
    stats.albums = albums.len();
    stats.genres = genres.len();

    stats
}
