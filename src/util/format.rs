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

use crate::model::{Song, UnifiedSong, clamp_duration};

/// Formats a duration in seconds into a human-readable `MM:SS` string.
///
/// Fractions are truncated, negative or non-finite input reads as zero.
///
/// # Arguments
///
/// * `seconds` - The duration to format.
pub fn format_time(seconds: f64) -> String {
    let total_seconds = clamp_duration(seconds) as u64;
    let mins = total_seconds / 60;
    let secs = total_seconds % 60;
    format!("{:02}:{:02}", mins, secs)
}

/// `Artist - Title [Album]`.
pub fn song_label(song: &Song) -> String {
    match &song.album {
        Some(album) => format!("{} - {} [{}]", song.artist, song.title, album),
        None => format!("{} - {}", song.artist, song.title),
    }
}

/// One line of a library listing: source, duration, label and id.
pub fn library_line(entry: &UnifiedSong) -> String {
    format!(
        "{:<10} {:>6}  {}  ({})",
        entry.source,
        format_time(entry.song.duration),
        song_label(&entry.song),
        entry.song.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SongSource;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(65.0), "01:05");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(59.9), "00:59");
    }

    #[test]
    fn bad_durations_read_as_zero() {
        assert_eq!(format_time(-4.0), "00:00");
        assert_eq!(format_time(f64::NAN), "00:00");
    }

    #[test]
    fn library_line_shows_source_and_id() {
        let song = Song::new("s1", "Harbour", "Kites", "https://cdn.test/s1.mp3")
            .with_duration(125.0)
            .with_album(Some("Coast".into()));
        let line = library_line(&UnifiedSong::offline(song, SongSource::Downloaded));

        assert!(line.starts_with("downloaded"));
        assert!(line.contains("02:05"));
        assert!(line.contains("Kites - Harbour [Coast]"));
        assert!(line.ends_with("(s1)"));
    }
}
