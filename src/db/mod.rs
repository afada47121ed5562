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

//! Data access layer.
//!
//! This module handles all interactions with the SQLite database that backs
//! the local durable store, including schema creation and reading and writing
//! stored songs. It uses cached statements for the frequently executed
//! queries.
//!
//! # Tables
//!
//! * `local_songs` - Songs found by discovery or imported explicitly.
//! * `downloads` - Remote songs whose audio payload was saved on this device.
//! * `folders` - Directories the user granted access to, keyed by name.
//! * `settings` - Small JSON documents such as the playback configuration.
//!
//! Live file handles are never written here, only serializable fields.

mod model;

use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{LocalSong, settings::PlaybackConfiguration};

/// Key under which the granted music folder is stored.
pub const MUSIC_FOLDER_KEY: &str = "music_folder";

const PLAYBACK_SETTINGS_KEY: &str = "playback";

/// The two song tables share one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongTable {
    Local,
    Downloads,
}

impl SongTable {
    fn name(self) -> &'static str {
        match self {
            SongTable::Local => "local_songs",
            SongTable::Downloads => "downloads",
        }
    }
}

const SONG_COLUMNS: &str = "id, title, artist, album, duration, audio_url, cover_url, genre, \
    release_date, plays, likes, description, hashtags, is_local, downloaded, path";

/// Opens a connection to the SQLite database and configures performance settings.
///
/// This function performs the following setup:
/// * **Directories**: Creates the parent directory of `path` if needed.
/// * **WAL Mode**: Enables Write-Ahead Logging so the play tracker and the
///   foreground can hold separate connections.
/// * **Performance Tuning**: Sets synchronous mode to `NORMAL`.
/// * **Schema**: Executes [`create_schema`] to ensure all tables exist.
///
/// # Errors
///
/// Returns an error if:
/// * The database file cannot be opened.
/// * The initial PRAGMA configurations fail.
/// * The schema initialization fails.
pub fn init_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;

    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
    if journal_mode != "wal" {
        anyhow::bail!(
            "Failed to switch to WAL mode. Current mode: {}",
            journal_mode
        );
    }

    conn.execute_batch(
        "
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
    ",
    )?;

    conn.set_prepared_statement_cache_capacity(32);

    create_schema(&conn)?;

    Ok(conn)
}

/// Create the database schema.
///
/// This operation is wrapped in a single SQL transaction so the schema is
/// updated atomically.
fn create_schema(conn: &Connection) -> Result<()> {
    let song_table = |name: &str| {
        format!(
            "CREATE TABLE IF NOT EXISTS {name} (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                artist TEXT NOT NULL,
                album TEXT,
                duration REAL NOT NULL DEFAULT 0,
                audio_url TEXT NOT NULL,
                cover_url TEXT,
                genre TEXT,
                release_date TEXT,
                plays INTEGER NOT NULL DEFAULT 0,
                likes INTEGER NOT NULL DEFAULT 0,
                description TEXT,
                hashtags TEXT NOT NULL DEFAULT '[]',
                is_local INTEGER NOT NULL,
                downloaded INTEGER NOT NULL,
                path TEXT,
                added_at INTEGER NOT NULL
            );"
        )
    };

    conn.execute_batch(&format!(
        "BEGIN;

        {}

        {}

        CREATE TABLE IF NOT EXISTS folders (
            key TEXT PRIMARY KEY,
            path TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        COMMIT;",
        song_table(SongTable::Local.name()),
        song_table(SongTable::Downloads.name()),
    ))
    .context("Failed to create schema")
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Inserts or updates songs in one transaction.
///
/// Existing rows keep their play counter and the time they were first added,
/// so re-scanning the same files refreshes metadata without resetting stats.
///
/// # Returns
///
/// The number of songs written.
pub fn put_songs(conn: &mut Connection, table: SongTable, songs: &[LocalSong]) -> Result<usize> {
    let sql = format!(
        "INSERT INTO {} ({SONG_COLUMNS}, added_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
         ON CONFLICT (id) DO UPDATE SET
            title = excluded.title,
            artist = excluded.artist,
            album = excluded.album,
            duration = excluded.duration,
            audio_url = excluded.audio_url,
            cover_url = excluded.cover_url,
            genre = excluded.genre,
            release_date = excluded.release_date,
            likes = excluded.likes,
            description = excluded.description,
            hashtags = excluded.hashtags,
            is_local = excluded.is_local,
            downloaded = excluded.downloaded,
            path = excluded.path",
        table.name()
    );

    let added_at = now_secs();
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(&sql)?;
        for local in songs {
            let song = &local.song;
            let hashtags = serde_json::to_string(&song.hashtags)?;
            let path = local.path.as_ref().map(|p| p.to_string_lossy().into_owned());

            stmt.execute(params![
                song.id,
                song.title,
                song.artist,
                song.album,
                song.duration,
                song.audio_url,
                song.cover_url,
                song.genre,
                song.release_date,
                song.plays,
                song.likes,
                song.description,
                hashtags,
                local.is_local,
                local.downloaded,
                path,
                added_at,
            ])?;
        }
    }
    tx.commit().context("Failed to commit songs")?;

    Ok(songs.len())
}

/// Fetches every song in `table`, oldest first.
pub fn fetch_songs(conn: &Connection, table: SongTable) -> Result<Vec<LocalSong>> {
    let sql = format!(
        "SELECT {SONG_COLUMNS} FROM {} ORDER BY added_at, rowid",
        table.name()
    );

    let mut stmt = conn.prepare_cached(&sql)?;
    let results = stmt
        .query_map([], LocalSong::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(results)
}

pub fn fetch_song(conn: &Connection, table: SongTable, id: &str) -> Result<Option<LocalSong>> {
    let sql = format!("SELECT {SONG_COLUMNS} FROM {} WHERE id = ?", table.name());

    let mut stmt = conn.prepare_cached(&sql)?;
    let result = stmt.query_row([id], LocalSong::from_row).optional()?;

    Ok(result)
}

/// Deletes one song, returning whether a row existed.
pub fn delete_song(conn: &Connection, table: SongTable, id: &str) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?", table.name());
    let deleted = conn.prepare_cached(&sql)?.execute([id])?;

    Ok(deleted > 0)
}

/// Deletes every song in `table`, returning how many were removed.
pub fn clear_songs(conn: &Connection, table: SongTable) -> Result<usize> {
    let deleted = conn.execute(&format!("DELETE FROM {}", table.name()), [])?;

    Ok(deleted)
}

/// Bumps the local play counter for a stored song.
///
/// Returns `false` when the id is in neither song table, i.e. the song only
/// exists remotely.
pub fn increment_play_count(conn: &Connection, id: &str) -> Result<bool> {
    let mut updated = 0;
    for table in [SongTable::Local, SongTable::Downloads] {
        let sql = format!("UPDATE {} SET plays = plays + 1 WHERE id = ?", table.name());
        updated += conn.prepare_cached(&sql)?.execute([id])?;
    }

    Ok(updated > 0)
}

pub fn save_folder(conn: &Connection, key: &str, path: &Path) -> Result<()> {
    let sql = "
        INSERT INTO folders (key, path)
        VALUES (?1, ?2)
        ON CONFLICT (key)
        DO UPDATE SET path = ?2";

    conn.prepare_cached(sql)?
        .execute(params![key, path.to_string_lossy()])?;

    Ok(())
}

pub fn load_folder(conn: &Connection, key: &str) -> Result<Option<PathBuf>> {
    let path: Option<String> = conn
        .prepare_cached("SELECT path FROM folders WHERE key = ?")?
        .query_row([key], |row| row.get(0))
        .optional()?;

    Ok(path.map(PathBuf::from))
}

pub fn forget_folder(conn: &Connection, key: &str) -> Result<()> {
    conn.prepare_cached("DELETE FROM folders WHERE key = ?")?
        .execute([key])?;

    Ok(())
}

pub fn save_playback_config(conn: &Connection, config: &PlaybackConfiguration) -> Result<()> {
    let sql = "
        INSERT INTO settings (key, value)
        VALUES (?1, ?2)
        ON CONFLICT (key)
        DO UPDATE SET value = ?2";

    let value = serde_json::to_string(config)?;
    conn.prepare_cached(sql)?
        .execute(params![PLAYBACK_SETTINGS_KEY, value])?;

    Ok(())
}

/// Loads the saved playback configuration, `None` if nothing was saved yet.
pub fn load_playback_config(conn: &Connection) -> Result<Option<PlaybackConfiguration>> {
    let value: Option<String> = conn
        .prepare_cached("SELECT value FROM settings WHERE key = ?")?
        .query_row([PLAYBACK_SETTINGS_KEY], |row| row.get(0))
        .optional()?;

    value
        .map(|v| serde_json::from_str(&v).context("Corrupt playback settings"))
        .transpose()
}
