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

//! Composition root.
//!
//! [`App`] builds every long-lived part of the application once, from the
//! configuration, and hands them out to the front end. There is no global
//! state: whoever owns the `App` owns the engine, the store and the session.

use std::{
    sync::Arc,
    thread::JoinHandle,
};

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::{
    catalog::{CatalogSettings, handles::SessionHandles},
    config::AppConfig,
    db,
    library::{self, UnifiedLibrary},
    player::{PlaybackEngine, tracker::spawn_play_tracker},
    remote::{OfflineBackend, RemoteBackend, rest::RestBackend},
};

pub struct App {
    pub config: AppConfig,
    pub conn: Connection,
    pub backend: Arc<dyn RemoteBackend>,
    pub handles: SessionHandles,
    pub engine: PlaybackEngine,
    tracker: Option<JoinHandle<()>>,
}

impl App {
    /// Opens the store, connects the backend and starts the play tracker.
    ///
    /// Saved playback settings are restored into the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be opened or the backend
    /// client cannot be built.
    pub fn new(config: AppConfig) -> Result<Self> {
        let backend = build_backend(&config)?;
        Self::with_backend(config, backend)
    }

    /// As [`App::new`], with an explicit backend.
    pub fn with_backend(config: AppConfig, backend: Arc<dyn RemoteBackend>) -> Result<Self> {
        let db_path = config.database_path();
        let conn = db::init_db(&db_path)
            .with_context(|| format!("Failed to open local store {}", db_path.display()))?;

        let mut engine = match db::load_playback_config(&conn) {
            Ok(Some(saved)) => PlaybackEngine::with_config(saved),
            Ok(None) => PlaybackEngine::new(),
            Err(e) => {
                tracing::warn!("Ignoring saved playback settings: {:#}", e);
                PlaybackEngine::new()
            }
        };

        let events_rx = engine.subscribe();
        let tracker = spawn_play_tracker(
            db_path,
            Arc::clone(&backend),
            config.user_id.clone(),
            events_rx,
        );

        Ok(Self {
            config,
            conn,
            backend,
            handles: SessionHandles::new(),
            engine,
            tracker: Some(tracker),
        })
    }

    pub fn catalog_settings(&self) -> CatalogSettings {
        self.config.catalog_settings()
    }

    /// The merged view of online, downloaded and local songs.
    pub fn library(&self) -> UnifiedLibrary {
        library::get_unified_library(
            &self.conn,
            self.backend.as_ref(),
            self.config.user_id.as_deref(),
        )
    }

    /// Saves playback settings, then waits for outstanding plays to be
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings could not be saved. The tracker is
    /// stopped either way.
    pub fn shutdown(mut self) -> Result<()> {
        let saved = db::save_playback_config(&self.conn, self.engine.config());

        self.engine.unsubscribe();
        if let Some(tracker) = self.tracker.take() {
            if tracker.join().is_err() {
                tracing::error!("Play tracker panicked");
            }
        }
        self.handles.clear();

        saved.context("Failed to save playback settings")
    }
}

fn build_backend(config: &AppConfig) -> Result<Arc<dyn RemoteBackend>> {
    match &config.backend {
        Some(remote) => {
            let backend = RestBackend::new(
                &remote.url,
                remote.api_key.clone(),
                remote.access_token.clone(),
            )
            .context("Failed to create backend client")?;
            tracing::debug!("Using backend at {}", remote.url);
            Ok(Arc::new(backend))
        }
        None => {
            tracing::debug!("No backend configured, running offline");
            Ok(Arc::new(OfflineBackend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::SongTable,
        model::{LocalSong, Song, settings::RepeatMode},
    };

    fn config(dir: &tempfile::TempDir) -> AppConfig {
        AppConfig {
            database_file: Some(dir.path().join("riffline.db").to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn playback_settings_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();

        let mut app = App::new(config(&dir)).unwrap();
        app.engine.set_volume(0.4);
        app.engine.cycle_repeat();
        app.engine.toggle_shuffle();
        app.shutdown().unwrap();

        let app = App::new(config(&dir)).unwrap();
        assert_eq!(app.engine.config().volume, 0.4);
        assert_eq!(app.engine.config().repeat, RepeatMode::One);
        assert!(app.engine.config().shuffle);
        app.shutdown().unwrap();
    }

    #[test]
    fn offline_app_has_an_empty_library() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(config(&dir)).unwrap();

        assert!(app.library().is_empty());
        app.shutdown().unwrap();
    }

    #[test]
    fn plays_before_shutdown_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("riffline.db");
        let mut app = App::new(config(&dir)).unwrap();

        let song = Song::new("local-00aa", "Harbour", "Kites", "file:///music/harbour.mp3");
        let stored = LocalSong::discovered(song.clone(), "/music/harbour.mp3".into());
        db::put_songs(&mut app.conn, SongTable::Local, &[stored]).unwrap();

        app.engine.play(song, None);
        app.shutdown().unwrap();

        let conn = db::init_db(&db_path).unwrap();
        let plays = db::fetch_song(&conn, SongTable::Local, "local-00aa")
            .unwrap()
            .unwrap()
            .song
            .plays;
        assert_eq!(plays, 1);
    }
}
