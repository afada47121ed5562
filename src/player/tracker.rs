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

//! Play tracking.
//!
//! Counting a play is a side effect of starting a song, and none of it may
//! hold up playback. The engine emits [`PlaybackEvent::SongStarted`] and the
//! worker spawned here records it. Songs kept in the local store have their
//! local counter bumped. Every song with a backend id, downloads included, is
//! also reported to the remote backend.

use std::{
    path::PathBuf,
    sync::{Arc, mpsc::Receiver},
    thread::{self, JoinHandle},
};

use rusqlite::Connection;

use crate::{
    catalog::metadata::LOCAL_ID_PREFIX,
    db,
    model::Song,
    player::PlaybackEvent,
    remote::{RemoteBackend, RemoteError},
};

/// Spawns a background thread that records every song start.
///
/// The worker opens its own database connection. If that fails it still
/// runs, but only remote plays are recorded. The thread exits once every
/// sender for `events_rx` has been dropped.
///
/// # Arguments
///
/// * `db_path` - The local store the engine's songs were loaded from.
/// * `backend` - The remote backend for listening history and play counts.
/// * `user_id` - The signed-in user, if any.
/// * `events_rx` - The receiving end of the engine's event channel.
pub fn spawn_play_tracker(
    db_path: PathBuf,
    backend: Arc<dyn RemoteBackend>,
    user_id: Option<String>,
    events_rx: Receiver<PlaybackEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let conn = match db::init_db(&db_path) {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::warn!("Play tracker has no local store: {:#}", e);
                None
            }
        };

        let ctx = TrackerContext {
            conn: conn.as_ref(),
            backend: backend.as_ref(),
            user_id: user_id.as_deref(),
        };

        while let Ok(event) = events_rx.recv() {
            match event {
                PlaybackEvent::SongStarted(song) => record_play(&ctx, &song),
            }
        }

        tracing::debug!("Play tracker stopped");
    })
}

struct TrackerContext<'a> {
    conn: Option<&'a Connection>,
    backend: &'a dyn RemoteBackend,
    user_id: Option<&'a str>,
}

fn record_play(ctx: &TrackerContext, song: &Song) {
    if let Some(conn) = ctx.conn {
        match db::increment_play_count(conn, &song.id) {
            Ok(true) => tracing::debug!("Counted local play of '{}'", song.title),
            Ok(false) => {}
            Err(e) => tracing::warn!("Could not count play of '{}': {:#}", song.title, e),
        }
    }

    // Downloads keep their backend id and are reported like streamed songs.
    if song.id.starts_with(LOCAL_ID_PREFIX) {
        return;
    }

    if let Some(user_id) = ctx.user_id {
        if let Err(e) = ctx.backend.record_listen(user_id, &song.id) {
            log_remote_failure("record listen", &song.id, &e);
        }
    }

    if let Err(e) = ctx.backend.increment_plays(&song.id) {
        log_remote_failure("increment plays", &song.id, &e);
    }
}

fn log_remote_failure(action: &str, song_id: &str, error: &RemoteError) {
    match error {
        RemoteError::NotConfigured => tracing::debug!("Skipped {action} for {song_id}: {error}"),
        _ => tracing::warn!("Failed to {action} for {song_id}: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::{
        db::SongTable,
        model::LocalSong,
        player::PlaybackEngine,
    };

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: String) -> Result<(), RemoteError> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(RemoteError::Status {
                    status: 500,
                    url: "http://backend.test".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    impl RemoteBackend for RecordingBackend {
        fn fetch_uploads(&self, _user_id: &str) -> Result<Vec<Song>, RemoteError> {
            Ok(vec![])
        }

        fn fetch_liked(&self, _user_id: &str) -> Result<Vec<Song>, RemoteError> {
            Ok(vec![])
        }

        fn record_listen(&self, user_id: &str, song_id: &str) -> Result<(), RemoteError> {
            self.log(format!("listen {user_id} {song_id}"))
        }

        fn increment_plays(&self, song_id: &str) -> Result<(), RemoteError> {
            self.log(format!("plays {song_id}"))
        }

        fn fetch_audio(&self, _url: &str) -> Result<Vec<u8>, RemoteError> {
            Err(RemoteError::NotConfigured)
        }
    }

    fn online(id: &str) -> Song {
        Song::new(id, "Harbour", "Kites", format!("https://cdn.test/{id}.mp3"))
    }

    fn run(
        backend: Arc<RecordingBackend>,
        db_path: PathBuf,
        user_id: Option<&str>,
        play: impl FnOnce(&mut PlaybackEngine),
    ) {
        let mut engine = PlaybackEngine::new();
        let events = engine.subscribe();
        let tracker = spawn_play_tracker(db_path, backend, user_id.map(String::from), events);

        play(&mut engine);
        drop(engine);

        tracker.join().unwrap();
    }

    #[test]
    fn online_play_is_recorded_remotely() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::default());

        run(backend.clone(), dir.path().join("riffline.db"), Some("u1"), |engine| {
            engine.play(online("s1"), None);
        });

        assert_eq!(backend.calls(), vec!["listen u1 s1", "plays s1"]);
    }

    #[test]
    fn signed_out_play_only_bumps_the_counter() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::default());

        run(backend.clone(), dir.path().join("riffline.db"), None, |engine| {
            engine.play(online("s1"), None);
        });

        assert_eq!(backend.calls(), vec!["plays s1"]);
    }

    #[test]
    fn local_play_is_counted_in_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("riffline.db");
        let mut conn = db::init_db(&db_path).unwrap();

        let song = Song::new("local-0001", "Pier", "Kites", "file:///music/pier.mp3");
        let stored = LocalSong::discovered(song.clone(), PathBuf::from("/music/pier.mp3"));
        db::put_songs(&mut conn, SongTable::Local, &[stored]).unwrap();

        let backend = Arc::new(RecordingBackend::default());
        run(backend.clone(), db_path, Some("u1"), |engine| {
            engine.play(song.clone(), Some(vec![song.clone()]));
            engine.cycle_repeat();
            engine.cycle_repeat();
            engine.play_next();
        });

        assert!(backend.calls().is_empty());
        let plays = db::fetch_song(&conn, SongTable::Local, "local-0001")
            .unwrap()
            .unwrap()
            .song
            .plays;
        assert_eq!(plays, 2);
    }

    #[test]
    fn downloaded_play_is_counted_locally_and_remotely() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("riffline.db");
        let mut conn = db::init_db(&db_path).unwrap();

        let song = online("remote-42");
        let stored = LocalSong::downloaded(song.clone(), dir.path().join("remote-42.mp3"));
        db::put_songs(&mut conn, SongTable::Downloads, &[stored]).unwrap();

        let backend = Arc::new(RecordingBackend::default());
        run(backend.clone(), db_path, Some("u1"), |engine| {
            engine.play(song.clone(), None);
        });

        assert_eq!(backend.calls(), vec!["listen u1 remote-42", "plays remote-42"]);
        let plays = db::fetch_song(&conn, SongTable::Downloads, "remote-42")
            .unwrap()
            .unwrap()
            .song
            .plays;
        assert_eq!(plays, 1);
    }

    #[test]
    fn remote_failures_do_not_stop_the_worker() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend {
            fail: true,
            ..Default::default()
        });

        run(backend.clone(), dir.path().join("riffline.db"), Some("u1"), |engine| {
            engine.play(online("s1"), None);
            engine.play(online("s2"), None);
        });

        assert_eq!(backend.calls().len(), 4);
    }
}
