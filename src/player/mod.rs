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

//! Playback engine.
//!
//! [`PlaybackEngine`] is the single source of truth for what is playing and
//! how: the current song, the queue, transport state and the playback
//! configuration. It does no audio work itself. A rendering layer binds this
//! state to whatever decodes the audio and reports the natural end of a track
//! back through [`PlaybackEngine::handle_song_end`].
//!
//! The engine knows nothing about persistence. Starting a song emits a
//! [`PlaybackEvent`] to whoever called [`PlaybackEngine::subscribe`], see
//! [`tracker`].

pub mod tracker;

use std::sync::mpsc::{self, Receiver, Sender};

use crate::model::{
    Song,
    queue::Queue,
    settings::{
        AudioQuality, CrossfadePatch, EqualizerPatch, EqualizerPreset, PlaybackConfiguration,
        PlaybackSpeed, RepeatMode,
    },
};

/// Past this many seconds into a song, "previous" restarts it instead.
pub const RESTART_THRESHOLD_SECS: f64 = 3.0;

/// Transport state, derived from the engine fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    SongStarted(Song),
}

#[derive(Debug, Default)]
pub struct PlaybackEngine {
    current_song: Option<Song>,
    queue: Queue,
    is_playing: bool,
    current_time: f64,
    config: PlaybackConfiguration,
    events: Option<Sender<PlaybackEvent>>,
}

impl PlaybackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PlaybackConfiguration) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns a receiver for [`PlaybackEvent`]s, replacing any earlier
    /// subscriber.
    pub fn subscribe(&mut self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = mpsc::channel();
        self.events = Some(tx);
        rx
    }

    /// Drops the event sender so the subscriber sees the channel close.
    pub fn unsubscribe(&mut self) {
        self.events = None;
    }

    fn emit(&mut self, event: PlaybackEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                tracing::debug!("Playback event subscriber has gone away");
                self.events = None;
            }
        }
    }

    /// Plays `song`, optionally replacing the queue.
    ///
    /// Without a queue only the current song changes, the queue and index
    /// are left as they were. With a queue the index is the song's position
    /// in it, or zero if it is not there.
    pub fn play(&mut self, song: Song, new_queue: Option<Vec<Song>>) {
        if let Some(songs) = new_queue {
            self.queue.replace(songs, self.config.shuffle);
            self.queue.relocate(&song.id);
        }

        tracing::debug!("Playing '{}' by {}", song.title, song.artist);

        self.current_song = Some(song.clone());
        self.current_time = 0.0;
        self.is_playing = true;

        self.emit(PlaybackEvent::SongStarted(song));
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    pub fn resume(&mut self) {
        if self.current_song.is_some() {
            self.is_playing = true;
        }
    }

    pub fn toggle_play(&mut self) {
        if self.current_song.is_some() {
            self.is_playing = !self.is_playing;
        }
    }

    pub fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds;
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.config.volume = volume;
    }

    pub fn set_playback_speed(&mut self, speed: PlaybackSpeed) {
        self.config.speed = speed;
    }

    pub fn add_to_queue(&mut self, song: Song) {
        self.queue.push(song);
    }

    /// Removes the queue entry at `index`. Removing the current entry is
    /// allowed; callers are expected to prevent it.
    pub fn remove_from_queue(&mut self, index: usize) -> Option<Song> {
        self.queue.remove(index)
    }

    /// Moves a queue entry for this play-through only; the original order,
    /// and so the order restored when shuffle is turned off, is unchanged.
    pub fn reorder_queue(&mut self, from: usize, to: usize) {
        self.queue.reorder(from, to);
    }

    fn start_at(&mut self, index: usize) {
        self.queue.set_index(index);
        if let Some(song) = self.queue.current().cloned() {
            self.current_song = Some(song.clone());
            self.current_time = 0.0;
            self.is_playing = true;
            self.emit(PlaybackEvent::SongStarted(song));
        }
    }

    pub fn play_next(&mut self) {
        if self.queue.is_empty() {
            self.is_playing = false;
            return;
        }

        let next = self.queue.index() + 1;
        if next < self.queue.len() {
            self.start_at(next);
        } else if self.config.repeat == RepeatMode::All {
            self.start_at(0);
        } else {
            self.is_playing = false;
        }
    }

    pub fn play_previous(&mut self) {
        if self.current_time > RESTART_THRESHOLD_SECS {
            self.current_time = 0.0;
            return;
        }

        let index = self.queue.index();
        if index > 0 {
            self.start_at(index - 1);
        } else {
            self.current_time = 0.0;
        }
    }

    pub fn toggle_shuffle(&mut self) {
        self.config.shuffle = !self.config.shuffle;

        if self.config.shuffle {
            self.queue.shuffle();
        } else {
            self.queue.unshuffle();
        }

        match &self.current_song {
            Some(song) => self.queue.relocate(&song.id),
            None => self.queue.set_index(0),
        }
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.config.repeat = self.config.repeat.cycle();
        self.config.repeat
    }

    /// Called when the current track reaches its natural end.
    pub fn handle_song_end(&mut self) {
        if self.config.repeat == RepeatMode::One {
            self.current_time = 0.0;
            self.is_playing = true;
        } else {
            self.play_next();
        }
    }

    /// Empties the queue. Whatever is playing carries on.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    pub fn update_equalizer(&mut self, patch: EqualizerPatch) {
        self.config.equalizer.apply(patch);
    }

    /// Selects a preset, loading its band gains unless it is `custom`.
    pub fn apply_equalizer_preset(&mut self, preset: EqualizerPreset) {
        let (bass, mid, treble) = match preset.gains() {
            Some((bass, mid, treble)) => (Some(bass), Some(mid), Some(treble)),
            None => (None, None, None),
        };
        self.config.equalizer.apply(EqualizerPatch {
            preset: Some(preset),
            bass,
            mid,
            treble,
            ..Default::default()
        });
    }

    pub fn update_crossfade(&mut self, patch: CrossfadePatch) {
        self.config.crossfade.apply(patch);
    }

    pub fn set_sleep_timer(&mut self, minutes: Option<u32>) {
        self.config.sleep_timer_minutes = minutes;
    }

    /// Counts the sleep timer down by a minute. Returns `true` when it ran
    /// out, in which case playback was paused and the timer cleared.
    pub fn tick_sleep_timer(&mut self) -> bool {
        match self.config.sleep_timer_minutes {
            Some(minutes) if minutes > 1 => {
                self.config.sleep_timer_minutes = Some(minutes - 1);
                false
            }
            Some(_) => {
                self.config.sleep_timer_minutes = None;
                self.pause();
                tracing::info!("Sleep timer expired, playback paused");
                true
            }
            None => false,
        }
    }

    pub fn set_quality(&mut self, quality: AudioQuality) {
        self.config.quality = quality;
    }

    pub fn set_data_saver(&mut self, enabled: bool) {
        self.config.data_saver = enabled;
    }

    pub fn state(&self) -> TransportState {
        match (&self.current_song, self.is_playing) {
            (None, _) => TransportState::Stopped,
            (Some(_), true) => TransportState::Playing,
            (Some(_), false) => TransportState::Paused,
        }
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current_song.as_ref()
    }

    pub fn queue(&self) -> &[Song] {
        self.queue.songs()
    }

    pub fn original_queue(&self) -> &[Song] {
        self.queue.original()
    }

    pub fn current_index(&self) -> usize {
        self.queue.index()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn config(&self) -> &PlaybackConfiguration {
        &self.config
    }
}
