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

//! Play queue management.
//!
//! This module provides state for the player queue: the active sequence the
//! player moves through, the original order used to undo a shuffle, and the
//! index of the current entry within the active sequence.

use rand::{rng, seq::SliceRandom};

use crate::model::Song;

#[derive(Debug, Clone, Default)]
pub struct Queue {
    active: Vec<Song>,
    original: Vec<Song>,
    index: usize,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces both sequences. The active sequence is a fresh permutation
    /// when `shuffled` is set.
    pub fn replace(&mut self, songs: Vec<Song>, shuffled: bool) {
        self.active = songs.clone();
        if shuffled {
            self.active.shuffle(&mut rng());
        }
        self.original = songs;
        self.index = 0;
    }

    pub fn push(&mut self, song: Song) {
        self.original.push(song.clone());
        self.active.push(song);
    }

    /// Removes the active entry at `index` and the first original entry with
    /// the same id. Returns the removed song.
    pub fn remove(&mut self, index: usize) -> Option<Song> {
        if index >= self.active.len() {
            return None;
        }

        let removed = self.active.remove(index);
        if let Some(pos) = self.original.iter().position(|s| s.id == removed.id) {
            self.original.remove(pos);
        }

        if index < self.index {
            self.index -= 1;
        }
        self.clamp_index();

        Some(removed)
    }

    /// Moves an active entry, keeping the index on the same logical song.
    /// The original order is left as it was.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.active.len();
        if from >= len || to >= len || from == to {
            return false;
        }

        let song = self.active.remove(from);
        self.active.insert(to, song);

        if self.index == from {
            self.index = to;
        } else if from < self.index && self.index <= to {
            self.index -= 1;
        } else if to <= self.index && self.index < from {
            self.index += 1;
        }

        true
    }

    /// Replaces the active sequence with a Fisher-Yates permutation of the
    /// original order.
    pub fn shuffle(&mut self) {
        let mut shuffled = self.original.clone();
        shuffled.shuffle(&mut rng());
        self.active = shuffled;
    }

    /// Restores the active sequence to the original order verbatim.
    pub fn unshuffle(&mut self) {
        self.active = self.original.clone();
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.original.clear();
        self.index = 0;
    }

    /// Points the index at the song with `id`, or at the start when absent.
    pub fn relocate(&mut self, id: &str) {
        self.index = self.position_of(id).unwrap_or(0);
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.active.iter().position(|s| s.id == id)
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
        self.clamp_index();
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Song> {
        self.active.get(self.index)
    }

    pub fn songs(&self) -> &[Song] {
        &self.active
    }

    pub fn original(&self) -> &[Song] {
        &self.original
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn clamp_index(&mut self) {
        if self.active.is_empty() {
            self.index = 0;
        } else if self.index >= self.active.len() {
            self.index = self.active.len() - 1;
        }
    }
}
