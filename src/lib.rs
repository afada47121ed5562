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

//! # riffline
//!
//! The client-side core of a social music player: a playback engine and an
//! offline music library.
//!
//! * [`player`] holds what is playing and how. It emits an event whenever a
//!   song starts, and [`player::tracker`] records those plays off the main
//!   thread.
//! * [`catalog`] finds audio on this device and stores it in the local
//!   store ([`db`]).
//! * [`library`] merges online, downloaded and local songs into one view.
//! * [`app::App`] wires all of the above together from an
//!   [`config::AppConfig`].

pub mod app;
pub mod catalog;
pub mod config;
pub mod db;
pub mod library;
pub mod model;
pub mod player;
pub mod remote;
pub mod util;
