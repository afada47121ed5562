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

//! # riffline command line.
//!
//! A headless front end for the music library and playback engine.
//!
//! Each invocation follows the same setup-run-teardown pattern: build the
//! [`App`] from the saved configuration, run one command against it, then
//! shut it down so playback settings are saved and pending plays are
//! recorded.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use riffline::{
    app::App,
    catalog::{self, CatalogError, DiscoveryMode},
    config::{self, AppConfig},
    library,
    model::{
        Song, SongSource,
        search::{search, stats},
        settings::{
            AudioQuality, CrossfadePatch, EqualizerPatch, EqualizerPreset, PlaybackSpeed,
            RepeatMode,
        },
    },
    util::format::{format_time, library_line, song_label},
};

const LOG_ENV: &str = "RIFFLINE_LOG";

#[derive(Parser, Debug)]
#[command(name = "riffline", version, about = "Offline music library and player")]
struct Cli {
    /// Act as this user instead of the configured one.
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover audio on this device, optionally in a chosen folder.
    Scan {
        #[arg(long)]
        folder: Option<PathBuf>,
    },

    /// Re-run discovery the way it last succeeded.
    Sync,

    /// Import individual audio files.
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the unified library.
    Library {
        #[arg(long)]
        source: Option<SongSource>,
    },

    Search {
        term: String,
    },

    Stats,

    /// Save an online song for offline playback.
    Download {
        id: String,
    },

    /// Remove a local song or a download.
    Remove {
        id: String,
    },

    /// Remove every local song and forget the music folder.
    Clear,

    /// Queue matching songs and start playing.
    Play {
        /// Songs to queue, everything when omitted.
        term: Option<String>,

        #[arg(long)]
        shuffle: bool,

        #[arg(long)]
        repeat: Option<RepeatMode>,

        /// Skip forward this many songs after starting.
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },

    /// Show or change the saved playback settings.
    Settings {
        #[arg(long)]
        volume: Option<f64>,

        #[arg(long, value_parser = parse_speed)]
        speed: Option<PlaybackSpeed>,

        #[arg(long, value_parser = parse_enum::<EqualizerPreset>)]
        equalizer: Option<EqualizerPreset>,

        #[arg(long)]
        equalizer_enabled: Option<bool>,

        /// Crossfade seconds, 0 turns crossfade off.
        #[arg(long)]
        crossfade: Option<f32>,

        /// Minutes until playback pauses, 0 clears the timer.
        #[arg(long)]
        sleep: Option<u32>,

        #[arg(long, value_parser = parse_enum::<AudioQuality>)]
        quality: Option<AudioQuality>,

        #[arg(long)]
        data_saver: Option<bool>,
    },

    /// Show where the configuration file lives, optionally changing it.
    Config {
        /// Add a directory to scan alongside the well-known ones.
        #[arg(long)]
        add_media_dir: Vec<PathBuf>,

        #[arg(long, value_parser = parse_enum::<DiscoveryMode>)]
        discovery: Option<DiscoveryMode>,
    },
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let mut config = config::load_config();

    let command = match cli.command {
        Command::Config {
            add_media_dir,
            discovery,
        } => return edit_config(config, add_media_dir, discovery),
        command => command,
    };

    if cli.user.is_some() {
        config.user_id = cli.user.clone();
    }

    let mut app = App::new(config)?;
    let result = run(&mut app, command);
    let shutdown = app.shutdown();

    result.and(shutdown)
}

/// Sets up `tracing` output on stderr, filtered by `RIFFLINE_LOG`.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Scan { folder } => scan(app, folder),
        Command::Sync => {
            let settings = app.catalog_settings();
            let count = catalog::auto_sync(&mut app.conn, &mut app.handles, &settings);
            println!("Synced {count} songs");
            Ok(())
        }
        Command::Import { files } => {
            let timeout = app.catalog_settings().metadata_timeout;
            let songs = catalog::import_files(&mut app.conn, &mut app.handles, &files, timeout)?;
            for song in &songs {
                println!("{}", song_label(&song.song));
            }
            println!("Imported {} songs", songs.len());
            Ok(())
        }
        Command::Library { source } => {
            let library = app.library();
            let songs = match source {
                Some(source) => library.by_source(source),
                None => library.all.as_slice(),
            };
            for entry in songs {
                println!("{}", library_line(entry));
            }
            Ok(())
        }
        Command::Search { term } => {
            let library = app.library();
            for entry in search(&library.all, &term) {
                println!("{}", library_line(entry));
            }
            Ok(())
        }
        Command::Stats => {
            print_stats(app);
            Ok(())
        }
        Command::Download { id } => download(app, &id),
        Command::Remove { id } => remove(app, &id),
        Command::Clear => {
            let removed = catalog::clear_local_songs(&app.conn, &mut app.handles)?;
            println!("Removed {removed} local songs");
            Ok(())
        }
        Command::Play {
            term,
            shuffle,
            repeat,
            skip,
        } => play(app, term.as_deref(), shuffle, repeat, skip),
        Command::Settings {
            volume,
            speed,
            equalizer,
            equalizer_enabled,
            crossfade,
            sleep,
            quality,
            data_saver,
        } => {
            let engine = &mut app.engine;
            if let Some(volume) = volume {
                engine.set_volume(volume.clamp(0.0, 1.0));
            }
            if let Some(speed) = speed {
                engine.set_playback_speed(speed);
            }
            if let Some(preset) = equalizer {
                engine.apply_equalizer_preset(preset);
            }
            if let Some(enabled) = equalizer_enabled {
                engine.update_equalizer(EqualizerPatch {
                    enabled: Some(enabled),
                    ..Default::default()
                });
            }
            if let Some(seconds) = crossfade {
                engine.update_crossfade(CrossfadePatch {
                    enabled: Some(seconds > 0.0),
                    seconds: (seconds > 0.0).then_some(seconds),
                });
            }
            if let Some(minutes) = sleep {
                engine.set_sleep_timer((minutes > 0).then_some(minutes));
            }
            if let Some(quality) = quality {
                engine.set_quality(quality);
            }
            if let Some(enabled) = data_saver {
                engine.set_data_saver(enabled);
            }

            println!("{}", serde_json::to_string_pretty(engine.config())?);
            Ok(())
        }
        Command::Config { .. } => Ok(()),
    }
}

fn scan(app: &mut App, folder: Option<PathBuf>) -> Result<()> {
    let settings = app.catalog_settings();
    let folder = folder.map(|f| f.canonicalize().unwrap_or(f));
    let provider = catalog::probe_provider(&app.conn, &settings, folder);

    match catalog::discover(&mut app.conn, &mut app.handles, provider.as_ref()) {
        Ok(songs) => {
            for song in &songs {
                println!("{}", song_label(&song.song));
            }
            println!("Found {} songs", songs.len());
            Ok(())
        }
        Err(CatalogError::NoAudioFiles(place)) => {
            println!("No audio files found in {place}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn download(app: &mut App, id: &str) -> Result<()> {
    let library = app.library();
    let Some(entry) = library.find(id) else {
        bail!("No song with id {id} in the library");
    };
    if entry.source != SongSource::Online {
        bail!("'{}' is already available offline", entry.song.title);
    }

    let dir = app.config.downloads_path();
    let saved = library::download_song(&mut app.conn, app.backend.as_ref(), &entry.song, &dir)?;
    if let Some(path) = &saved.path {
        println!("Saved to {}", path.display());
    }

    Ok(())
}

fn remove(app: &mut App, id: &str) -> Result<()> {
    if catalog::remove_local_song(&app.conn, &mut app.handles, id)? {
        println!("Removed local song {id}");
    } else if library::remove_download(&app.conn, id)? {
        println!("Removed download {id}");
    } else {
        bail!("No local song or download with id {id}");
    }

    Ok(())
}

fn play(
    app: &mut App,
    term: Option<&str>,
    shuffle: bool,
    repeat: Option<RepeatMode>,
    skip: usize,
) -> Result<()> {
    let library = app.library();
    let queue: Vec<Song> = search(&library.all, term.unwrap_or_default())
        .into_iter()
        .map(|entry| entry.song.clone())
        .collect();

    let Some(first) = queue.first().cloned() else {
        bail!("Nothing to play");
    };

    let engine = &mut app.engine;
    if let Some(repeat) = repeat {
        while engine.config().repeat != repeat {
            engine.cycle_repeat();
        }
    }
    if shuffle != engine.config().shuffle {
        engine.toggle_shuffle();
    }

    engine.play(first, Some(queue));
    for _ in 0..skip {
        engine.play_next();
    }

    match engine.current_song() {
        Some(song) if engine.is_playing() => println!(
            "Now playing: {} ({})",
            song_label(song),
            format_time(song.duration)
        ),
        _ => println!("Reached the end of the queue"),
    }

    println!("Repeat: {}", engine.config().repeat);

    let current = engine.current_index();
    for (index, song) in engine.queue().iter().enumerate() {
        let marker = if index == current { ">" } else { " " };
        println!("{marker} {:>3}. {}", index + 1, song_label(song));
    }

    Ok(())
}

/// Applies the requested changes and saves the configuration file.
fn edit_config(
    mut config: AppConfig,
    add_media_dirs: Vec<PathBuf>,
    discovery: Option<DiscoveryMode>,
) -> Result<()> {
    let mut changed = false;

    for dir in add_media_dirs {
        let dir = dir.canonicalize().unwrap_or(dir).to_string_lossy().into_owned();
        if !config.media_dirs.contains(&dir) {
            config.media_dirs.push(dir);
            changed = true;
        }
    }
    if let Some(mode) = discovery {
        changed |= config.discovery != mode;
        config.discovery = mode;
    }

    if changed {
        config::save_config(&config).context("Failed to save configuration")?;
        tracing::info!("Configuration saved");
    }

    let path = config::config_path().context("Failed to locate configuration file")?;
    println!("{}", path.display());

    Ok(())
}

fn print_stats(app: &App) {
    let library = app.library();
    let stats = stats(&library.all);

    println!("Songs:       {}", stats.total_songs);
    println!("  online:     {}", stats.online);
    println!("  downloaded: {}", stats.downloaded);
    println!("  local:      {}", stats.local);
    println!("Offline:     {}", stats.available_offline);
    println!("Duration:    {}", format_time(stats.total_duration));
    println!("Plays:       {}", stats.total_plays);
    println!("Likes:       {}", stats.total_likes);
    println!("Artists:     {}", stats.artists);
    println!("Albums:      {}", stats.albums);
    println!("Genres:      {}", stats.genres);
}

/// Parses a lowercase enum value the same way it is stored.
fn parse_enum<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|e| e.to_string())
}

fn parse_speed(value: &str) -> Result<PlaybackSpeed, String> {
    let rate: f64 = value.parse().map_err(|e| format!("{e}"))?;
    PlaybackSpeed::from_rate(rate).ok_or_else(|| {
        let allowed: Vec<String> = PlaybackSpeed::ALL.iter().map(|s| s.rate().to_string()).collect();
        format!("speed must be one of {}", allowed.join(", "))
    })
}
