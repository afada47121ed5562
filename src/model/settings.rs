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

//! Playback configuration.
//!
//! Every field here is independent of the others and of the queue. Setters
//! on the engine change exactly the fields they name.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

impl RepeatMode {
    /// The next mode in the fixed `off -> one -> all -> off` cycle.
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        })
    }
}

impl FromStr for RepeatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(RepeatMode::Off),
            "one" => Ok(RepeatMode::One),
            "all" => Ok(RepeatMode::All),
            other => Err(format!("unknown repeat mode: {other}")),
        }
    }
}

/// The discrete set of supported playback rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    Half,
    ThreeQuarters,
    #[default]
    Normal,
    OneAndAQuarter,
    OneAndAHalf,
    Double,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 6] = [
        PlaybackSpeed::Half,
        PlaybackSpeed::ThreeQuarters,
        PlaybackSpeed::Normal,
        PlaybackSpeed::OneAndAQuarter,
        PlaybackSpeed::OneAndAHalf,
        PlaybackSpeed::Double,
    ];

    pub fn rate(self) -> f64 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::ThreeQuarters => 0.75,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::OneAndAQuarter => 1.25,
            PlaybackSpeed::OneAndAHalf => 1.5,
            PlaybackSpeed::Double => 2.0,
        }
    }

    /// Looks up the speed with exactly this rate.
    pub fn from_rate(rate: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.rate() == rate)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EqualizerPreset {
    #[default]
    Flat,
    BassBoost,
    Vocal,
    TrebleBoost,
    Rock,
    Custom,
}

impl EqualizerPreset {
    /// Band gains in dB as `(bass, mid, treble)`, `None` for [`Custom`].
    ///
    /// [`Custom`]: EqualizerPreset::Custom
    pub fn gains(self) -> Option<(f32, f32, f32)> {
        match self {
            EqualizerPreset::Flat => Some((0.0, 0.0, 0.0)),
            EqualizerPreset::BassBoost => Some((6.0, 0.0, -1.0)),
            EqualizerPreset::Vocal => Some((-2.0, 4.0, 1.0)),
            EqualizerPreset::TrebleBoost => Some((-1.0, 0.0, 6.0)),
            EqualizerPreset::Rock => Some((4.0, -1.0, 3.0)),
            EqualizerPreset::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EqualizerSettings {
    pub enabled: bool,
    pub preset: EqualizerPreset,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

/// A partial update to [`EqualizerSettings`], `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EqualizerPatch {
    pub enabled: Option<bool>,
    pub preset: Option<EqualizerPreset>,
    pub bass: Option<f32>,
    pub mid: Option<f32>,
    pub treble: Option<f32>,
}

impl EqualizerSettings {
    pub fn apply(&mut self, patch: EqualizerPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(preset) = patch.preset {
            self.preset = preset;
        }
        if let Some(bass) = patch.bass {
            self.bass = bass;
        }
        if let Some(mid) = patch.mid {
            self.mid = mid;
        }
        if let Some(treble) = patch.treble {
            self.treble = treble;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossfadeSettings {
    pub enabled: bool,
    pub seconds: f32,
}

impl Default for CrossfadeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            seconds: 3.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossfadePatch {
    pub enabled: Option<bool>,
    pub seconds: Option<f32>,
}

impl CrossfadeSettings {
    pub fn apply(&mut self, patch: CrossfadePatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(seconds) = patch.seconds {
            self.seconds = seconds;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfiguration {
    pub volume: f64,
    pub speed: PlaybackSpeed,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub crossfade: CrossfadeSettings,
    pub sleep_timer_minutes: Option<u32>,
    pub equalizer: EqualizerSettings,
    pub quality: AudioQuality,
    pub data_saver: bool,
}

impl Default for PlaybackConfiguration {
    fn default() -> Self {
        Self {
            volume: 1.0,
            speed: PlaybackSpeed::default(),
            shuffle: false,
            repeat: RepeatMode::default(),
            crossfade: CrossfadeSettings::default(),
            sleep_timer_minutes: None,
            equalizer: EqualizerSettings::default(),
            quality: AudioQuality::default(),
            data_saver: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycles_through_all_modes() {
        let mut mode = RepeatMode::Off;
        let mut seen = vec![];
        for _ in 0..4 {
            mode = mode.cycle();
            seen.push(mode);
        }
        assert_eq!(
            seen,
            vec![RepeatMode::One, RepeatMode::All, RepeatMode::Off, RepeatMode::One]
        );
    }

    #[test]
    fn speed_lookup_only_accepts_known_rates() {
        assert_eq!(PlaybackSpeed::from_rate(1.5), Some(PlaybackSpeed::OneAndAHalf));
        assert_eq!(PlaybackSpeed::from_rate(1.1), None);
    }

    #[test]
    fn equalizer_patch_touches_named_fields_only() {
        let mut eq = EqualizerSettings {
            enabled: true,
            preset: EqualizerPreset::Rock,
            bass: 4.0,
            mid: -1.0,
            treble: 3.0,
        };
        eq.apply(EqualizerPatch {
            mid: Some(2.0),
            ..Default::default()
        });

        assert!(eq.enabled);
        assert_eq!(eq.preset, EqualizerPreset::Rock);
        assert_eq!((eq.bass, eq.mid, eq.treble), (4.0, 2.0, 3.0));
    }

    #[test]
    fn configuration_survives_json_with_missing_fields() {
        let config: PlaybackConfiguration =
            serde_json::from_str(r#"{"volume":0.4,"repeat":"all"}"#).unwrap();
        assert_eq!(config.volume, 0.4);
        assert_eq!(config.repeat, RepeatMode::All);
        assert_eq!(config.speed, PlaybackSpeed::Normal);
    }
}
