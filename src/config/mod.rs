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

//! Application configuration.
//!
//! This module manages the application configuration file. Everything the
//! user may want to change between runs lives here; playback settings are
//! separate and kept in the local store, see [`crate::db`].

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::catalog::{
    CatalogSettings, DiscoveryMode, native::NATIVE_SCAN_DEPTH, picker::PICKER_SCAN_DEPTH,
};

const CONFIG_NAME: &str = "riffline";

const DATABASE_FILE: &str = "riffline.db";

const DOWNLOADS_DIR: &str = "downloads";

/// Connection details for the hosted backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,
    pub media_dirs: Vec<String>,
    pub database_file: Option<String>,
    pub downloads_dir: Option<String>,
    pub discovery: DiscoveryMode,
    pub native_scan_depth: usize,
    pub picker_scan_depth: usize,
    pub metadata_timeout_ms: u64,
    pub backend: Option<BackendConfig>,
    pub user_id: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 2,
            media_dirs: vec![],
            database_file: None,
            downloads_dir: None,
            discovery: DiscoveryMode::Auto,
            native_scan_depth: NATIVE_SCAN_DEPTH,
            picker_scan_depth: PICKER_SCAN_DEPTH,
            metadata_timeout_ms: 3000,
            backend: None,
            user_id: None,
        }
    }
}

impl AppConfig {
    pub fn catalog_settings(&self) -> CatalogSettings {
        CatalogSettings {
            mode: self.discovery,
            media_dirs: self.media_dirs.iter().map(PathBuf::from).collect(),
            native_depth: self.native_scan_depth,
            picker_depth: self.picker_scan_depth,
            metadata_timeout: Duration::from_millis(self.metadata_timeout_ms),
        }
    }

    /// The local store, by default in the user's data directory.
    pub fn database_path(&self) -> PathBuf {
        match &self.database_file {
            Some(file) => PathBuf::from(file),
            None => data_dir().join(DATABASE_FILE),
        }
    }

    pub fn downloads_path(&self) -> PathBuf {
        match &self.downloads_dir {
            Some(dir) => PathBuf::from(dir),
            None => data_dir().join(DOWNLOADS_DIR),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(CONFIG_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn load_config() -> AppConfig {
    confy::load(CONFIG_NAME, None).unwrap_or_else(|e| {
        tracing::warn!("Could not load configuration, using defaults: {}", e);
        AppConfig::default()
    })
}

pub fn save_config(cfg: &AppConfig) -> Result<(), confy::ConfyError> {
    confy::store(CONFIG_NAME, None, cfg)
}

pub fn config_path() -> Result<PathBuf, confy::ConfyError> {
    confy::get_configuration_file_path(CONFIG_NAME, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_win_over_defaults() {
        let cfg = AppConfig {
            database_file: Some("/tmp/r/store.db".into()),
            downloads_dir: Some("/tmp/r/dl".into()),
            ..Default::default()
        };

        assert_eq!(cfg.database_path(), PathBuf::from("/tmp/r/store.db"));
        assert_eq!(cfg.downloads_path(), PathBuf::from("/tmp/r/dl"));
    }

    #[test]
    fn default_paths_share_a_directory() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.database_path().parent(), cfg.downloads_path().parent());
    }

    #[test]
    fn catalog_settings_carry_configured_values() {
        let cfg = AppConfig {
            media_dirs: vec!["/srv/music".into()],
            discovery: DiscoveryMode::Native,
            native_scan_depth: 2,
            metadata_timeout_ms: 500,
            ..Default::default()
        };

        let settings = cfg.catalog_settings();

        assert_eq!(settings.mode, DiscoveryMode::Native);
        assert_eq!(settings.media_dirs, vec![PathBuf::from("/srv/music")]);
        assert_eq!(settings.native_depth, 2);
        assert_eq!(settings.picker_depth, PICKER_SCAN_DEPTH);
        assert_eq!(settings.metadata_timeout, Duration::from_millis(500));
    }

    #[test]
    fn older_config_files_still_load() {
        let cfg: AppConfig = serde_json::from_str(r#"{"version":1,"media_dirs":["/m"]}"#).unwrap();

        assert_eq!(cfg.media_dirs, vec!["/m".to_string()]);
        assert_eq!(cfg.discovery, DiscoveryMode::Auto);
        assert!(cfg.backend.is_none());
    }
}
