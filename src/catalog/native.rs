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

//! Native platform discovery.
//!
//! Walks the well-known Music, Download and Documents directories (plus any
//! configured media directories) and catalogues every file with an allowed
//! audio extension. Names come from the filename alone and duration is left
//! unknown, so a native scan never opens the files it finds.

use std::{collections::HashSet, path::PathBuf};

use crate::{
    catalog::{
        CatalogError, DiscoveryKind, DiscoveryProvider, ScanProgress,
        handles::SessionHandles,
        metadata::{self, ExtractedMetadata},
        platform::{LocalFilesystem, PlatformAccess},
    },
    model::LocalSong,
};

/// Default depth for walking well-known directories.
pub const NATIVE_SCAN_DEPTH: usize = 5;

pub struct NativeScanProvider {
    roots: Vec<PathBuf>,
    max_depth: usize,
    platform: Box<dyn PlatformAccess>,
}

impl NativeScanProvider {
    pub fn new(roots: Vec<PathBuf>, max_depth: usize) -> Self {
        Self::with_platform(roots, max_depth, Box::new(LocalFilesystem))
    }

    pub fn with_platform(
        roots: Vec<PathBuf>,
        max_depth: usize,
        platform: Box<dyn PlatformAccess>,
    ) -> Self {
        Self {
            roots,
            max_depth,
            platform,
        }
    }

    /// The user's Music, Download and Documents directories followed by
    /// `extra`, without duplicates.
    pub fn well_known_roots(extra: &[PathBuf]) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        let candidates = [dirs::audio_dir(), dirs::download_dir(), dirs::document_dir()]
            .into_iter()
            .flatten()
            .chain(extra.iter().cloned());

        for root in candidates {
            if !roots.contains(&root) {
                roots.push(root);
            }
        }

        roots
    }
}

impl DiscoveryProvider for NativeScanProvider {
    fn kind(&self) -> DiscoveryKind {
        DiscoveryKind::Native
    }

    /// Scans every root. Roots that cannot be listed are skipped, and finding
    /// nothing at all is an empty result rather than an error.
    fn discover(
        &self,
        _handles: &mut SessionHandles,
        progress: &mut ScanProgress,
    ) -> Result<Vec<LocalSong>, CatalogError> {
        self.platform.ensure_storage_permission(&self.roots)?;

        progress.prepare_scan(&self.roots);

        let mut seen = HashSet::new();
        let mut songs = Vec::new();

        for root in &self.roots {
            progress.begin_scan_directory(root);

            let files = match self.platform.enumerate(root, self.max_depth) {
                Ok(files) => files,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", root.display(), e);
                    progress.end_scan_directory();
                    continue;
                }
            };

            let mut count = 0;
            for path in files.into_iter().filter(|p| metadata::is_audio_extension(p)) {
                let Some(url) = self.platform.playable_url(&path) else {
                    tracing::warn!("No playable URL for {}", path.display());
                    continue;
                };

                let song = metadata::build_local_song(&path, url, ExtractedMetadata::default());
                if seen.insert(song.song.id.clone()) {
                    songs.push(song);
                    count += 1;
                    progress.update_scan_directory(count);
                }
            }

            progress.end_scan_directory();
        }

        progress.finish_scan();

        Ok(songs)
    }
}
