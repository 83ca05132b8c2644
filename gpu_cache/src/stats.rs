// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostic snapshots of the cache.

/// Counts of what a cache holds, taken by [`GpuCache::stats`].
///
/// [`GpuCache::stats`]: crate::GpuCache::stats
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CacheStats {
    /// Cached glyphs, stale or not.
    pub glyphs: usize,
    /// Glyphs marked stale by a sweep and not looked up since.
    pub stale_glyphs: usize,
    /// Glyphs too large for an atlas, living in their own image.
    pub standalone_glyphs: usize,
    /// Cached texture copies.
    pub textures: usize,
    /// Texture copies whose texture was destroyed, waiting for the next sweep.
    pub tombstoned_textures: usize,
    /// One entry per atlas, oldest first.
    pub atlases: Vec<AtlasStats>,
    /// Texture pixels that died since the last sweep.
    pub dead_texture_pixels: usize,
}

/// Occupancy of a single atlas.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AtlasStats {
    /// Area of the atlas.
    pub total_pixels: usize,
    /// Pixels of non-stale entries placed on the atlas.
    pub alive_pixels: usize,
    /// Pixels never handed out.
    pub remaining_pixels: usize,
    /// Number of slices created so far.
    pub slices: usize,
    /// Whether new glyphs go to this atlas.
    pub is_current: bool,
}

impl AtlasStats {
    /// Share of the atlas holding live entries.
    pub fn occupancy(&self) -> f64 {
        ratio(self.alive_pixels, self.total_pixels)
    }

    /// Share of the atlas that is either live or still free.
    ///
    /// Atlases whose reachable share falls below the configured minimum are
    /// collected by the next sweep.
    pub fn reachable_ratio(&self) -> f64 {
        ratio(self.alive_pixels + self.remaining_pixels, self.total_pixels)
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

impl CacheStats {
    /// Writes the snapshot to the `debug` log.
    pub(crate) fn log(&self) {
        log::debug!(
            "gpu cache: {} glyphs ({} stale, {} standalone), {} textures ({} tombstoned), {} dead texture pixels",
            self.glyphs,
            self.stale_glyphs,
            self.standalone_glyphs,
            self.textures,
            self.tombstoned_textures,
            self.dead_texture_pixels,
        );
        for (index, atlas) in self.atlases.iter().enumerate() {
            log::debug!(
                "  atlas {index}{}: {} slices, {:.0}% alive, {:.0}% reachable",
                if atlas.is_current { " (current)" } else { "" },
                atlas.slices,
                atlas.occupancy() * 100.0,
                atlas.reachable_ratio() * 100.0,
            );
        }
    }
}
