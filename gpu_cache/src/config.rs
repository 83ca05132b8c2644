// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning knobs for the cache.

use crate::Error;

/// Side of every atlas image, in pixels.
pub const ATLAS_SIZE: u32 = 1024;

/// Largest padded item that will be packed into an atlas.
///
/// Anything larger gets a standalone image.
pub const MAX_ATLAS_ITEM_SIZE: u32 = 256;

/// Maximum number of slices (shelves) in a single atlas.
pub const MAX_SLICES_PER_ATLAS: usize = 64;

/// Options for a [`GpuCache`](crate::GpuCache).
///
/// The defaults are the values the cache was tuned with; changing the atlas
/// geometry mostly matters for tests and for devices with small texture limits.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CacheConfig {
    /// Side of every square atlas image.
    ///
    /// The default value is [`ATLAS_SIZE`].
    pub atlas_size: u32,
    /// Largest width or height, including padding, that is placed in an atlas.
    ///
    /// The default value is [`MAX_ATLAS_ITEM_SIZE`].
    pub max_atlas_item_size: u32,
    /// Number of slices an atlas can be divided into.
    ///
    /// The default value is [`MAX_SLICES_PER_ATLAS`].
    pub max_slices_per_atlas: usize,
    /// An atlas whose alive plus never allocated pixels drop below this share
    /// of its area is collected, no matter how recently it was used.
    ///
    /// The default value is 0.5.
    pub min_alive_pixels_ratio: f32,
    /// Multiplier applied to the timeout before the current atlas counts as idle.
    ///
    /// The default value is 4.
    pub atlas_idle_timeout_scale: u64,
    /// Timeout, in timestamp units, used by [`GpuCache::maybe_gc`].
    ///
    /// The default value is 900 (15 seconds of frames at 60 Hz).
    ///
    /// [`GpuCache::maybe_gc`]: crate::GpuCache::maybe_gc
    pub cache_timeout: u64,
    /// Amount of dead texture pixels that makes [`GpuCache::maybe_gc`] sweep
    /// before the timeout has passed.
    ///
    /// The default value is 1,000,000.
    ///
    /// [`GpuCache::maybe_gc`]: crate::GpuCache::maybe_gc
    pub max_dead_texture_pixels: usize,
    /// If true, every sweep dumps cache statistics at `debug` level.
    ///
    /// The default value is false.
    pub debug_stats: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            atlas_size: ATLAS_SIZE,
            max_atlas_item_size: MAX_ATLAS_ITEM_SIZE,
            max_slices_per_atlas: MAX_SLICES_PER_ATLAS,
            min_alive_pixels_ratio: 0.5,
            atlas_idle_timeout_scale: 4,
            cache_timeout: 900,
            max_dead_texture_pixels: 1_000_000,
            debug_stats: false,
        }
    }
}

impl CacheConfig {
    /// Checks that the configuration describes a usable atlas layout.
    pub fn validate(&self) -> Result<(), Error> {
        if self.atlas_size == 0 {
            return Err(Error::zero_atlas_size());
        }
        if self.max_atlas_item_size > self.atlas_size {
            return Err(Error::item_larger_than_atlas(
                self.max_atlas_item_size,
                self.atlas_size,
            ));
        }
        if self.max_slices_per_atlas == 0 {
            return Err(Error::zero_slices());
        }
        if !(0.0..=1.0).contains(&self.min_alive_pixels_ratio) {
            return Err(Error::invalid_alive_ratio(self.min_alive_pixels_ratio));
        }
        if self.atlas_idle_timeout_scale == 0 {
            return Err(Error::zero_idle_timeout_scale());
        }
        Ok(())
    }

    /// Number of pixels in one atlas.
    pub(crate) fn atlas_pixels(&self) -> usize {
        self.atlas_size as usize * self.atlas_size as usize
    }

    /// Alive plus remaining pixels below which an atlas is collected.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the product is bounded by the atlas area, which fits in usize"
    )]
    pub(crate) fn min_alive_pixels(&self) -> usize {
        (self.atlas_pixels() as f64 * f64::from(self.min_alive_pixels_ratio)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn default_config_is_valid() {
        let config = CacheConfig::default();
        assert!(config.validate().is_ok(), "defaults must validate");
        assert_eq!(config.atlas_pixels(), 1024 * 1024);
        assert_eq!(config.min_alive_pixels(), 1024 * 1024 / 2);
    }

    #[test]
    fn item_size_must_fit_the_atlas() {
        let config = CacheConfig {
            atlas_size: 128,
            ..CacheConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ItemLargerThanAtlas);
        assert_eq!(err.value(), 256.0);
        assert_eq!(err.limit(), Some(128.0));
    }

    #[test]
    fn ratio_must_be_a_fraction() {
        for ratio in [-0.1, 1.5, f32::NAN] {
            let config = CacheConfig {
                min_alive_pixels_ratio: ratio,
                ..CacheConfig::default()
            };
            assert_eq!(
                config.validate().map_err(|e| e.kind()),
                Err(ErrorKind::InvalidAliveRatio),
                "ratio {ratio} should be rejected"
            );
        }
    }

    #[test]
    fn zero_values_are_rejected() {
        let zero_slices = CacheConfig {
            max_slices_per_atlas: 0,
            ..CacheConfig::default()
        };
        assert_eq!(
            zero_slices.validate().map_err(|e| e.kind()),
            Err(ErrorKind::ZeroSlices)
        );

        let zero_scale = CacheConfig {
            atlas_idle_timeout_scale: 0,
            ..CacheConfig::default()
        };
        assert_eq!(
            zero_scale.validate().map_err(|e| e.kind()),
            Err(ErrorKind::ZeroIdleTimeoutScale)
        );
    }
}
