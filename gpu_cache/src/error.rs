// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Error returned when a [`CacheConfig`] cannot drive a cache.
///
/// Carries a non-exhaustive [`ErrorKind`] plus the offending value, so the
/// message can name what was rejected.
///
/// [`CacheConfig`]: crate::CacheConfig
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// The non-exhaustive category describing this error.
    kind: ErrorKind,

    /// The rejected value, widened to `f64` so ratios fit as well as sizes.
    value: f64,

    /// The limit the value was checked against, when there is one.
    limit: Option<f64>,
}

impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The rejected configuration value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The limit the value exceeded, if the check had one.
    pub fn limit(&self) -> Option<f64> {
        self.limit
    }

    pub(crate) fn zero_atlas_size() -> Self {
        Self {
            kind: ErrorKind::ZeroAtlasSize,
            value: 0.0,
            limit: None,
        }
    }

    pub(crate) fn item_larger_than_atlas(item_size: u32, atlas_size: u32) -> Self {
        Self {
            kind: ErrorKind::ItemLargerThanAtlas,
            value: f64::from(item_size),
            limit: Some(f64::from(atlas_size)),
        }
    }

    pub(crate) fn zero_slices() -> Self {
        Self {
            kind: ErrorKind::ZeroSlices,
            value: 0.0,
            limit: None,
        }
    }

    pub(crate) fn invalid_alive_ratio(ratio: f32) -> Self {
        Self {
            kind: ErrorKind::InvalidAliveRatio,
            value: f64::from(ratio),
            limit: Some(1.0),
        }
    }

    pub(crate) fn zero_idle_timeout_scale() -> Self {
        Self {
            kind: ErrorKind::ZeroIdleTimeoutScale,
            value: 0.0,
            limit: None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::ZeroAtlasSize => write!(f, "atlas size must not be zero"),
            ErrorKind::ItemLargerThanAtlas => match self.limit {
                Some(limit) => write!(
                    f,
                    "max atlas item size {} exceeds atlas size {}",
                    self.value, limit
                ),
                None => write!(f, "max atlas item size {} exceeds atlas size", self.value),
            },
            ErrorKind::ZeroSlices => write!(f, "an atlas needs room for at least one slice"),
            ErrorKind::InvalidAliveRatio => write!(
                f,
                "min alive pixels ratio {} is outside 0.0..=1.0",
                self.value
            ),
            ErrorKind::ZeroIdleTimeoutScale => {
                write!(f, "atlas idle timeout scale must not be zero")
            }
        }
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// `atlas_size` was zero.
    ZeroAtlasSize,

    /// `max_atlas_item_size` was larger than `atlas_size`.
    ItemLargerThanAtlas,

    /// `max_slices_per_atlas` was zero.
    ZeroSlices,

    /// `min_alive_pixels_ratio` was negative, above one, or NaN.
    InvalidAliveRatio,

    /// `atlas_idle_timeout_scale` was zero.
    ZeroIdleTimeoutScale,
}
