// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions and types shared across tests.

mod device;
mod font;

pub(crate) use device::{TestDevice, TestImage};
pub(crate) use font::{TestFont, glyph};

use gpu_cache::{CacheConfig, GpuCache};

pub(crate) type TestCache = GpuCache<TestImage, TestFont>;

/// A cache with the default configuration.
pub(crate) fn cache() -> TestCache {
    GpuCache::new()
}

/// A cache with a custom configuration, which must be valid.
pub(crate) fn cache_with(config: CacheConfig) -> TestCache {
    GpuCache::with_config(config).expect("test configuration is valid")
}
