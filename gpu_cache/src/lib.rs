// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GPU Cache keeps the short-lived GPU images a renderer needs from frame to
//! frame: rasterized glyphs packed into shared atlases, and uploaded copies of
//! client textures.
//!
//! The renderer asks a [`GpuCache`] for the image of a glyph or texture at the
//! current frame's timestamp. Glyph misses are placed and queued for
//! rasterization; texture misses are uploaded by the caller and handed back
//! with [`GpuCache::cache_texture_image`]. Once per frame the renderer runs
//! [`GpuCache::gc`] (or [`GpuCache::maybe_gc`]), which ages out unused entries
//! and frees atlases that have become too sparse to be worth keeping.
//!
//! Client [`Texture`]s may be dropped on any thread. A dropped texture's copy
//! is never returned again and is freed by the next sweep.
//!
//! The device and the font are collaborators the cache does not implement;
//! see [`ImageAllocator`] and [`GlyphFont`].
//!
//! ## Example
//!
//! ```
//! use gpu_cache::{
//!     GlyphFont, GlyphKey, GpuCache, GpuImage, HintStyle, Hinting, ImageAllocator, InkRect,
//!     SubpixelFlags,
//! };
//!
//! #[derive(Clone, Debug)]
//! struct Image(u32, u32);
//!
//! impl GpuImage for Image {
//!     fn width(&self) -> u32 { self.0 }
//!     fn height(&self) -> u32 { self.1 }
//! }
//!
//! struct Device;
//!
//! impl ImageAllocator for Device {
//!     type Image = Image;
//!     fn create_atlas_image(&mut self, width: u32, height: u32) -> Image { Image(width, height) }
//!     fn create_upload_image(&mut self, width: u32, height: u32) -> Image { Image(width, height) }
//! }
//!
//! #[derive(Clone, PartialEq, Eq, Hash)]
//! struct Font;
//!
//! impl GlyphFont for Font {
//!     fn hint_style(&self) -> HintStyle { HintStyle::None }
//!     fn hint_metrics(&self) -> bool { false }
//!     fn ink_rect(&self, _glyph: u32, _hinting: Hinting) -> InkRect {
//!         // 8x10 pixels, sitting on the baseline.
//!         InkRect { x: 0, y: -10 * 1024, width: 8 * 1024, height: 10 * 1024 }
//!     }
//! }
//!
//! let mut cache = GpuCache::new();
//! let key = GlyphKey::new(Font, 42, SubpixelFlags::NONE, 1.0);
//!
//! let glyph = cache.glyph_image(&mut Device, &key, 0);
//! assert_eq!((glyph.bounds.width, glyph.bounds.height), (8, 10));
//! assert_eq!(cache.take_pending_uploads().len(), 1);
//!
//! // The second lookup is served from the atlas.
//! assert_eq!(cache.glyph_image(&mut Device, &key, 1).bounds, glyph.bounds);
//! assert!(cache.take_pending_uploads().is_empty());
//!
//! cache.gc(60, 2);
//! ```

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

mod arena;
mod atlas;
mod cache;
mod config;
mod device;
mod entry;
mod error;
mod glyph;
mod stats;
mod texture;

pub use atlas::{AtlasAllocator, Slice, round_up_slice_height};
pub use cache::GpuCache;
pub use config::{ATLAS_SIZE, CacheConfig, MAX_ATLAS_ITEM_SIZE, MAX_SLICES_PER_ATLAS};
pub use device::{GpuImage, ImageAllocator};
pub use error::{Error, ErrorKind};
pub use glyph::{
    AtlasRect, FONT_UNITS_PER_PIXEL, GLYPH_PADDING, GlyphFont, GlyphImage, GlyphKey, GlyphOrigin,
    GlyphUpload, HintStyle, Hinting, InkRect, SubpixelFlags,
};
pub use stats::{AtlasStats, CacheStats};
pub use texture::{Texture, TextureId};
