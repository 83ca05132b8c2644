// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The records kept in the cache's entry list.

use std::sync::Arc;

use crate::arena::EntryId;
use crate::atlas::AtlasAllocator;
use crate::glyph::{AtlasRect, GlyphKey, GlyphOrigin};
use crate::texture::{TextureId, TextureShared};

/// One cached resource and its place in the entry list.
pub(crate) struct CachedEntry<I, F> {
    pub(crate) prev: Option<EntryId>,
    pub(crate) next: Option<EntryId>,
    /// Atlas whose pixels this entry lives on.
    pub(crate) atlas: Option<EntryId>,
    /// Last time the entry was looked up or allocated from.
    pub(crate) timestamp: u64,
    pub(crate) stale: bool,
    /// For atlases, the pixels of all non-stale entries placed on them.
    /// For everything else, the pixels the entry occupies.
    pub(crate) pixels: usize,
    pub(crate) kind: EntryKind<I, F>,
}

pub(crate) enum EntryKind<I, F> {
    Atlas {
        image: I,
        allocator: AtlasAllocator,
    },
    Texture {
        texture: TextureId,
        image: I,
        shared: Arc<TextureShared>,
    },
    Glyph {
        key: GlyphKey<F>,
        image: I,
        bounds: AtlasRect,
        origin: GlyphOrigin,
    },
}

impl<I, F> CachedEntry<I, F> {
    pub(crate) fn new(kind: EntryKind<I, F>, atlas: Option<EntryId>, pixels: usize, timestamp: u64) -> Self {
        Self {
            prev: None,
            next: None,
            atlas,
            timestamp,
            stale: false,
            pixels,
            kind,
        }
    }

    /// Whether the entry went unused for longer than `timeout`.
    ///
    /// Timestamps older than the entry's own count as age 0.
    pub(crate) fn is_older_than(&self, timeout: u64, timestamp: u64) -> bool {
        timestamp.saturating_sub(self.timestamp) > timeout
    }
}
