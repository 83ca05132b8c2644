// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cache façade: lookups, insertion and the generational sweep.

use core::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::HashMap;

use crate::arena::{Arena, EntryId};
use crate::atlas::AtlasAllocator;
use crate::config::CacheConfig;
use crate::device::{GpuImage, ImageAllocator};
use crate::entry::{CachedEntry, EntryKind};
use crate::error::Error;
use crate::glyph::{
    AtlasRect, GLYPH_PADDING, GlyphFont, GlyphImage, GlyphKey, GlyphOrigin, GlyphUpload, Hinting,
    PixelBounds,
};
use crate::stats::{AtlasStats, CacheStats};
use crate::texture::{CacheId, Texture, TextureId, TextureShared};

/// Cache of GPU images for glyphs and client textures.
///
/// Every cached resource is an entry in a single list. Glyphs are packed into
/// shared atlas images, or get their own image when they are too large;
/// textures are cached as whole uploaded copies. Entries are reclaimed by
/// [`GpuCache::gc`], which the owner runs once per frame (or through
/// [`GpuCache::maybe_gc`]) with a monotonically increasing timestamp.
///
/// The cache itself is used from one thread. The only operation allowed
/// elsewhere is dropping a [`Texture`], which updates the cache through
/// atomics.
pub struct GpuCache<I, F> {
    id: CacheId,
    config: CacheConfig,
    entries: Arena<CachedEntry<I, F>>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    glyphs: HashMap<GlyphKey<F>, EntryId>,
    /// Textures whose slot could not hold this cache's entry.
    textures: HashMap<TextureId, EntryId>,
    current_atlas: Option<EntryId>,
    dead_texture_pixels: Arc<AtomicUsize>,
    pending_uploads: Vec<GlyphUpload<I, F>>,
    last_gc: u64,
}

impl<I, F> GpuCache<I, F>
where
    I: GpuImage + Clone,
    F: GlyphFont,
{
    /// Creates a cache with the default configuration.
    pub fn new() -> Self {
        Self::with_valid_config(CacheConfig::default())
    }

    /// Creates a cache with a custom configuration.
    pub fn with_config(config: CacheConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: CacheConfig) -> Self {
        Self {
            id: CacheId::new(),
            config,
            entries: Arena::new(),
            head: None,
            tail: None,
            glyphs: HashMap::new(),
            textures: HashMap::new(),
            current_atlas: None,
            dead_texture_pixels: Arc::new(AtomicUsize::new(0)),
            pending_uploads: Vec::new(),
            last_gc: 0,
        }
    }

    /// The configuration the cache was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the image holding the glyph described by `key`.
    ///
    /// On a miss the glyph is measured, placed in the current atlas (or a new
    /// one, or a standalone image if it is too large), and a [`GlyphUpload`]
    /// is queued; the caller must perform the queued uploads before sampling
    /// the returned image. Repeated lookups of a key return the same result
    /// until the glyph is collected.
    pub fn glyph_image<D>(
        &mut self,
        device: &mut D,
        key: &GlyphKey<F>,
        timestamp: u64,
    ) -> GlyphImage<I>
    where
        D: ImageAllocator<Image = I>,
    {
        if let Some(&id) = self.glyphs.get(key) {
            if let Some(hit) = self.glyph_hit(id, timestamp) {
                return hit;
            }
        }

        let hinting = Hinting::for_font(&key.font);
        let ink = key.font.ink_rect(key.glyph, hinting);
        let px = PixelBounds::new(ink, key.scale(), key.flags);

        let padded_width = px.width + 2 * GLYPH_PADDING;
        let padded_height = px.height + 2 * GLYPH_PADDING;
        let (image, bounds, atlas, padding) =
            match self.allocate_in_atlas(device, padded_width, padded_height, timestamp) {
                Some((atlas, image, x, y)) => {
                    let bounds = AtlasRect {
                        x: x + GLYPH_PADDING,
                        y: y + GLYPH_PADDING,
                        width: px.width,
                        height: px.height,
                    };
                    (image, bounds, Some(atlas), GLYPH_PADDING)
                }
                None => {
                    log::trace!(
                        "glyph {} needs a standalone {}x{} image",
                        key.glyph,
                        px.width,
                        px.height
                    );
                    let image = device.create_upload_image(px.width, px.height);
                    let bounds = AtlasRect {
                        x: 0,
                        y: 0,
                        width: px.width,
                        height: px.height,
                    };
                    (image, bounds, None, 0)
                }
            };
        let area = bounds.inflate(padding);

        self.pending_uploads.push(GlyphUpload {
            image: image.clone(),
            font: key.font.clone(),
            glyph: key.glyph,
            hinting,
            scale: key.scale(),
            area,
            origin: GlyphOrigin {
                x: bounds.x as f32 + px.origin.x,
                y: bounds.y as f32 + px.origin.y,
            },
        });

        let id = self.insert_entry(CachedEntry::new(
            EntryKind::Glyph {
                key: key.clone(),
                image: image.clone(),
                bounds,
                origin: px.origin,
            },
            atlas,
            area.area(),
            timestamp,
        ));
        self.glyphs.insert(key.clone(), id);

        GlyphImage {
            image,
            bounds,
            origin: px.origin,
        }
    }

    fn glyph_hit(&mut self, id: EntryId, timestamp: u64) -> Option<GlyphImage<I>> {
        let entry = self.entries.get(id)?;
        let EntryKind::Glyph {
            image,
            bounds,
            origin,
            ..
        } = &entry.kind
        else {
            return None;
        };
        let hit = GlyphImage {
            image: image.clone(),
            bounds: *bounds,
            origin: *origin,
        };
        self.use_entry(id, timestamp);
        Some(hit)
    }

    /// Returns the cached copy of `texture`, if there is a usable one.
    ///
    /// A miss means the caller has to upload the texture and hand the result
    /// to [`GpuCache::cache_texture_image`].
    pub fn texture_image(&mut self, texture: &Texture, timestamp: u64) -> Option<I> {
        let id = match texture.render_data(self.id) {
            Some(shared) => shared.entry(),
            None => *self.textures.get(&texture.id())?,
        };
        let entry = self.entries.get(id)?;
        let EntryKind::Texture { image, shared, .. } = &entry.kind else {
            return None;
        };
        if shared.is_invalid() {
            return None;
        }
        let image = image.clone();
        self.use_entry(id, timestamp);
        Some(image)
    }

    /// Records `image` as the uploaded copy of `texture`.
    ///
    /// The entry is attached to the texture's slot, so that destroying the
    /// texture tombstones it. If the slot is held by another cache, a destroy
    /// notification is registered instead and the entry is found through the
    /// cache's own index.
    pub fn cache_texture_image(&mut self, texture: &Texture, timestamp: u64, image: I) {
        if let Some(previous) = texture.render_data(self.id) {
            if previous.is_invalid() {
                texture.clear_render_data(self.id);
            } else if let Some(previous) = texture.steal_render_data(self.id) {
                self.textures.insert(texture.id(), previous.entry());
                texture.add_destroy_notify(previous);
            }
        }

        let pixels = image.width() as usize * image.height() as usize;
        let shared = Arc::new(TextureShared::new(
            pixels,
            self.dead_texture_pixels.clone(),
            self.entries.next_id(),
        ));
        let id = self.insert_entry(CachedEntry::new(
            EntryKind::Texture {
                texture: texture.id(),
                image,
                shared: shared.clone(),
            },
            None,
            pixels,
            timestamp,
        ));
        debug_assert_eq!(id, shared.entry(), "entry id was predicted wrongly");

        if !texture.set_render_data(self.id, shared.clone()) {
            texture.add_destroy_notify(shared);
            self.textures.insert(texture.id(), id);
        }
    }

    /// Sweeps the cache and reports whether everything left is stale.
    ///
    /// Entries unused for more than `timeout` are aged out: standalone glyphs
    /// and textures are freed, atlas glyphs are only marked stale. Atlases are
    /// freed, with everything on them, once too little of them is alive or
    /// free, or when the current atlas has been idle and empty for a while.
    /// Textures whose texture was destroyed are freed regardless of age.
    pub fn gc(&mut self, timeout: u64, timestamp: u64) -> bool {
        let mut all_stale = true;

        // Entries are appended, so everything on an atlas comes after it and
        // is visited first.
        let mut cursor = self.tail;
        while let Some(id) = cursor {
            cursor = self.entries.get(id).and_then(|entry| entry.prev);
            if self.should_collect(id, timeout, timestamp) {
                self.free_entry(id);
            } else if let Some(entry) = self.entries.get(id) {
                all_stale &= entry.stale;
            }
        }

        self.dead_texture_pixels.store(0, Ordering::Relaxed);
        self.last_gc = timestamp;

        if self.config.debug_stats {
            self.log_stats();
        }

        all_stale
    }

    /// Runs [`GpuCache::gc`] with the configured timeout if it is due.
    ///
    /// A sweep is due once `cache_timeout` has passed since the previous one,
    /// or earlier when more than `max_dead_texture_pixels` texture pixels died.
    /// Returns `None` if no sweep ran, or the result of the sweep.
    pub fn maybe_gc(&mut self, timestamp: u64) -> Option<bool> {
        let dead = self.dead_texture_pixels();
        let since_last = timestamp.saturating_sub(self.last_gc);
        if dead <= self.config.max_dead_texture_pixels && since_last < self.config.cache_timeout {
            return None;
        }
        Some(self.gc(self.config.cache_timeout, timestamp))
    }

    /// Pixels of cached textures that were destroyed since the last sweep.
    pub fn dead_texture_pixels(&self) -> usize {
        self.dead_texture_pixels.load(Ordering::Relaxed)
    }

    /// Number of entries, counting atlases, glyphs and textures.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    /// Take all pending glyph uploads, leaving the internal queue empty.
    pub fn take_pending_uploads(&mut self) -> Vec<GlyphUpload<I, F>> {
        core::mem::take(&mut self.pending_uploads)
    }

    /// Takes a snapshot of the cache contents.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            dead_texture_pixels: self.dead_texture_pixels(),
            ..CacheStats::default()
        };
        for (id, entry) in self.iter() {
            match &entry.kind {
                EntryKind::Atlas { allocator, .. } => stats.atlases.push(AtlasStats {
                    total_pixels: self.config.atlas_pixels(),
                    alive_pixels: entry.pixels,
                    remaining_pixels: allocator.remaining_pixels(),
                    slices: allocator.slices().len(),
                    is_current: self.current_atlas == Some(id),
                }),
                EntryKind::Texture { shared, .. } => {
                    stats.textures += 1;
                    if shared.is_invalid() {
                        stats.tombstoned_textures += 1;
                    }
                }
                EntryKind::Glyph { .. } => {
                    stats.glyphs += 1;
                    if entry.stale {
                        stats.stale_glyphs += 1;
                    }
                    if entry.atlas.is_none() {
                        stats.standalone_glyphs += 1;
                    }
                }
            }
        }
        stats
    }

    /// Writes [`GpuCache::stats`] to the `debug` log.
    pub fn log_stats(&self) {
        if log::log_enabled!(log::Level::Debug) {
            self.stats().log();
        }
    }

    /// Iterates over the entry list from head to tail.
    fn iter(&self) -> impl Iterator<Item = (EntryId, &CachedEntry<I, F>)> + '_ {
        let mut cursor = self.head;
        core::iter::from_fn(move || {
            let id = cursor?;
            let entry = self.entries.get(id)?;
            cursor = entry.next;
            Some((id, entry))
        })
    }

    fn insert_entry(&mut self, mut entry: CachedEntry<I, F>) -> EntryId {
        entry.prev = self.tail;
        entry.next = None;
        let id = self.entries.insert(entry);
        match self.tail.and_then(|tail| self.entries.get_mut(tail)) {
            Some(tail) => tail.next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    fn unlink(&mut self, id: EntryId) {
        let Some(entry) = self.entries.get(id) else {
            return;
        };
        let (prev, next) = (entry.prev, entry.next);
        match prev.and_then(|prev| self.entries.get_mut(prev)) {
            Some(prev) => prev.next = next,
            None => self.head = next,
        }
        match next.and_then(|next| self.entries.get_mut(next)) {
            Some(next) => next.prev = prev,
            None => self.tail = prev,
        }
    }

    /// Flips the stale flag, moving the entry's pixels in or out of its
    /// atlas's alive count.
    fn mark_stale(&mut self, id: EntryId, stale: bool) {
        let Some(entry) = self.entries.get_mut(id) else {
            return;
        };
        if entry.stale == stale {
            return;
        }
        entry.stale = stale;
        let pixels = entry.pixels;
        if let Some(atlas) = entry.atlas.and_then(|atlas| self.entries.get_mut(atlas)) {
            if stale {
                debug_assert!(atlas.pixels >= pixels, "atlas alive pixels underflow");
                atlas.pixels = atlas.pixels.saturating_sub(pixels);
            } else {
                atlas.pixels += pixels;
            }
        }
    }

    fn use_entry(&mut self, id: EntryId, timestamp: u64) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.timestamp = timestamp;
        }
        self.mark_stale(id, false);
    }

    fn should_collect(&mut self, id: EntryId, timeout: u64, timestamp: u64) -> bool {
        let is_current = self.current_atlas == Some(id);
        let idle_timeout = timeout.saturating_mul(self.config.atlas_idle_timeout_scale);
        let min_alive_pixels = self.config.min_alive_pixels();
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        match &entry.kind {
            EntryKind::Atlas { allocator, .. } => {
                let idle = is_current
                    && entry.is_older_than(idle_timeout, timestamp)
                    && entry.pixels == 0;
                let fragmented = entry.pixels + allocator.remaining_pixels() < min_alive_pixels;
                if idle || fragmented {
                    return true;
                }
                entry.stale = entry.pixels == 0;
                false
            }
            EntryKind::Texture { shared, .. } => {
                shared.is_invalid() || entry.is_older_than(timeout, timestamp)
            }
            EntryKind::Glyph { .. } => {
                if !entry.is_older_than(timeout, timestamp) {
                    return false;
                }
                if entry.atlas.is_none() {
                    return true;
                }
                self.mark_stale(id, true);
                false
            }
        }
    }

    fn free_entry(&mut self, id: EntryId) {
        self.unlink(id);
        self.mark_stale(id, true);
        let Some(entry) = self.entries.remove(id) else {
            return;
        };
        match entry.kind {
            EntryKind::Atlas { .. } => {
                let children: Vec<EntryId> = self
                    .entries
                    .iter()
                    .filter(|(_, child)| child.atlas == Some(id))
                    .map(|(child, _)| child)
                    .collect();
                log::trace!("freeing atlas with {} entries", children.len());
                for child in children {
                    self.free_entry(child);
                }
                if self.current_atlas == Some(id) {
                    self.current_atlas = None;
                }
            }
            EntryKind::Texture {
                texture, shared, ..
            } => {
                if self.textures.get(&texture) == Some(&id) {
                    self.textures.remove(&texture);
                }
                shared.release();
            }
            EntryKind::Glyph { key, .. } => {
                if self.glyphs.get(&key) == Some(&id) {
                    self.glyphs.remove(&key);
                }
            }
        }
    }

    /// Places a `width` × `height` item on the current atlas, starting a new
    /// atlas if the current one is full.
    ///
    /// Returns the atlas, its image and the top left corner of the item, or
    /// `None` if the item has to live in its own image.
    fn allocate_in_atlas<D>(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
        timestamp: u64,
    ) -> Option<(EntryId, I, u32, u32)>
    where
        D: ImageAllocator<Image = I>,
    {
        if width > self.config.max_atlas_item_size || height > self.config.max_atlas_item_size {
            return None;
        }

        let atlas = match self.current_atlas {
            Some(atlas) => atlas,
            None => self.create_atlas(device, timestamp),
        };
        if let Some((image, x, y)) = self.allocate_on(atlas, width, height, timestamp) {
            return Some((atlas, image, x, y));
        }

        let atlas = self.create_atlas(device, timestamp);
        let (image, x, y) = self.allocate_on(atlas, width, height, timestamp)?;
        Some((atlas, image, x, y))
    }

    fn allocate_on(
        &mut self,
        atlas: EntryId,
        width: u32,
        height: u32,
        timestamp: u64,
    ) -> Option<(I, u32, u32)> {
        let entry = self.entries.get_mut(atlas)?;
        let EntryKind::Atlas { image, allocator } = &mut entry.kind else {
            return None;
        };
        let (x, y) = allocator.allocate(width, height)?;
        let image = image.clone();
        entry.pixels += width as usize * height as usize;
        self.use_entry(atlas, timestamp);
        Some((image, x, y))
    }

    /// Starts a new current atlas. The previous one will not be allocated
    /// from again.
    fn create_atlas<D>(&mut self, device: &mut D, timestamp: u64) -> EntryId
    where
        D: ImageAllocator<Image = I>,
    {
        if let Some(entry) = self.current_atlas.and_then(|id| self.entries.get_mut(id)) {
            if let EntryKind::Atlas { allocator, .. } = &mut entry.kind {
                allocator.exhaust();
            }
        }

        let size = self.config.atlas_size;
        let image = device.create_atlas_image(size, size);
        let allocator = AtlasAllocator::new(size, self.config.max_slices_per_atlas);
        let id = self.insert_entry(CachedEntry::new(
            EntryKind::Atlas { image, allocator },
            None,
            0,
            timestamp,
        ));
        log::trace!("created {size}x{size} atlas, {} entries cached", self.len());
        self.current_atlas = Some(id);
        id
    }
}

impl<I, F> Default for GpuCache<I, F>
where
    I: GpuImage + Clone,
    F: GlyphFont,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, F> Debug for GpuCache<I, F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GpuCache")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .field("glyphs", &self.glyphs.len())
            .field("textures", &self.textures.len())
            .field(
                "dead_texture_pixels",
                &self.dead_texture_pixels.load(Ordering::Relaxed),
            )
            .field("pending_uploads", &self.pending_uploads.len())
            .field("last_gc", &self.last_gc)
            .finish_non_exhaustive()
    }
}

impl<I, F> Drop for GpuCache<I, F> {
    fn drop(&mut self) {
        // Tail to head, so no entry outlives the atlas it lives on.
        let mut cursor = self.tail;
        while let Some(id) = cursor {
            let Some(entry) = self.entries.remove(id) else {
                break;
            };
            cursor = entry.prev;
            if let EntryKind::Texture { shared, .. } = &entry.kind {
                shared.release();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{HintStyle, InkRect, SubpixelFlags};
    use std::sync::Barrier;
    use std::thread;

    #[derive(Clone, Debug)]
    struct Image {
        width: u32,
        height: u32,
        alive: Arc<()>,
    }

    impl GpuImage for Image {
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
    }

    #[derive(Default)]
    struct Device {
        alive: Arc<()>,
        atlases: usize,
    }

    impl Device {
        /// Number of image handles alive outside the device.
        fn live_images(&self) -> usize {
            Arc::strong_count(&self.alive) - 1
        }

        fn image(&self, width: u32, height: u32) -> Image {
            Image {
                width,
                height,
                alive: self.alive.clone(),
            }
        }
    }

    impl ImageAllocator for Device {
        type Image = Image;

        fn create_atlas_image(&mut self, width: u32, height: u32) -> Image {
            self.atlases += 1;
            self.image(width, height)
        }

        fn create_upload_image(&mut self, width: u32, height: u32) -> Image {
            self.image(width, height)
        }
    }

    /// Glyph `n` is `n & 0xffff` pixels wide and `n >> 16` pixels tall.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Font;

    impl GlyphFont for Font {
        fn hint_style(&self) -> HintStyle {
            HintStyle::None
        }
        fn hint_metrics(&self) -> bool {
            false
        }
        fn ink_rect(&self, glyph: u32, _: Hinting) -> InkRect {
            let width = (glyph & 0xffff) as i32;
            let height = (glyph >> 16) as i32;
            InkRect {
                x: 0,
                y: -height * 1024,
                width: width * 1024,
                height: height * 1024,
            }
        }
    }

    fn key(width: u32, height: u32) -> GlyphKey<Font> {
        GlyphKey::new(Font, width | (height << 16), SubpixelFlags::NONE, 1.0)
    }

    fn atlas_pixels(cache: &GpuCache<Image, Font>) -> Vec<usize> {
        cache.stats().atlases.iter().map(|a| a.alive_pixels).collect()
    }

    /// Sums the pixels of live entries per atlas, from scratch.
    fn resummed_atlas_pixels(cache: &GpuCache<Image, Font>) -> Vec<usize> {
        cache
            .iter()
            .filter(|(_, entry)| matches!(entry.kind, EntryKind::Atlas { .. }))
            .map(|(atlas, _)| {
                cache
                    .iter()
                    .filter(|(_, e)| e.atlas == Some(atlas) && !e.stale)
                    .map(|(_, e)| e.pixels)
                    .sum()
            })
            .collect()
    }

    #[test]
    fn aged_atlas_glyph_is_marked_stale() {
        let mut device = Device::default();
        let mut cache = GpuCache::new();
        cache.glyph_image(&mut device, &key(10, 12), 500);
        assert_eq!(atlas_pixels(&cache), [12 * 14]);

        assert!(cache.gc(1000, 2000), "the glyph and its empty atlas are stale");
        let stats = cache.stats();
        assert_eq!(stats.glyphs, 1);
        assert_eq!(stats.stale_glyphs, 1);
        assert_eq!(atlas_pixels(&cache), [0]);

        // Looking the glyph up again revives it.
        cache.glyph_image(&mut device, &key(10, 12), 2001);
        assert_eq!(atlas_pixels(&cache), [12 * 14]);
        assert_eq!(cache.stats().stale_glyphs, 0);
    }

    #[test]
    fn aged_standalone_glyph_is_freed() {
        let mut device = Device::default();
        let mut cache = GpuCache::new();
        let big = key(300, 20);
        let image = cache.glyph_image(&mut device, &big, 500);
        assert_eq!((image.image.width, image.image.height), (300, 20));
        assert_eq!(device.atlases, 0);
        assert_eq!(cache.stats().standalone_glyphs, 1);
        drop(image);
        cache.take_pending_uploads();

        assert!(cache.gc(1000, 2000), "nothing is left");
        assert!(cache.is_empty());
        assert_eq!(device.live_images(), 0);
    }

    #[test]
    fn atlas_pixels_track_staleness() {
        let mut device = Device::default();
        let mut cache = GpuCache::new();
        for (i, size) in [4, 8, 15, 16, 23, 42].into_iter().enumerate() {
            let ts = i as u64 * 10;
            cache.glyph_image(&mut device, &key(size, size), ts);
        }
        assert_eq!(atlas_pixels(&cache), resummed_atlas_pixels(&cache));

        // Glyphs used at 0, 10 and 20 age out.
        cache.gc(25, 50);
        assert_eq!(cache.stats().stale_glyphs, 3);
        assert_eq!(atlas_pixels(&cache), resummed_atlas_pixels(&cache));

        cache.glyph_image(&mut device, &key(8, 8), 60);
        assert_eq!(cache.stats().stale_glyphs, 2);
        assert_eq!(atlas_pixels(&cache), resummed_atlas_pixels(&cache));
    }

    #[test]
    fn freeing_an_atlas_frees_its_glyphs() {
        let mut device = Device::default();
        let mut cache = GpuCache::new();
        let keys: Vec<_> = (1..=20).map(|i| key(i * 5, 30)).collect();
        for key in &keys {
            cache.glyph_image(&mut device, key, 0);
        }
        assert_eq!(cache.glyphs.len(), 20);
        assert_eq!(cache.len(), 21);
        cache.take_pending_uploads();

        // The glyphs age out before the current atlas counts as idle.
        assert!(cache.gc(10, 20), "the atlas survives this pass as stale");
        assert_eq!(cache.len(), 21);
        assert_eq!(atlas_pixels(&cache), [0]);

        // Once idle and empty, the atlas goes and its glyphs with it.
        assert!(cache.gc(10, 1000), "nothing was left alive");
        assert!(cache.is_empty());
        assert!(cache.glyphs.is_empty());
        assert_eq!(device.live_images(), 0);

        // A fresh lookup starts over on a new atlas.
        let again = cache.glyph_image(&mut device, &keys[0], 1001);
        assert_eq!(device.atlases, 2);
        assert_eq!((again.bounds.x, again.bounds.y), (1, 1));
    }

    #[test]
    fn destroying_a_texture_during_gc_frees_its_entry_once() {
        for _ in 0..64 {
            let device = Device::default();
            let mut cache: GpuCache<Image, Font> = GpuCache::new();
            let texture = Texture::new(64, 64);
            cache.cache_texture_image(&texture, 0, device.image(64, 64));
            let shared = Arc::downgrade(&texture.render_data(cache.id).unwrap());
            assert!(cache.texture_image(&texture, 0).is_some());

            let barrier = Arc::new(Barrier::new(2));
            let destroyer = {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    drop(texture);
                })
            };
            barrier.wait();
            // Old enough to be collected whether or not the texture is gone.
            cache.gc(10, 100);
            destroyer.join().unwrap();
            cache.gc(10, 200);

            assert!(cache.is_empty());
            assert_eq!(device.live_images(), 0);
            assert!(shared.upgrade().is_none(), "shared state leaked");
        }
    }

    #[test]
    fn destroyed_texture_is_a_miss_and_counts_as_dead() {
        let device = Device::default();
        let mut cache: GpuCache<Image, Font> = GpuCache::new();
        let texture = Texture::new(100, 50);
        cache.cache_texture_image(&texture, 0, device.image(100, 50));
        let copy = texture.clone();
        drop(texture);
        assert!(cache.texture_image(&copy, 1).is_some(), "a clone keeps it alive");
        assert_eq!(cache.dead_texture_pixels(), 0);

        let id = copy.id();
        drop(copy);
        assert_eq!(cache.dead_texture_pixels(), 5000);
        assert_eq!(cache.stats().tombstoned_textures, 1);
        assert_eq!(cache.maybe_gc(2), None);

        assert!(cache.gc(1000, 2), "only the tombstone was cached");
        assert!(cache.is_empty());
        assert!(!cache.textures.contains_key(&id));
        assert_eq!(cache.dead_texture_pixels(), 0);
        assert_eq!(device.live_images(), 0);
    }

    #[test]
    fn texture_slot_is_reclaimed_after_its_cache_is_dropped() {
        let device = Device::default();
        let texture = Texture::new(16, 16);
        let first_id = {
            let mut first: GpuCache<Image, Font> = GpuCache::new();
            first.cache_texture_image(&texture, 0, device.image(16, 16));
            first.id
        };
        let left_behind = texture.render_data(first_id).unwrap();
        assert!(left_behind.is_invalid());

        let mut second: GpuCache<Image, Font> = GpuCache::new();
        for round in 0..100 {
            let timestamp = round * 100;
            assert!(second.texture_image(&texture, timestamp).is_none());
            second.cache_texture_image(&texture, timestamp, device.image(16, 16));
            assert!(
                texture.render_data(second.id).is_some(),
                "the second cache holds the slot"
            );
            assert!(second.gc(10, timestamp + 50), "the copy aged out");
        }
        assert!(second.is_empty());
        assert!(second.textures.is_empty());
        assert_eq!(left_behind.use_count(), 0);
        assert_eq!(texture.destroy_notify_count(), 0);
        assert_eq!(device.live_images(), 0);
    }

    #[test]
    fn texture_notifications_stay_bounded_while_the_slot_is_taken() {
        let device = Device::default();
        let texture = Texture::new(16, 16);
        let mut first: GpuCache<Image, Font> = GpuCache::new();
        first.cache_texture_image(&texture, 0, device.image(16, 16));

        let mut second: GpuCache<Image, Font> = GpuCache::new();
        for round in 0..100 {
            let timestamp = round * 100;
            assert!(second.texture_image(&texture, timestamp).is_none());
            second.cache_texture_image(&texture, timestamp, device.image(16, 16));
            second.gc(10, timestamp + 50);
        }
        assert!(texture.destroy_notify_count() <= 1, "notifications piled up");
        assert!(first.texture_image(&texture, 10_000).is_some());

        drop(texture);
        assert_eq!(first.dead_texture_pixels(), 256);
        assert_eq!(second.dead_texture_pixels(), 0);
    }

    #[test]
    fn dropping_the_cache_releases_everything() {
        let mut device = Device::default();
        let texture = Texture::new(8, 8);
        let shared = {
            let mut cache = GpuCache::new();
            cache.glyph_image(&mut device, &key(10, 10), 0);
            cache.glyph_image(&mut device, &key(400, 10), 0);
            cache.cache_texture_image(&texture, 0, device.image(8, 8));
            cache.take_pending_uploads();
            let shared = texture.render_data(cache.id).unwrap();
            assert_eq!(shared.use_count(), 2);
            shared
        };
        assert_eq!(device.live_images(), 0);
        assert_eq!(shared.use_count(), 1);
        assert!(shared.is_invalid());
        drop(texture);
        assert_eq!(shared.use_count(), 0);
    }
}
