// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client textures and the handle they share with the cache.
//!
//! A [`Texture`] is owned by client code and may be dropped on any thread.
//! The cache attaches its entry for the texture through a per-texture slot
//! (or, when the slot is taken, a destroy notification). Both sides hold one
//! unit of the entry's use count; the texture side releases its unit from the
//! texture's destructor and touches nothing but atomics while doing so.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::arena::EntryId;

/// Identifier for a [`Texture`], unique for the lifetime of the process.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TextureId(u64);

impl TextureId {
    fn new() -> Self {
        static ID_COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying integer value.
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

/// Identity of one cache, used as the key of a texture's slot.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct CacheId(u64);

impl CacheId {
    pub(crate) fn new() -> Self {
        static ID_COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A client-owned texture that can be uploaded to and cached on the GPU.
///
/// Cloning is cheap and clones refer to the same texture. When the last clone
/// is dropped, every cache holding a copy of the texture is notified.
#[derive(Clone)]
pub struct Texture(Arc<TextureInner>);

struct TextureInner {
    id: TextureId,
    width: u32,
    height: u32,
    /// The slot: one cache entry, keyed by the cache that attached it.
    render_data: Mutex<Option<RenderData>>,
    /// Entries that could not take the slot.
    destroy_notifies: Mutex<Vec<Arc<TextureShared>>>,
}

struct RenderData {
    owner: CacheId,
    shared: Arc<TextureShared>,
}

impl Texture {
    /// Creates a texture of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self(Arc::new(TextureInner {
            id: TextureId::new(),
            width,
            height,
            render_data: Mutex::new(None),
            destroy_notifies: Mutex::new(Vec::new()),
        }))
    }

    /// Returns the unique identifier of this texture.
    pub fn id(&self) -> TextureId {
        self.0.id
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.0.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.0.height
    }

    /// Returns the entry `owner` attached to the slot, if any.
    pub(crate) fn render_data(&self, owner: CacheId) -> Option<Arc<TextureShared>> {
        lock(&self.0.render_data)
            .as_ref()
            .filter(|data| data.owner == owner)
            .map(|data| data.shared.clone())
    }

    /// Attaches `shared` to the slot.
    ///
    /// Fails if the slot holds a live entry. A tombstone left behind by a
    /// cache that freed its entry is notified and replaced.
    pub(crate) fn set_render_data(&self, owner: CacheId, shared: Arc<TextureShared>) -> bool {
        let mut slot = lock(&self.0.render_data);
        if let Some(data) = slot.as_ref() {
            if !data.shared.is_invalid() {
                return false;
            }
            data.shared.source_destroyed();
        }
        *slot = Some(RenderData { owner, shared });
        true
    }

    /// Detaches `owner`'s entry without running its destroy notification.
    pub(crate) fn steal_render_data(&self, owner: CacheId) -> Option<Arc<TextureShared>> {
        let mut slot = lock(&self.0.render_data);
        if slot.as_ref().is_some_and(|data| data.owner == owner) {
            slot.take().map(|data| data.shared)
        } else {
            None
        }
    }

    /// Detaches `owner`'s entry and runs its destroy notification.
    pub(crate) fn clear_render_data(&self, owner: CacheId) {
        if let Some(shared) = self.steal_render_data(owner) {
            shared.source_destroyed();
        }
    }

    /// Notifies `shared` when the texture is destroyed.
    ///
    /// Entries their cache has already freed are notified and dropped first.
    pub(crate) fn add_destroy_notify(&self, shared: Arc<TextureShared>) {
        let mut notifies = lock(&self.0.destroy_notifies);
        notifies.retain(|notify| {
            if notify.is_invalid() {
                notify.source_destroyed();
                false
            } else {
                true
            }
        });
        notifies.push(shared);
    }

    #[cfg(test)]
    pub(crate) fn destroy_notify_count(&self) -> usize {
        lock(&self.0.destroy_notifies).len()
    }
}

impl core::fmt::Debug for Texture {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.0.id)
            .field("width", &self.0.width)
            .field("height", &self.0.height)
            .finish_non_exhaustive()
    }
}

impl Drop for TextureInner {
    fn drop(&mut self) {
        let render_data = self
            .render_data
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(data) = render_data {
            data.shared.source_destroyed();
        }
        let notifies = core::mem::take(
            self.destroy_notifies
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for shared in notifies {
            shared.source_destroyed();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State of a texture entry shared between the cache and the texture.
///
/// `use_count` starts at 2. The cache releases its unit when it frees the
/// entry, the texture when it is destroyed or when the cache clears the slot.
/// Below 2 the entry is tombstoned and its image must not be handed out.
#[derive(Debug)]
pub(crate) struct TextureShared {
    use_count: AtomicU32,
    pixels: usize,
    dead_pixels: Arc<AtomicUsize>,
    entry: EntryId,
}

impl TextureShared {
    pub(crate) fn new(pixels: usize, dead_pixels: Arc<AtomicUsize>, entry: EntryId) -> Self {
        Self {
            use_count: AtomicU32::new(2),
            pixels,
            dead_pixels,
            entry,
        }
    }

    /// The cache entry this state belongs to.
    pub(crate) fn entry(&self) -> EntryId {
        self.entry
    }

    pub(crate) fn use_count(&self) -> u32 {
        self.use_count.load(Ordering::Acquire)
    }

    pub(crate) fn is_invalid(&self) -> bool {
        self.use_count() < 2
    }

    /// The texture side's destroy notification.
    ///
    /// Counts the entry's pixels as dead if the entry was still live, then
    /// releases the texture's unit. Safe to call from any thread.
    pub(crate) fn source_destroyed(&self) {
        let previous = self.use_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "texture entry use count underflow");
        if previous >= 2 {
            self.dead_pixels.fetch_add(self.pixels, Ordering::Relaxed);
        }
    }

    /// Releases the cache's unit. Returns true if this was the last unit.
    pub(crate) fn release(&self) -> bool {
        let previous = self.use_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "texture entry use count underflow");
        previous == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    fn shared(dead: &Arc<AtomicUsize>) -> Arc<TextureShared> {
        let id = Arena::<()>::new().next_id();
        Arc::new(TextureShared::new(100, dead.clone(), id))
    }

    #[test]
    fn ids_are_unique() {
        let a = Texture::new(1, 1);
        let b = Texture::new(1, 1);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn slot_is_keyed_by_owner() {
        let dead = Arc::new(AtomicUsize::new(0));
        let texture = Texture::new(10, 10);
        let mine = CacheId::new();
        let theirs = CacheId::new();

        assert!(texture.set_render_data(mine, shared(&dead)));
        assert!(!texture.set_render_data(theirs, shared(&dead)));
        assert!(texture.render_data(mine).is_some());
        assert!(texture.render_data(theirs).is_none());
        assert!(texture.steal_render_data(theirs).is_none());
        assert!(texture.steal_render_data(mine).is_some());
        assert!(texture.render_data(mine).is_none());
    }

    #[test]
    fn destruction_counts_live_pixels_once() {
        let dead = Arc::new(AtomicUsize::new(0));
        let texture = Texture::new(10, 10);
        let owner = CacheId::new();
        let live = shared(&dead);
        let released = shared(&dead);
        assert!(texture.set_render_data(owner, live.clone()));
        texture.add_destroy_notify(released.clone());

        // The cache already let go of this one: a tombstone adds nothing.
        assert!(!released.release());
        assert!(released.is_invalid());

        drop(texture);
        assert_eq!(dead.load(Ordering::Relaxed), 100);
        assert_eq!(live.use_count(), 1);
        assert!(live.is_invalid());
        assert_eq!(released.use_count(), 0);
        assert!(live.release());
    }

    #[test]
    fn tombstones_make_room() {
        let dead = Arc::new(AtomicUsize::new(0));
        let texture = Texture::new(10, 10);
        let gone = CacheId::new();
        let owner = CacheId::new();

        let left_behind = shared(&dead);
        assert!(texture.set_render_data(gone, left_behind.clone()));
        assert!(!left_behind.release());
        let replacement = shared(&dead);
        assert!(texture.set_render_data(owner, replacement.clone()));
        assert_eq!(left_behind.use_count(), 0);
        assert!(texture.render_data(owner).is_some());

        for _ in 0..10 {
            let notify = shared(&dead);
            texture.add_destroy_notify(notify.clone());
            notify.release();
        }
        assert_eq!(texture.destroy_notify_count(), 1);
        assert_eq!(dead.load(Ordering::Relaxed), 0);

        drop(texture);
        assert_eq!(dead.load(Ordering::Relaxed), 100);
        assert_eq!(replacement.use_count(), 1);
    }

    #[test]
    fn clearing_the_slot_runs_the_notification() {
        let dead = Arc::new(AtomicUsize::new(0));
        let texture = Texture::new(10, 10);
        let owner = CacheId::new();
        let entry = shared(&dead);
        assert!(texture.set_render_data(owner, entry.clone()));
        texture.clear_render_data(owner);
        assert_eq!(entry.use_count(), 1);
        assert_eq!(dead.load(Ordering::Relaxed), 100);
        assert!(texture.set_render_data(owner, shared(&dead)));
    }
}
