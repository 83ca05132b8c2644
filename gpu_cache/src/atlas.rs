// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shelf packing for atlas images.
//!
//! An atlas is cut into horizontal slices stacked from the top. Each slice has
//! a height fixed when it is created and a used width that only grows, so an
//! allocation is a matter of finding a slice that is tall enough and still has
//! room on the right. Space is never handed back; an atlas that has become too
//! sparse is dropped as a whole by the cache instead.

use smallvec::SmallVec;

/// Slices never get shorter than this, to keep tiny glyphs from each opening
/// their own shelf.
const MIN_SLICE_HEIGHT: u32 = 4;

/// One horizontal shelf of an atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slice {
    /// Width already handed out, starting at the left edge.
    pub width: u32,
    /// Fixed height of the shelf.
    pub height: u32,
}

/// Shelf allocator for one square atlas image.
#[derive(Clone, Debug)]
pub struct AtlasAllocator {
    size: u32,
    max_slices: usize,
    slices: SmallVec<[Slice; 16]>,
    remaining_pixels: usize,
}

impl AtlasAllocator {
    /// Creates an empty allocator for a `size` × `size` atlas that may be
    /// divided into at most `max_slices` slices.
    pub fn new(size: u32, max_slices: usize) -> Self {
        Self {
            size,
            max_slices,
            slices: SmallVec::new(),
            remaining_pixels: size as usize * size as usize,
        }
    }

    /// Side of the atlas in pixels.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Pixels that were never handed out.
    #[inline]
    pub fn remaining_pixels(&self) -> usize {
        self.remaining_pixels
    }

    /// The slices created so far, top to bottom.
    #[inline]
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Finds room for a `width` × `height` rectangle.
    ///
    /// Returns the top left corner of the placed rectangle, or `None` if no
    /// slice fits and no new one can be created. Among the slices that fit,
    /// the one wasting the least height wins, with ties going to the topmost.
    ///
    /// Callers are expected to keep requests well below the atlas size; the
    /// cache only sends padded items up to its configured item limit.
    pub fn allocate(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        debug_assert!(
            width <= self.size && height <= self.size,
            "{width}x{height} can never fit a {0}x{0} atlas",
            self.size
        );

        let mut best = None;
        let mut waste = u32::MAX;
        let mut y = 0;
        for (index, slice) in self.slices.iter().enumerate() {
            if slice.height >= height && self.size - slice.width >= width {
                let slice_waste = slice.height - height;
                if slice_waste < waste {
                    waste = slice_waste;
                    best = Some((index, y));
                    if waste == 0 {
                        break;
                    }
                }
            }
            y += slice.height;
        }

        let (index, y) = match best {
            Some(best) => best,
            None => {
                if self.slices.len() >= self.max_slices {
                    return None;
                }
                let available = self.size - y;
                let slice_height = if self.slices.len() + 1 == self.max_slices {
                    // The last slice takes whatever is left below it.
                    available
                } else {
                    round_up_slice_height(height.max(MIN_SLICE_HEIGHT))
                };
                if height > available || slice_height > available {
                    return None;
                }
                self.slices.push(Slice {
                    width: 0,
                    height: slice_height,
                });
                (self.slices.len() - 1, y)
            }
        };

        let slice = &mut self.slices[index];
        let x = slice.width;
        slice.width += width;
        debug_assert!(slice.width <= self.size, "slice overflowed the atlas");

        self.remaining_pixels = self
            .remaining_pixels
            .saturating_sub(width as usize * height as usize);

        Some((x, y))
    }

    /// Stops counting the untouched space as reachable.
    ///
    /// Used when the cache abandons an atlas for a fresh one: nothing will be
    /// allocated here anymore, so only the alive pixels keep it worth holding.
    pub(crate) fn exhaust(&mut self) {
        self.remaining_pixels = 0;
    }
}

/// Rounds a slice height up to the next value of the form `{2, 3} × 2^k`.
///
/// Restricting heights to two significant bits keeps the set of distinct
/// slice heights small while wasting at most about 41% of a slice.
pub fn round_up_slice_height(height: u32) -> u32 {
    let bits = u64::BITS - u64::from(height).leading_zeros();
    let rounded = u64::from(height) + (((1_u64 << bits) - 1) >> 2);
    let rounded = rounded & ((7_u64 << bits) >> 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}
