// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The image factory the cache allocates from.

/// A GPU image handle.
///
/// Handles are cloned whenever the cache gives an image out; the image is
/// expected to stay alive for as long as any clone does.
pub trait GpuImage {
    /// Width in pixels.
    fn width(&self) -> u32;
    /// Height in pixels.
    fn height(&self) -> u32;
}

/// Creates the images backing atlases and standalone glyphs.
///
/// Allocation failures are not the cache's concern; an implementation that
/// runs out of device memory should abort or panic the way its backend does.
pub trait ImageAllocator {
    /// The handle type produced by this device.
    type Image: GpuImage + Clone;

    /// Creates an image that glyphs will be packed into.
    fn create_atlas_image(&mut self, width: u32, height: u32) -> Self::Image;

    /// Creates an image that receives exactly one upload.
    fn create_upload_image(&mut self, width: u32, height: u32) -> Self::Image;
}
