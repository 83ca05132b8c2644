// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An image allocator that keeps count of what it handed out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use gpu_cache::{GpuImage, ImageAllocator};

/// Image handle; equal handles refer to the same image.
#[derive(Clone, Debug)]
pub(crate) struct TestImage {
    id: u32,
    width: u32,
    height: u32,
    is_atlas: bool,
    /// Shared with the device, so it can count live handles.
    _alive: Arc<()>,
}

impl TestImage {
    pub(crate) fn id(&self) -> u32 {
        self.id
    }

    pub(crate) fn is_atlas(&self) -> bool {
        self.is_atlas
    }
}

impl PartialEq for TestImage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl GpuImage for TestImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Debug, Default)]
pub(crate) struct TestDevice {
    alive: Arc<()>,
    next_id: AtomicU32,
    pub(crate) atlases_created: usize,
    pub(crate) uploads_created: usize,
}

impl TestDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of image handles alive outside the device.
    pub(crate) fn live_images(&self) -> usize {
        Arc::strong_count(&self.alive) - 1
    }

    /// Creates an image as a texture upload would.
    pub(crate) fn upload(&self, width: u32, height: u32) -> TestImage {
        self.image(width, height, false)
    }

    fn image(&self, width: u32, height: u32, is_atlas: bool) -> TestImage {
        TestImage {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            is_atlas,
            _alive: self.alive.clone(),
        }
    }
}

impl ImageAllocator for TestDevice {
    type Image = TestImage;

    fn create_atlas_image(&mut self, width: u32, height: u32) -> TestImage {
        self.atlases_created += 1;
        self.image(width, height, true)
    }

    fn create_upload_image(&mut self, width: u32, height: u32) -> TestImage {
        self.uploads_created += 1;
        self.image(width, height, false)
    }
}
