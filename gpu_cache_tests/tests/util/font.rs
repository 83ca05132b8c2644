// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A font whose glyph metrics are spelled out in the glyph index.

use gpu_cache::{
    FONT_UNITS_PER_PIXEL, GlyphFont, GlyphKey, HintStyle, Hinting, InkRect, SubpixelFlags,
};

/// Glyph `n` is `n & 0xffff` pixels wide and `n >> 16` pixels tall, sitting
/// on the baseline.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TestFont {
    #[expect(dead_code, reason = "only compared and hashed")]
    pub(crate) id: u32,
    pub(crate) hint_style: HintStyle,
}

impl TestFont {
    pub(crate) fn new(id: u32) -> Self {
        Self {
            id,
            hint_style: HintStyle::None,
        }
    }
}

impl GlyphFont for TestFont {
    fn hint_style(&self) -> HintStyle {
        self.hint_style
    }

    fn hint_metrics(&self) -> bool {
        false
    }

    fn ink_rect(&self, glyph: u32, _hinting: Hinting) -> InkRect {
        let width = (glyph & 0xffff) as i32;
        let height = (glyph >> 16) as i32;
        InkRect {
            x: 0,
            y: -height * FONT_UNITS_PER_PIXEL,
            width: width * FONT_UNITS_PER_PIXEL,
            height: height * FONT_UNITS_PER_PIXEL,
        }
    }
}

/// Key for a `width` × `height` pixel glyph of font 0 at scale 1.
pub(crate) fn glyph(width: u32, height: u32) -> GlyphKey<TestFont> {
    GlyphKey::new(
        TestFont::new(0),
        width | (height << 16),
        SubpixelFlags::NONE,
        1.0,
    )
}
