// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph keys, the font collaborator, and glyph placement.

use core::hash::Hash;

/// Font units per device pixel at scale 1.
pub const FONT_UNITS_PER_PIXEL: i32 = 1024;

/// Padding in pixels added to each side of an atlas-packed glyph to prevent
/// sampling from its neighbours.
pub const GLYPH_PADDING: u32 = 1;

/// Quarter-pixel position of a glyph on both axes.
///
/// Bits 0–1 hold the horizontal quarter, bits 2–3 the vertical one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SubpixelFlags(u8);

impl SubpixelFlags {
    /// Glyph aligned to the pixel grid on both axes.
    pub const NONE: Self = Self(0);

    /// Creates flags from quarter-pixel offsets. Values are taken modulo 4.
    pub fn new(x_quarters: u8, y_quarters: u8) -> Self {
        Self((x_quarters & 3) | ((y_quarters & 3) << 2))
    }

    /// Buckets the fractional part of a device position to the nearest
    /// quarter pixel.
    pub fn quantize(x: f32, y: f32) -> Self {
        Self::new(quarter(x), quarter(y))
    }

    /// The raw four-bit value.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Horizontal offset in pixels, one of 0, 0.25, 0.5 or 0.75.
    pub fn x_offset(self) -> f32 {
        f32::from(self.0 & 3) / 4.0
    }

    /// Vertical offset in pixels, one of 0, 0.25, 0.5 or 0.75.
    pub fn y_offset(self) -> f32 {
        f32::from((self.0 >> 2) & 3) / 4.0
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "only the low two bits of the rounded value are kept"
)]
fn quarter(v: f32) -> u8 {
    ((v * 4.0 + 0.5).floor() as i64 & 3) as u8
}

/// Identifies one rasterization of a glyph.
///
/// Two lookups with equal keys are served by the same cached image.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey<F> {
    /// The font the glyph comes from.
    pub font: F,
    /// Glyph index within the font.
    pub glyph: u32,
    /// Subpixel position the glyph is rendered at.
    pub flags: SubpixelFlags,
    /// Device scale as `f32` bits (exact match, no quantization).
    pub scale_bits: u32,
}

impl<F> GlyphKey<F> {
    /// Creates a key for `glyph` of `font` rendered at `scale` device pixels
    /// per pixel.
    pub fn new(font: F, glyph: u32, flags: SubpixelFlags, scale: f32) -> Self {
        Self {
            font,
            glyph,
            flags,
            scale_bits: scale.to_bits(),
        }
    }

    /// The device scale.
    #[inline]
    pub fn scale(&self) -> f32 {
        f32::from_bits(self.scale_bits)
    }
}

/// Outline hinting requested by a font.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HintStyle {
    /// No hinting.
    #[default]
    None,
    /// Hint the vertical axis lightly.
    Slight,
    /// Moderate hinting.
    Medium,
    /// Hint both axes fully.
    Full,
}

/// Hinting settings a glyph is measured and rasterized with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Hinting {
    /// Outline hinting.
    pub style: HintStyle,
    /// Whether metrics are rounded to whole pixels.
    pub metrics: bool,
}

impl Hinting {
    /// Hinting to use for `font`.
    ///
    /// Metrics hinting is forced on whenever any outline hinting is requested;
    /// hinted outlines with unhinted metrics render with visible artifacts.
    pub fn for_font<F: GlyphFont>(font: &F) -> Self {
        let style = font.hint_style();
        Self {
            style,
            metrics: font.hint_metrics() || style != HintStyle::None,
        }
    }
}

/// Ink rectangle of a glyph in font units, relative to its pen position.
///
/// [`FONT_UNITS_PER_PIXEL`] units make one pixel at scale 1; `y` grows
/// downwards, so glyphs sitting on the baseline have a negative `y`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InkRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Horizontal extent.
    pub width: i32,
    /// Vertical extent.
    pub height: i32,
}

/// The font collaborator: supplies hinting preferences and glyph metrics.
///
/// Implementations are cheap handles compared by identity; they are stored in
/// every [`GlyphKey`].
pub trait GlyphFont: Clone + Eq + Hash {
    /// Outline hinting the font asks for.
    fn hint_style(&self) -> HintStyle;

    /// Whether the font asks for hinted metrics.
    fn hint_metrics(&self) -> bool;

    /// Ink rectangle of `glyph` when measured with `hinting`.
    fn ink_rect(&self, glyph: u32, hinting: Hinting) -> InkRect;
}

/// An axis-aligned pixel rectangle inside an image.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AtlasRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl AtlasRect {
    /// Number of pixels covered.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The rectangle grown by `amount` on every side.
    ///
    /// The caller must ensure the rectangle does not start closer than
    /// `amount` to the image edge.
    pub fn inflate(&self, amount: u32) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + 2 * amount,
            height: self.height + 2 * amount,
        }
    }

    /// Whether the two rectangles share any pixel.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Pen position of a glyph relative to the top left corner of its bounds.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GlyphOrigin {
    /// Horizontal offset in pixels.
    pub x: f32,
    /// Vertical offset in pixels.
    pub y: f32,
}

/// A cached glyph: the image holding it, where, and how to position it.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphImage<I> {
    /// Atlas or standalone image the glyph was written to.
    pub image: I,
    /// Glyph pixels inside `image`, excluding padding.
    pub bounds: AtlasRect,
    /// Pen position relative to the top left corner of `bounds`.
    ///
    /// To draw the glyph with its pen at `p`, place `bounds` at `p - origin`.
    pub origin: GlyphOrigin,
}

/// A rasterization the caller must perform before the image is sampled.
///
/// Collected by the cache on every glyph miss and drained with
/// [`GpuCache::take_pending_uploads`](crate::GpuCache::take_pending_uploads).
#[derive(Clone, Debug)]
pub struct GlyphUpload<I, F> {
    /// Target image.
    pub image: I,
    /// Font to rasterize with.
    pub font: F,
    /// Glyph index.
    pub glyph: u32,
    /// Hinting the glyph was measured with.
    pub hinting: Hinting,
    /// Device scale.
    pub scale: f32,
    /// Region of `image` to clear and draw into, including padding.
    pub area: AtlasRect,
    /// Pen position in `image` coordinates.
    pub origin: GlyphOrigin,
}

/// Integer device-pixel box around a glyph's ink.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct PixelBounds {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) origin: GlyphOrigin,
}

impl PixelBounds {
    /// Rounds the scaled ink rectangle outwards to whole pixels, after shifting
    /// it by the subpixel offset of `flags`.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "pixel coordinates of a glyph are far below i32::MAX"
    )]
    pub(crate) fn new(ink: InkRect, scale: f32, flags: SubpixelFlags) -> Self {
        let units = scale / FONT_UNITS_PER_PIXEL as f32;
        let sx = flags.x_offset();
        let sy = flags.y_offset();

        let x0 = (ink.x as f32 * units + sx).floor();
        let y0 = (ink.y as f32 * units + sy).floor();
        let x1 = ((ink.x + ink.width) as f32 * units + sx).ceil();
        let y1 = ((ink.y + ink.height) as f32 * units + sy).ceil();

        Self {
            width: u32::try_from((x1 - x0) as i32).unwrap_or(0),
            height: u32::try_from((y1 - y0) as i32).unwrap_or(0),
            origin: GlyphOrigin {
                x: sx - x0,
                y: sy - y0,
            },
        }
    }
}
