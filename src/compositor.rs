//! Layers an overlay (usually a border frame) on top of an icon.
//!
//! Images decoded by the `image` crate always start at the origin, but once
//! an offset is applied they can land anywhere on the canvas. `Rect` and
//! `Canvas` keep track of those coordinates so the output is always sized to
//! the union of both placed images.

use std::{fmt, str::FromStr};

use anyhow::bail;
use image::{GenericImageView, Rgba, RgbaImage};

/// Offset of the base icon when none is given. The default border asset is
/// authored 7 pixels wider than the icon on every side.
pub const DEFAULT_BASE_OFFSET: Offset = Offset { x: -7, y: -7 };

pub const DEFAULT_OVERLAY_OFFSET: Offset = Offset { x: 0, y: 0 };

/// Offsets are limited to this distance from the origin on each axis so the
/// canvas stays a sensible size.
pub const MAX_OFFSET: i32 = 4096;

/// A 2D integer vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// The point of a source image that ends up at the canvas origin. An image
/// with bounds `b` drawn at offset `o` covers `b - o` on the canvas.
pub type Offset = Point;

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn clamped(self, limit: i32) -> Self {
        Self::new(self.x.clamp(-limit, limit), self.y.clamp(-limit, limit))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{},{}", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        if let Some((x, y)) = value
            .split_once(',')
            .map(|(x, y)| (x.trim().parse::<i32>(), y.trim().parse::<i32>()))
        {
            let point = Point::new(x?, y?);
            if point.clamped(MAX_OFFSET) != point {
                bail!("offset '{value}' is out of range - both values must be between -{MAX_OFFSET} and {MAX_OFFSET}")
            }

            Ok(point)
        } else {
            bail!("invalid offset '{value}' - please pass your offset in the X,Y format (e.g. -7,-7 or 0,0)")
        }
    }
}

/// A half-open rectangle: `min` is inside, `max` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            min: Point::default(),
            max: Point::new(
                i32::try_from(width).unwrap_or(i32::MAX),
                i32::try_from(height).unwrap_or(i32::MAX),
            ),
        }
    }

    pub fn of<I: GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self::from_size(width, height)
    }

    pub fn width(&self) -> u32 {
        span(self.min.x, self.max.x)
    }

    pub fn height(&self) -> u32 {
        span(self.min.y, self.max.y)
    }

    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Where this rectangle lands when drawn at `offset`. Coordinates
    /// saturate at the `i32` range.
    pub fn placed_at(&self, offset: Offset) -> Self {
        Self {
            min: Point::new(
                self.min.x.saturating_sub(offset.x),
                self.min.y.saturating_sub(offset.y),
            ),
            max: Point::new(
                self.max.x.saturating_sub(offset.x),
                self.max.y.saturating_sub(offset.y),
            ),
        }
    }

    /// Smallest rectangle containing both. Empty rectangles contribute
    /// nothing.
    pub fn union(&self, other: &Rect) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (self.min.x <= other.min.x
                && self.min.y <= other.min.y
                && other.max.x <= self.max.x
                && other.max.y <= self.max.y)
    }
}

fn span(min: i32, max: i32) -> u32 {
    u32::try_from((i64::from(max) - i64::from(min)).max(0)).unwrap_or(u32::MAX)
}

impl fmt::Display for Rect {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "({})-({}) [{}x{}]",
            self.min,
            self.max,
            self.width(),
            self.height()
        )
    }
}

/// Source-over for straight (non-premultiplied) alpha, in integer
/// arithmetic. A transparent source leaves `dst` untouched, an opaque one
/// replaces it, and an opaque `dst` stays opaque.
pub fn blend_over(dst: &mut Rgba<u8>, src: &Rgba<u8>) {
    let src_alpha = u32::from(src[3]);
    if src_alpha == 0 {
        return;
    }
    if src_alpha == 255 {
        *dst = *src;
        return;
    }

    let dst_alpha = u32::from(dst[3]);
    let dst_weight = dst_alpha * (255 - src_alpha);

    // Alpha scaled by 255 * 255.
    let out_alpha = src_alpha * 255 + dst_weight;

    for channel in 0..3 {
        let mixed = u32::from(src[channel]) * src_alpha * 255 + u32::from(dst[channel]) * dst_weight;
        dst[channel] = ((mixed + out_alpha / 2) / out_alpha) as u8;
    }
    dst[3] = ((out_alpha + 127) / 255) as u8;
}

/// The result of a composite: RGBA pixels plus the canvas coordinates of
/// the top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub bounds: Rect,
    pub pixels: RgbaImage,
}

impl Canvas {
    /// A fully transparent canvas covering `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            pixels: RgbaImage::new(bounds.width(), bounds.height()),
        }
    }

    /// Pixel at canvas coordinates, or `None` outside the bounds.
    #[cfg(test)]
    pub fn pixel(&self, x: i32, y: i32) -> Option<&Rgba<u8>> {
        let (local_x, local_y) = (x - self.bounds.min.x, y - self.bounds.min.y);
        if local_x < 0 || local_y < 0 {
            return None;
        }

        self.pixels.get_pixel_checked(local_x as u32, local_y as u32)
    }

    /// Overwrites the canvas with `source` drawn at `offset`, ignoring alpha.
    fn draw_src(&mut self, source: &RgbaImage, offset: Offset) {
        self.draw_with(source, offset, |dst, src| *dst = *src);
    }

    /// Blends `source` drawn at `offset` over what is already on the canvas.
    fn draw_over(&mut self, source: &RgbaImage, offset: Offset) {
        self.draw_with(source, offset, blend_over);
    }

    fn draw_with<F>(&mut self, source: &RgbaImage, offset: Offset, mut draw: F)
    where
        F: FnMut(&mut Rgba<u8>, &Rgba<u8>),
    {
        let placed = Rect::of(source).placed_at(offset);
        let left = i64::from(placed.min.x) - i64::from(self.bounds.min.x);
        let top = i64::from(placed.min.y) - i64::from(self.bounds.min.y);
        let (canvas_width, canvas_height) = self.pixels.dimensions();

        for (x, y, pixel) in source.enumerate_pixels() {
            let (canvas_x, canvas_y) = (left + i64::from(x), top + i64::from(y));
            let (Ok(canvas_x), Ok(canvas_y)) = (u32::try_from(canvas_x), u32::try_from(canvas_y))
            else {
                continue;
            };

            if canvas_x < canvas_width && canvas_y < canvas_height {
                draw(self.pixels.get_pixel_mut(canvas_x, canvas_y), pixel);
            }
        }
    }
}

/// Draws `base` as-is and then blends `overlay` over it (source-over). The
/// canvas covers exactly the union of both placed images; anything neither
/// image touches stays transparent black.
///
/// Offsets left as `None` fall back to [`DEFAULT_BASE_OFFSET`] and
/// [`DEFAULT_OVERLAY_OFFSET`]. Offsets beyond [`MAX_OFFSET`] are clamped.
pub fn composite(
    base: &RgbaImage,
    overlay: &RgbaImage,
    base_offset: Option<Offset>,
    overlay_offset: Option<Offset>,
) -> Canvas {
    let base_offset = clamp_offset(base_offset.unwrap_or(DEFAULT_BASE_OFFSET));
    let overlay_offset = clamp_offset(overlay_offset.unwrap_or(DEFAULT_OVERLAY_OFFSET));

    let bounds = Rect::of(base)
        .placed_at(base_offset)
        .union(&Rect::of(overlay).placed_at(overlay_offset));

    log::trace!(
        "compositing base at {} and overlay at {} onto canvas {}",
        base_offset,
        overlay_offset,
        bounds
    );

    let mut canvas = Canvas::new(bounds);
    canvas.draw_src(base, base_offset);
    canvas.draw_over(overlay, overlay_offset);
    canvas
}

fn clamp_offset(offset: Offset) -> Offset {
    let clamped = offset.clamped(MAX_OFFSET);
    if clamped != offset {
        log::warn!("offset {} is out of range, using {} instead", offset, clamped);
    }
    clamped
}
