//! Turning a downloaded icon into the bytes that get written to disk.

use std::io::{self, Read, Write};

use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use thiserror::Error;

use crate::{
    compositor::{composite, Offset, Rect, DEFAULT_BASE_OFFSET, DEFAULT_OVERLAY_OFFSET},
    raster_source::{load_png, RasterSourceError},
};

const JPEG_QUALITY: u8 = 100;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to copy image data")]
    Copy(#[source] io::Error),

    #[error("failed to read icon data")]
    Read(#[source] io::Error),

    #[error("failed to decode icon as JPEG")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode composited icon as JPEG")]
    Encode(#[source] image::ImageError),
}

/// An overlay image, decoded once, that can be composited onto any number of
/// icons.
#[derive(Debug, Clone)]
pub struct OverlayPipeline {
    overlay: RgbaImage,
    base_offset: Offset,
    overlay_offset: Offset,
}

impl OverlayPipeline {
    /// Loads the overlay from a URL or local path. Uses the default offsets.
    pub fn from_path(path: &str) -> Result<Self, RasterSourceError> {
        let pipeline = Self::new(load_png(path)?);
        let (width, height) = pipeline.overlay().dimensions();
        log::debug!("loaded overlay '{}' ({}x{})", path, width, height);

        Ok(pipeline)
    }

    pub fn new(overlay: DynamicImage) -> Self {
        Self {
            overlay: overlay.into_rgba8(),
            base_offset: DEFAULT_BASE_OFFSET,
            overlay_offset: DEFAULT_OVERLAY_OFFSET,
        }
    }

    pub fn with_offsets(mut self, base_offset: Offset, overlay_offset: Offset) -> Self {
        self.base_offset = base_offset;
        self.overlay_offset = overlay_offset;
        self
    }

    pub fn overlay(&self) -> &RgbaImage {
        &self.overlay
    }

    /// Decodes a JPEG from `reader`, composites the overlay on top of it and
    /// writes the result to `writer` as a JPEG.
    ///
    /// Nothing is cleaned up on failure: `writer` may already have received
    /// part of the output.
    pub fn apply<R: Read, W: Write>(&self, mut reader: R, writer: W) -> Result<(), TransformError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).map_err(TransformError::Read)?;

        let base = image::load_from_memory_with_format(&data, ImageFormat::Jpeg)
            .map_err(TransformError::Decode)?
            .into_rgba8();

        self.check_coverage(&base);

        let canvas = composite(
            &base,
            &self.overlay,
            Some(self.base_offset),
            Some(self.overlay_offset),
        );

        let flattened = flatten_over_black(&canvas.pixels);

        let mut encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
        encoder
            .encode_image(&flattened)
            .map_err(TransformError::Encode)
    }

    /// The offsets are tuned for one particular border asset. Warn when the
    /// overlay in use doesn't frame the icon.
    fn check_coverage(&self, base: &RgbaImage) {
        let base_rect = Rect::of(base).placed_at(self.base_offset);
        let overlay_rect = Rect::of(&self.overlay).placed_at(self.overlay_offset);

        if !overlay_rect.contains_rect(&base_rect) {
            log::warn!(
                "overlay {}x{} at offset {} does not cover the {}x{} icon at offset {}",
                overlay_rect.width(),
                overlay_rect.height(),
                self.overlay_offset,
                base_rect.width(),
                base_rect.height(),
                self.base_offset
            );
        }
    }
}

/// JPEG has no alpha channel, so translucent pixels are composited onto
/// black. Areas nothing was drawn on come out black.
fn flatten_over_black(pixels: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let Rgba([r, g, b, a]) = *pixels.get_pixel(x, y);
        let scale = |channel: u8| ((u32::from(channel) * u32::from(a) + 127) / 255) as u8;
        Rgb([scale(r), scale(g), scale(b)])
    })
}

/// Writes the icon in `reader` to `writer`, passing it through `pipeline`
/// if there is one and copying it byte-for-byte otherwise.
pub fn transform<R: Read, W: Write>(
    pipeline: Option<&OverlayPipeline>,
    mut reader: R,
    mut writer: W,
) -> Result<(), TransformError> {
    match pipeline {
        Some(pipeline) => pipeline.apply(reader, writer),
        None => {
            let written = io::copy(&mut reader, &mut writer).map_err(TransformError::Copy)?;
            log::trace!("copied {} bytes", written);
            Ok(())
        }
    }
}
