//! Built-in background remover.
//!
//! Pipeline: decode, composite any alpha onto white, clear a
//! corner-sampled uniform background to white, and downscale so neither
//! dimension exceeds the configured maximum. Output is always PNG.

use std::io::Cursor;

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView, ImageFormat as RasterFormat, Rgb, RgbImage};

use govector_core::error::ConvertError;

use crate::BackgroundRemover;

/// Images larger than this on either axis are resized, preserving
/// aspect ratio.
pub const DEFAULT_MAX_DIMENSION: u32 = 2000;

/// Per-channel tolerance when matching pixels against the sampled
/// background color.
const BACKGROUND_TOLERANCE: u8 = 24;

/// Reference background remover.
#[derive(Debug, Clone)]
pub struct FlattenBackgroundRemover {
    max_dimension: u32,
}

impl Default for FlattenBackgroundRemover {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl FlattenBackgroundRemover {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    /// Composite alpha onto a white background, dropping transparency.
    fn flatten(img: &DynamicImage) -> RgbImage {
        let rgba = img.to_rgba8();
        let mut out = RgbImage::new(rgba.width(), rgba.height());
        for (x, y, px) in rgba.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            let alpha = a as u16;
            let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
            out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
        }
        out
    }

    /// If at least three corners agree on a color, treat that color as
    /// the background and clear matching pixels to white.
    fn clear_background(img: &mut RgbImage) -> bool {
        let (w, h) = img.dimensions();
        if w < 2 || h < 2 {
            return false;
        }
        let corners = [
            *img.get_pixel(0, 0),
            *img.get_pixel(w - 1, 0),
            *img.get_pixel(0, h - 1),
            *img.get_pixel(w - 1, h - 1),
        ];

        let close = |a: Rgb<u8>, b: Rgb<u8>| {
            a.0.iter()
                .zip(b.0.iter())
                .all(|(x, y)| x.abs_diff(*y) <= BACKGROUND_TOLERANCE)
        };

        let background = corners
            .iter()
            .find(|c| corners.iter().filter(|o| close(**c, **o)).count() >= 3)
            .copied();

        let Some(bg) = background else {
            return false;
        };

        for px in img.pixels_mut() {
            if close(*px, bg) {
                *px = Rgb([255, 255, 255]);
            }
        }
        true
    }

    fn resize_if_needed(&self, img: DynamicImage) -> DynamicImage {
        let (w, h) = img.dimensions();
        if w <= self.max_dimension && h <= self.max_dimension {
            return img;
        }
        img.resize(
            self.max_dimension,
            self.max_dimension,
            image::imageops::FilterType::Lanczos3,
        )
    }
}

#[async_trait]
impl BackgroundRemover for FlattenBackgroundRemover {
    async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, ConvertError> {
        let decoded = image::load_from_memory(image)
            .map_err(|e| ConvertError::BackgroundRemovalFailed(format!("decode failed: {e}")))?;

        let mut flat = Self::flatten(&decoded);
        let cleared = Self::clear_background(&mut flat);
        tracing::debug!(
            width = flat.width(),
            height = flat.height(),
            background_cleared = cleared,
            "Background removal pass finished",
        );

        let resized = self.resize_if_needed(DynamicImage::ImageRgb8(flat));

        let mut out = Cursor::new(Vec::new());
        resized
            .write_to(&mut out, RasterFormat::Png)
            .map_err(|e| ConvertError::BackgroundRemovalFailed(format!("encode failed: {e}")))?;
        Ok(out.into_inner())
    }
}
