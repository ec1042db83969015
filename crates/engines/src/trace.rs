//! Built-in vector tracer.
//!
//! Quantizes colors, rejects images whose quantized palette exceeds the
//! complexity threshold, then run-length encodes each row into per-color
//! layers. White pixels are treated as cleared background and skipped.

use std::collections::BTreeMap;

use async_trait::async_trait;
use image::RgbImage;

use govector_core::error::ConvertError;

use crate::vector::{ColorLayer, Run, VectorDocument};
use crate::{ColorMode, VectorTracer};

/// Quantization step per channel. 32 keeps 8 levels per channel, close
/// to the original engine's `color_precision` setting.
pub const DEFAULT_QUANT_STEP: u8 = 32;

/// Maximum distinct quantized colors before an image is declared too
/// complex to vectorize (photographs, gradient-heavy art).
pub const DEFAULT_MAX_COLORS: usize = 32;

/// Channel floor above which a pixel counts as background white.
const WHITE_FLOOR: u8 = 240;

/// Luma threshold for mono tracing.
const MONO_THRESHOLD: u16 = 128;

/// Reference tracer with palette quantization and a complexity gate.
#[derive(Debug, Clone)]
pub struct QuantizingTracer {
    quant_step: u8,
    max_colors: usize,
}

impl Default for QuantizingTracer {
    fn default() -> Self {
        Self {
            quant_step: DEFAULT_QUANT_STEP,
            max_colors: DEFAULT_MAX_COLORS,
        }
    }
}

impl QuantizingTracer {
    pub fn new(quant_step: u8, max_colors: usize) -> Self {
        Self {
            quant_step,
            max_colors,
        }
    }

    /// Snap a channel to the center of its quantization bucket.
    fn quantize_channel(&self, c: u8) -> u8 {
        let step = self.quant_step as u16;
        let bucket = c as u16 / step;
        (bucket * step + step / 2).min(255) as u8
    }

    /// Map a pixel to its traced color, or `None` for background.
    fn classify(&self, px: [u8; 3], mode: ColorMode) -> Option<[u8; 3]> {
        if px.iter().all(|c| *c >= WHITE_FLOOR) {
            return None;
        }
        match mode {
            ColorMode::Color => Some([
                self.quantize_channel(px[0]),
                self.quantize_channel(px[1]),
                self.quantize_channel(px[2]),
            ]),
            ColorMode::Mono => {
                // Integer Rec. 601 luma.
                let luma = (299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32) / 1000;
                if (luma as u16) < MONO_THRESHOLD {
                    Some([0, 0, 0])
                } else {
                    None
                }
            }
        }
    }

    fn encode_runs(&self, img: &RgbImage, mode: ColorMode) -> BTreeMap<[u8; 3], Vec<Run>> {
        let mut layers: BTreeMap<[u8; 3], Vec<Run>> = BTreeMap::new();
        for y in 0..img.height() {
            let mut current: Option<([u8; 3], Run)> = None;
            for x in 0..img.width() {
                let color = self.classify(img.get_pixel(x, y).0, mode);
                match (&mut current, color) {
                    (Some((c, run)), Some(n)) if *c == n => run.len += 1,
                    (slot, next) => {
                        if let Some((c, run)) = slot.take() {
                            layers.entry(c).or_default().push(run);
                        }
                        *slot = next.map(|c| (c, Run { x, y, len: 1 }));
                    }
                }
            }
            if let Some((c, run)) = current {
                layers.entry(c).or_default().push(run);
            }
        }
        layers
    }
}

#[async_trait]
impl VectorTracer for QuantizingTracer {
    async fn trace(&self, image: &[u8], mode: ColorMode) -> Result<VectorDocument, ConvertError> {
        let decoded = image::load_from_memory(image)
            .map_err(|e| ConvertError::VectorizationFailed(format!("decode failed: {e}")))?
            .to_rgb8();

        let layers = self.encode_runs(&decoded, mode);

        if mode == ColorMode::Color && layers.len() > self.max_colors {
            return Err(ConvertError::TooComplex(format!(
                "{} distinct colors after quantization (limit {})",
                layers.len(),
                self.max_colors
            )));
        }

        let doc = VectorDocument {
            width: decoded.width(),
            height: decoded.height(),
            layers: layers
                .into_iter()
                .map(|(color, runs)| ColorLayer { color, runs })
                .collect(),
        };

        if doc.layers.is_empty() {
            return Err(ConvertError::VectorizationFailed(
                "nothing to trace: image is entirely background".to_string(),
            ));
        }

        tracing::debug!(
            layers = doc.layers.len(),
            runs = doc.run_count(),
            "Traced image",
        );
        Ok(doc)
    }
}
