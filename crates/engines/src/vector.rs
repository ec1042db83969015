//! Intermediate vector description shared between tracer and renderers.
//!
//! The representation is deliberately simple: per-color layers of
//! horizontal pixel runs. It loses curve information a smarter tracer
//! would keep, but it is exact, compact for flat artwork, and trivially
//! deterministic.

use serde::Serialize;

/// One horizontal run of same-colored pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Run {
    pub x: u32,
    pub y: u32,
    pub len: u32,
}

/// All runs sharing one fill color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorLayer {
    /// RGB fill color.
    pub color: [u8; 3],
    /// Runs in row-major order.
    pub runs: Vec<Run>,
}

/// A traced image: canvas size plus color layers ordered by color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorDocument {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<ColorLayer>,
}

impl VectorDocument {
    /// Total number of runs across all layers, the document's rough
    /// complexity measure.
    pub fn run_count(&self) -> usize {
        self.layers.iter().map(|l| l.runs.len()).sum()
    }
}

/// Format a color as a lowercase `#rrggbb` hex string.
pub fn hex_color(color: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}
