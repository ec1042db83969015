//! Stage adapter seams and the built-in reference engines.
//!
//! The pipeline executor only ever talks to the three traits defined
//! here; any conforming engine can be substituted. The built-in
//! implementations ([`background::FlattenBackgroundRemover`],
//! [`trace::QuantizingTracer`], [`render::PrintRenderer`]) are
//! deterministic, dependency-light reference engines good enough for
//! logos and flat artwork.

pub mod background;
pub mod render;
pub mod trace;
pub mod vector;

use async_trait::async_trait;

use govector_core::error::ConvertError;
use govector_core::job::OutputFormat;

use vector::VectorDocument;

/// Hint passed to the tracer about how to treat color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Preserve the (quantized) palette.
    #[default]
    Color,
    /// Threshold to black and white.
    Mono,
}

/// Removes the background from a raster image: raster bytes in, raster
/// bytes out.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, ConvertError>;
}

/// Traces a raster image into a vector description.
///
/// Must fail with [`ConvertError::TooComplex`], and nothing else, when
/// the image exceeds the engine's complexity threshold, so the pipeline
/// can mark the job non-retryable.
#[async_trait]
pub trait VectorTracer: Send + Sync {
    async fn trace(&self, image: &[u8], mode: ColorMode) -> Result<VectorDocument, ConvertError>;
}

/// Renders a vector description into one of the target output formats.
///
/// Equal input must produce byte-identical output; callers rely on this
/// for caching and deterministic tests.
#[async_trait]
pub trait FormatRenderer: Send + Sync {
    async fn render(
        &self,
        doc: &VectorDocument,
        format: OutputFormat,
    ) -> Result<Vec<u8>, ConvertError>;
}
