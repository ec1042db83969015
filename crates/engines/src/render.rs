//! Built-in format renderers: SVG, EPS, and PDF from one
//! [`VectorDocument`].
//!
//! All three outputs are assembled as plain byte strings with fixed
//! formatting, so equal documents render to byte-identical artifacts.

use async_trait::async_trait;

use govector_core::error::ConvertError;
use govector_core::job::OutputFormat;

use crate::vector::{hex_color, VectorDocument};
use crate::FormatRenderer;

/// Reference renderer for all three print formats.
#[derive(Debug, Clone, Default)]
pub struct PrintRenderer;

impl PrintRenderer {
    fn render_svg(doc: &VectorDocument) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
             viewBox=\"0 0 {w} {h}\" shape-rendering=\"crispEdges\">\n",
            w = doc.width,
            h = doc.height
        ));
        for layer in &doc.layers {
            out.push_str(&format!("<g fill=\"{}\">\n", hex_color(layer.color)));
            for run in &layer.runs {
                out.push_str(&format!(
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"1\"/>\n",
                    run.x, run.y, run.len
                ));
            }
            out.push_str("</g>\n");
        }
        out.push_str("</svg>\n");
        out.into_bytes()
    }

    fn render_eps(doc: &VectorDocument) -> Vec<u8> {
        let mut out = String::new();
        out.push_str("%!PS-Adobe-3.0 EPSF-3.0\n");
        out.push_str(&format!(
            "%%BoundingBox: 0 0 {} {}\n%%Pages: 1\n%%EndComments\n",
            doc.width, doc.height
        ));
        for layer in &doc.layers {
            let [r, g, b] = layer.color;
            out.push_str(&format!(
                "{:.3} {:.3} {:.3} setrgbcolor\n",
                r as f64 / 255.0,
                g as f64 / 255.0,
                b as f64 / 255.0
            ));
            for run in &layer.runs {
                // PostScript's origin is bottom-left.
                let y = doc.height - run.y - 1;
                out.push_str(&format!("{} {} {} 1 rectfill\n", run.x, y, run.len));
            }
        }
        out.push_str("showpage\n%%EOF\n");
        out.into_bytes()
    }

    fn render_pdf(doc: &VectorDocument) -> Vec<u8> {
        let mut content = String::new();
        for layer in &doc.layers {
            let [r, g, b] = layer.color;
            content.push_str(&format!(
                "{:.3} {:.3} {:.3} rg\n",
                r as f64 / 255.0,
                g as f64 / 255.0,
                b as f64 / 255.0
            ));
            for run in &layer.runs {
                let y = doc.height - run.y - 1;
                content.push_str(&format!("{} {} {} 1 re\n", run.x, y, run.len));
            }
            content.push_str("f\n");
        }

        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Contents 4 0 R >>",
                doc.width, doc.height
            ),
            format!(
                "<< /Length {} >>\nstream\n{}endstream",
                content.len(),
                content
            ),
        ];

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
        }

        let xref_offset = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
        pdf.push_str("0000000000 65535 f \n");
        for offset in &offsets {
            pdf.push_str(&format!("{offset:010} 00000 n \n"));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        ));
        pdf.into_bytes()
    }
}

#[async_trait]
impl FormatRenderer for PrintRenderer {
    async fn render(
        &self,
        doc: &VectorDocument,
        format: OutputFormat,
    ) -> Result<Vec<u8>, ConvertError> {
        if doc.width == 0 || doc.height == 0 {
            return Err(ConvertError::ProcessingFailed(
                "cannot render an empty canvas".to_string(),
            ));
        }
        Ok(match format {
            OutputFormat::Svg => Self::render_svg(doc),
            OutputFormat::Eps => Self::render_eps(doc),
            OutputFormat::Pdf => Self::render_pdf(doc),
        })
    }
}
