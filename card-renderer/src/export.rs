//! Card export to image formats.
//!
//! Renders a [`Document`] to SVG, PNG, or JPEG. The document is first
//! reduced to a [`card_core::Composite`] so paint order and per-type
//! fallbacks are decided in one place, then written as SVG and rasterized
//! through the resvg/tiny-skia pipeline.

use std::fmt::Write;

use card_core::{compose, Document, Layer, LayerContent};
use image::ImageEncoder;

use crate::error::{RenderError, RenderResult};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image, composited onto the configured matte.
    Jpeg,
    /// SVG vector graphics (returns the SVG XML string as UTF-8 bytes).
    Svg,
}

impl ExportFormat {
    /// Parse a format name as it appears in a request, case-insensitively.
    /// Accepts `jpg` as an alias for `jpeg`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Svg => "svg",
        }
    }

    /// MIME type for HTTP responses.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }

    /// File extension for download filenames.
    #[must_use]
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Svg => "svg",
        }
    }
}

/// Configuration for card export.
#[derive(Debug, Clone, Copy)]
pub struct ExportConfig {
    /// Scale factor applied to the document dimensions (default: 2.0 for
    /// crisp output on high-density displays).
    pub scale: f32,
    /// JPEG quality 1-100 (default: 85).
    pub jpeg_quality: u8,
    /// Matte color as RGBA bytes, used when flattening alpha for JPEG.
    pub matte: [u8; 4],
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            jpeg_quality: 85,
            matte: [255, 255, 255, 255],
        }
    }
}

/// Exports a [`Document`] to image formats.
pub struct CardExporter {
    config: ExportConfig,
}

impl CardExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Export a document to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be rendered or encoded.
    pub fn export(&self, document: &Document, format: ExportFormat) -> RenderResult<Vec<u8>> {
        tracing::debug!(
            format = format.name(),
            elements = document.element_count(),
            "exporting card"
        );
        match format {
            ExportFormat::Png => self.render_to_png(document),
            ExportFormat::Jpeg => self.render_to_jpeg(document),
            ExportFormat::Svg => {
                let svg = self.render_to_svg(document);
                Ok(svg.into_bytes())
            }
        }
    }

    /// Export the document to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    pub fn render_to_png(&self, document: &Document) -> RenderResult<Vec<u8>> {
        let svg_string = self.render_to_svg(document);
        let pixmap = rasterize_svg(&svg_string)?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
    }

    /// Export the document to JPEG bytes.
    ///
    /// JPEG has no alpha channel, so the raster is composited onto the
    /// configured matte first.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_to_jpeg(&self, document: &Document) -> RenderResult<Vec<u8>> {
        let svg_string = self.render_to_svg(document);
        let pixmap = rasterize_svg(&svg_string)?;

        let (width, height) = (pixmap.width(), pixmap.height());
        let matte = &self.config.matte;
        let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
        for pixel in pixmap.data().chunks_exact(4) {
            let alpha = f32::from(pixel[3]) / 255.0;
            let inv = 1.0 - alpha;
            rgb_data.push((f32::from(pixel[0]).mul_add(alpha, f32::from(matte[0]) * inv)) as u8);
            rgb_data.push((f32::from(pixel[1]).mul_add(alpha, f32::from(matte[1]) * inv)) as u8);
            rgb_data.push((f32::from(pixel[2]).mul_add(alpha, f32::from(matte[2]) * inv)) as u8);
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Render the document to an SVG string.
    ///
    /// Layers are written in composite paint order, each inside a nested
    /// `<svg>` element that clips the layer to its own box.
    #[must_use]
    pub fn render_to_svg(&self, document: &Document) -> String {
        let composite = compose(document);
        let (out_w, out_h) = self.output_dimensions(composite.width, composite.height);

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {} {}\">",
            composite.width, composite.height,
        );

        let bg_color = escape_xml(&composite.background.color);
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"{bg_color}\"/>"
        );
        if let Some(image) = &composite.background.image {
            let href = escape_xml(image);
            let _ = write!(
                svg,
                "<image x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\" href=\"{href}\"/>",
                composite.width, composite.height,
            );
        }

        for layer in &composite.layers {
            render_layer_svg(&mut svg, layer);
        }

        svg.push_str("</svg>");
        svg
    }

    /// Output pixel dimensions after scaling.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn output_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        #[allow(clippy::cast_precision_loss)]
        let out_w = (width as f32 * self.config.scale) as u32;
        #[allow(clippy::cast_precision_loss)]
        let out_h = (height as f32 * self.config.scale) as u32;
        (out_w.max(1), out_h.max(1))
    }
}

/// Rasterize an SVG string to a tiny-skia Pixmap.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rasterize_svg(svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg_string, &opt)
        .map_err(|e| RenderError::Svg(format!("SVG parsing failed: {e}")))?;

    let px_w = tree.size().width() as u32;
    let px_h = tree.size().height() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
        .ok_or_else(|| RenderError::Raster("Failed to create pixmap".to_string()))?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    Ok(pixmap)
}

/// Render a single composite layer to SVG.
fn render_layer_svg(svg: &mut String, layer: &Layer) {
    let frame = layer.frame;
    // a nested svg element clips its content to the layer box
    let _ = write!(
        svg,
        "<svg x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\">",
        frame.x, frame.y, frame.width, frame.height,
    );

    match &layer.content {
        LayerContent::Text {
            text,
            font_size,
            color,
            bold,
        } => {
            let escaped = escape_xml(text);
            let escaped_color = escape_xml(color);
            let weight = if *bold { " font-weight=\"bold\"" } else { "" };
            let _ = write!(
                svg,
                "<text x=\"0\" y=\"{font_size}\" font-size=\"{font_size}\" fill=\"{escaped_color}\" font-family=\"sans-serif\"{weight}>{escaped}</text>",
            );
        }

        // already past the safety check; scales its viewBox to the box
        LayerContent::Icon { markup } => svg.push_str(markup),

        LayerContent::Image { url } => {
            let href = escape_xml(url);
            let _ = write!(
                svg,
                "<image width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid meet\" href=\"{href}\"/>",
                frame.width, frame.height,
            );
        }

        LayerContent::Placeholder { label } => {
            let escaped = escape_xml(label);
            svg.push_str(
                "<rect width=\"100%\" height=\"100%\" fill=\"#e0e0e0\" stroke=\"#999\" stroke-width=\"1\"/>",
            );
            let center_x = frame.width / 2.0;
            let center_y = frame.height / 2.0;
            let _ = write!(
                svg,
                "<text x=\"{center_x}\" y=\"{center_y}\" font-size=\"14\" fill=\"#666\" text-anchor=\"middle\" font-family=\"sans-serif\">{escaped}</text>",
            );
        }
    }

    svg.push_str("</svg>");
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
