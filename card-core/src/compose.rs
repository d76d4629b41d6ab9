//! Deterministic compositing - document to ordered, paint-ready layers.
//!
//! Interactive display and static export both consume the same composite,
//! so an exported card matches what the editor showed. Paint order is
//! recomputed from `(zIndex, insertion position)` on every call; nothing
//! caches a sorted copy that could drift from the element sequence.

use crate::document::{Background, Document};
use crate::element::{Element, ElementContent, ElementId, IconPayload, TextPayload};
use crate::sanitize;

/// Font size used when a text-like payload does not set one.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
/// Text color used when a text-like payload does not set one.
pub const DEFAULT_TEXT_COLOR: &str = "#000";

/// A document reduced to paint-ready layers in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    /// Viewport width in document units.
    pub width: u32,
    /// Viewport height in document units.
    pub height: u32,
    /// Painted first, below every layer.
    pub background: Background,
    /// Layers in ascending paint order.
    pub layers: Vec<Layer>,
}

/// One paint-ready element.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Id of the source element.
    pub id: ElementId,
    /// Absolute box; may extend past the viewport, which clips it.
    pub frame: Frame,
    /// Type-resolved content with fallbacks applied.
    pub content: LayerContent,
}

/// Absolutely positioned box in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
}

/// Paint instruction for one layer, clipped to its frame.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerContent {
    /// A run of text.
    Text {
        /// Resolved text, fallback already applied.
        text: String,
        /// Resolved font size.
        font_size: f64,
        /// Resolved color token.
        color: String,
        /// Preparation steps render bold.
        bold: bool,
    },
    /// Inline vector markup that passed the safety check.
    Icon {
        /// SVG markup, verbatim from the payload.
        markup: String,
    },
    /// Raster image, fit-contained (aspect preserved, letterboxed).
    Image {
        /// Source URL.
        url: String,
    },
    /// A visible stand-in for content that cannot be painted.
    Placeholder {
        /// Short label shown centered in the frame.
        label: String,
    },
}

/// Reduce a document to paint order.
///
/// Elements sort by ascending `zIndex`; ties keep insertion order because
/// the sort is stable. Per-type fallbacks match the editor: missing or
/// empty text becomes a "Double-click to edit …" prompt with
/// [`DEFAULT_FONT_SIZE`] and [`DEFAULT_TEXT_COLOR`], an image without a URL
/// and any drawing degrade to placeholders, and icon markup that fails
/// [`sanitize::is_safe_icon_markup`] is replaced by a placeholder carrying
/// the icon name rather than painted.
#[must_use]
pub fn compose(doc: &Document) -> Composite {
    let mut ordered: Vec<&Element> = doc.elements().iter().collect();
    ordered.sort_by_key(|element| element.z_index);

    Composite {
        width: doc.dimensions().width(),
        height: doc.dimensions().height(),
        background: doc.background().clone(),
        layers: ordered.into_iter().map(layer).collect(),
    }
}

fn layer(element: &Element) -> Layer {
    Layer {
        id: element.id.clone(),
        frame: Frame {
            x: element.position.x,
            y: element.position.y,
            width: element.size.width,
            height: element.size.height,
        },
        content: resolve(element),
    }
}

fn resolve(element: &Element) -> LayerContent {
    match &element.content {
        ElementContent::Text(payload) => text_content(payload, "text", false),
        ElementContent::Ingredient(payload) => text_content(payload, "ingredient", false),
        ElementContent::Step(payload) => text_content(payload, "step", true),
        ElementContent::SvgIcon(payload) => icon_content(payload),
        ElementContent::Image(payload) => match payload.image_url.as_deref() {
            Some(url) if !url.trim().is_empty() => LayerContent::Image {
                url: url.to_string(),
            },
            _ => LayerContent::Placeholder {
                label: "Image".to_string(),
            },
        },
        ElementContent::Drawing(_) => LayerContent::Placeholder {
            label: "Drawing placeholder".to_string(),
        },
    }
}

fn text_content(payload: &TextPayload, type_name: &str, bold: bool) -> LayerContent {
    let text = match payload.text.as_deref() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!("Double-click to edit {type_name}"),
    };
    let font_size = payload
        .font_size
        .filter(|size| size.is_finite() && *size > 0.0)
        .unwrap_or(DEFAULT_FONT_SIZE);
    let color = match payload.color.as_deref() {
        Some(color) if !color.is_empty() => color.to_string(),
        _ => DEFAULT_TEXT_COLOR.to_string(),
    };
    LayerContent::Text {
        text,
        font_size,
        color,
        bold,
    }
}

fn icon_content(payload: &IconPayload) -> LayerContent {
    let label = payload
        .icon
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Icon".to_string());

    match payload.svg_path.as_deref() {
        Some(markup) if !markup.trim().is_empty() => {
            if sanitize::is_safe_icon_markup(markup) {
                LayerContent::Icon {
                    markup: markup.to_string(),
                }
            } else {
                tracing::warn!(icon = %label, "rejected unsafe icon markup");
                LayerContent::Placeholder { label }
            }
        }
        _ => LayerContent::Placeholder { label },
    }
}
