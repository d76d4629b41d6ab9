//! Card elements - positioned, typed, layered content on a document.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Supported element type tags, in wire spelling.
pub const ELEMENT_TYPES: [&str; 6] = [
    "text",
    "ingredient",
    "step",
    "image",
    "svg-icon",
    "drawing",
];

/// Unique identifier for an element within a document.
///
/// Generated ids combine the creation time in unix milliseconds with a
/// random discriminator, so elements created within the same millisecond
/// still get distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Generate a fresh unique id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("element-{}-{}", unix_millis(), Uuid::new_v4()))
    }

    /// Wrap an existing id string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current unix time in milliseconds.
pub(crate) fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

/// Creation-time z-index default: later-created elements paint on top.
pub(crate) fn creation_z_index() -> i64 {
    // Unix millis stay well inside i64 range for the foreseeable future.
    i64::try_from(unix_millis()).unwrap_or(i64::MAX)
}

/// Top-left offset in document coordinates (origin top-left, y down).
///
/// Positions are not constrained to the document bounds; an element dragged
/// partially or fully outside stays in the document and is clipped at paint
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Offset from the left edge.
    pub x: f64,
    /// Offset from the top edge.
    pub y: f64,
}

/// Element box size in document units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Box width; must be strictly positive.
    pub width: f64,
    /// Box height; must be strictly positive.
    pub height: f64,
}

/// Typed payload for text-like elements (`text`, `ingredient`, `step`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextPayload {
    /// The rendered text. Absent or empty falls back to an edit prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Font size in document units.
    #[serde(rename = "fontSize", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Text color as a CSS color token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Payload keys this engine does not understand, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed payload for image elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Image source URL or data URI.
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Payload keys this engine does not understand, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed payload for inline vector icon elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconPayload {
    /// Human-readable icon name, e.g. "Tomato".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Inline SVG markup. Untrusted; checked by [`crate::sanitize`] before
    /// it reaches a composite.
    #[serde(rename = "svgPath", skip_serializing_if = "Option::is_none")]
    pub svg_path: Option<String>,
    /// Icon tint color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Payload keys this engine does not understand, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed payload for freeform drawing elements.
///
/// Stroke data is carried through serialization untouched but is not
/// painted; the compositor emits a placeholder for drawings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawingPayload {
    /// Payload keys this engine does not understand, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The closed set of element content kinds.
///
/// Serialized adjacently as `"type"` / `"data"`, matching the persisted
/// wire form. Unknown keys inside `data` survive round-trips through each
/// payload's `extra` map; unknown `type` tags are rejected at the
/// serialization boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ElementContent {
    /// Plain text label.
    Text(TextPayload),
    /// Ingredient line; rendered like text.
    Ingredient(TextPayload),
    /// Preparation step; rendered bold.
    Step(TextPayload),
    /// Raster image, fit-contained in its box.
    Image(ImagePayload),
    /// Inline vector icon.
    SvgIcon(IconPayload),
    /// Freeform drawing.
    Drawing(DrawingPayload),
}

impl ElementContent {
    /// The wire name of this content kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Ingredient(_) => "ingredient",
            Self::Step(_) => "step",
            Self::Image(_) => "image",
            Self::SvgIcon(_) => "svg-icon",
            Self::Drawing(_) => "drawing",
        }
    }

    /// Text content with the common fields set.
    #[must_use]
    pub fn text(text: impl Into<String>, font_size: f64, color: impl Into<String>) -> Self {
        Self::Text(text_payload(text, font_size, color))
    }

    /// Ingredient line with the common fields set.
    #[must_use]
    pub fn ingredient(text: impl Into<String>, font_size: f64, color: impl Into<String>) -> Self {
        Self::Ingredient(text_payload(text, font_size, color))
    }

    /// Preparation step with the common fields set.
    #[must_use]
    pub fn step(text: impl Into<String>, font_size: f64, color: impl Into<String>) -> Self {
        Self::Step(text_payload(text, font_size, color))
    }

    /// Image content pointing at `url`.
    #[must_use]
    pub fn image(url: impl Into<String>) -> Self {
        Self::Image(ImagePayload {
            image_url: Some(url.into()),
            extra: Map::new(),
        })
    }

    /// Icon content with a name and inline markup.
    #[must_use]
    pub fn svg_icon(name: impl Into<String>, markup: impl Into<String>) -> Self {
        Self::SvgIcon(IconPayload {
            icon: Some(name.into()),
            svg_path: Some(markup.into()),
            color: None,
            extra: Map::new(),
        })
    }
}

fn text_payload(text: impl Into<String>, font_size: f64, color: impl Into<String>) -> TextPayload {
    TextPayload {
        text: Some(text.into()),
        font_size: Some(font_size),
        color: Some(color.into()),
        extra: Map::new(),
    }
}

/// One positioned, typed, layered element within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique within the owning document; assigned at creation.
    pub id: ElementId,
    /// Content kind and its typed payload.
    #[serde(flatten)]
    pub content: ElementContent,
    /// Top-left offset.
    pub position: Position,
    /// Box size.
    pub size: Size,
    /// Paint order; ascending, ties keep insertion order.
    #[serde(rename = "zIndex", default)]
    pub z_index: i64,
}

/// A new element as submitted, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDraft {
    /// Content kind and payload.
    #[serde(flatten)]
    pub content: ElementContent,
    /// Initial top-left offset.
    pub position: Position,
    /// Initial box size; both components must be strictly positive.
    pub size: Size,
    /// Explicit paint order. When absent the engine assigns the creation
    /// time in unix milliseconds, so later additions paint on top.
    #[serde(rename = "zIndex", default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
}

impl ElementDraft {
    /// Create a draft with the creation-time z-index default.
    #[must_use]
    pub fn new(content: ElementContent, position: Position, size: Size) -> Self {
        Self {
            content,
            position,
            size,
            z_index: None,
        }
    }

    /// Pin an explicit z-index instead of the creation-time default.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i64) -> Self {
        self.z_index = Some(z_index);
        self
    }
}

/// Partial element update.
///
/// Present fields replace the element's top-level fields wholesale; `data`
/// keys merge one by one into the existing payload so sibling keys survive.
/// A `null` value in `data` removes that key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementPatch {
    /// New top-left offset, applied verbatim (only drags clamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// New box size; ignored unless both components are positive and finite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// New paint order.
    #[serde(rename = "zIndex", skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    /// Payload keys to merge into the element's `data`.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl ElementPatch {
    /// Patch that only moves the element.
    #[must_use]
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Patch that only resizes the element.
    #[must_use]
    pub fn size(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// Patch that only restacks the element.
    #[must_use]
    pub fn z_index(z_index: i64) -> Self {
        Self {
            z_index: Some(z_index),
            ..Self::default()
        }
    }

    /// Patch that merges the given keys into the element's payload.
    #[must_use]
    pub fn data(data: Map<String, Value>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generated_ids_are_unique() {
        let ids: std::collections::HashSet<String> = (0..256)
            .map(|_| ElementId::generate().as_str().to_string())
            .collect();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn generated_ids_carry_the_element_prefix() {
        let id = ElementId::generate();
        assert!(id.as_str().starts_with("element-"));
        // prefix, millis, uuid
        assert!(id.as_str().split('-').count() >= 3);
    }

    #[test]
    fn element_serializes_with_adjacent_type_and_data() {
        let element = Element {
            id: ElementId::from_string("element-1"),
            content: ElementContent::text("Hello", 16.0, "#000"),
            position: Position { x: 10.0, y: 20.0 },
            size: Size {
                width: 200.0,
                height: 50.0,
            },
            z_index: 3,
        };

        let value = serde_json::to_value(&element).expect("serialize");
        assert_eq!(value["type"], "text");
        assert_eq!(value["data"]["text"], "Hello");
        assert_eq!(value["data"]["fontSize"], 16.0);
        assert_eq!(value["zIndex"], 3);
        assert_eq!(value["position"]["x"], 10.0);
    }

    #[test]
    fn svg_icon_uses_kebab_case_tag() {
        let content = ElementContent::svg_icon("Tomato", "<svg></svg>");
        let value = serde_json::to_value(&content).expect("serialize");
        assert_eq!(value["type"], "svg-icon");
        assert_eq!(value["data"]["svgPath"], "<svg></svg>");
    }

    #[test]
    fn unknown_data_keys_survive_a_round_trip() {
        let raw = json!({
            "id": "element-7",
            "type": "text",
            "data": { "text": "Hi", "customTag": [1, 2, 3] },
            "position": { "x": 0.0, "y": 0.0 },
            "size": { "width": 100.0, "height": 40.0 },
            "zIndex": 1
        });

        let element: Element = serde_json::from_value(raw).expect("deserialize");
        let ElementContent::Text(payload) = &element.content else {
            panic!("expected text content");
        };
        assert_eq!(payload.extra["customTag"], json!([1, 2, 3]));

        let back = serde_json::to_value(&element).expect("serialize");
        assert_eq!(back["data"]["customTag"], json!([1, 2, 3]));
    }

    #[test]
    fn missing_z_index_defaults_to_zero() {
        let raw = json!({
            "id": "element-8",
            "type": "drawing",
            "data": {},
            "position": { "x": 1.0, "y": 2.0 },
            "size": { "width": 10.0, "height": 10.0 }
        });

        let element: Element = serde_json::from_value(raw).expect("deserialize");
        assert_eq!(element.z_index, 0);
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let raw = json!({
            "id": "element-9",
            "type": "hologram",
            "data": {},
            "position": { "x": 0.0, "y": 0.0 },
            "size": { "width": 10.0, "height": 10.0 }
        });

        assert!(serde_json::from_value::<Element>(raw).is_err());
    }
}
