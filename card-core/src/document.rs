//! The card document - a fixed-size page of layered elements.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::element::{Element, ElementId};
use crate::error::ValidationError;

/// Format tag written into new documents.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Default canvas width in document units.
pub const DEFAULT_WIDTH: u32 = 800;
/// Default canvas height in document units.
pub const DEFAULT_HEIGHT: u32 = 1000;
/// Default background color.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";

/// Canvas page size, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Page width in document units.
    pub(crate) width: u32,
    /// Page height in document units.
    pub(crate) height: u32,
}

impl Dimensions {
    /// Page width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Page height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Canvas background fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// CSS color token painted across the whole page.
    pub color: String,
    /// Optional image reference painted over the color, scaled to cover.
    pub image: Option<String>,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            color: DEFAULT_BACKGROUND_COLOR.to_string(),
            image: None,
        }
    }
}

/// A recipe-card design: fixed dimensions, a background, layered elements.
///
/// Documents are value types. Mutation goes through [`crate::engine`], which
/// returns a new document instead of editing in place, so any held reference
/// stays valid and equality comparison detects no-op edits. Unknown
/// top-level fields ride along in `extra` and survive round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version tag.
    pub(crate) version: String,
    /// Page size.
    pub(crate) dimensions: Dimensions,
    /// Page background.
    #[serde(default)]
    pub(crate) background: Background,
    /// Elements in insertion order.
    pub(crate) elements: Vec<Element>,
    /// Top-level fields this engine does not understand, preserved verbatim.
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Document {
    /// Create a blank document with the given page size and background color.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositive`] if either dimension is zero.
    pub fn new(
        width: u32,
        height: u32,
        background_color: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if width == 0 {
            return Err(ValidationError::NonPositive("dimensions.width".to_string()));
        }
        if height == 0 {
            return Err(ValidationError::NonPositive(
                "dimensions.height".to_string(),
            ));
        }
        Ok(Self {
            version: DOCUMENT_VERSION.to_string(),
            dimensions: Dimensions { width, height },
            background: Background {
                color: background_color.into(),
                image: None,
            },
            elements: Vec::new(),
            extra: Map::new(),
        })
    }

    /// Set a background image, painted over the color with cover scaling.
    #[must_use]
    pub fn with_background_image(mut self, image: impl Into<String>) -> Self {
        self.background.image = Some(image.into());
        self
    }

    /// Format version tag.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Page size.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Page background.
    #[must_use]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Elements in insertion order. Paint order is derived on demand by
    /// [`crate::compose`], never stored.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Look up an element by id.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Default for Document {
    /// The blank card the editor opens with: 800x1000, white, no elements.
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            dimensions: Dimensions {
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
            },
            background: Background::default(),
            elements: Vec::new(),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_dimensions() {
        let err = Document::new(0, 1000, "#ffffff").expect_err("zero width");
        assert_eq!(
            err,
            ValidationError::NonPositive("dimensions.width".to_string())
        );

        let err = Document::new(800, 0, "#ffffff").expect_err("zero height");
        assert_eq!(
            err,
            ValidationError::NonPositive("dimensions.height".to_string())
        );
    }

    #[test]
    fn default_document_is_a_blank_white_card() {
        let doc = Document::default();
        assert_eq!(doc.version(), DOCUMENT_VERSION);
        assert_eq!(doc.dimensions().width(), 800);
        assert_eq!(doc.dimensions().height(), 1000);
        assert_eq!(doc.background().color, "#ffffff");
        assert!(doc.background().image.is_none());
        assert!(doc.is_empty());
    }

    #[test]
    fn background_image_is_opt_in() {
        let doc = Document::new(400, 600, "#fffaf0")
            .expect("valid dimensions")
            .with_background_image("https://example.com/paper.jpg");
        assert_eq!(
            doc.background().image.as_deref(),
            Some("https://example.com/paper.jpg")
        );
    }
}
