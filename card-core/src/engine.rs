//! Element mutation engine.
//!
//! Every operation takes the current document by reference and returns a new
//! value; the caller swaps its "current" reference on success. Prior values
//! stay untouched, which is what makes the undo stack in [`crate::session`]
//! a plain `Vec<Document>`.
//!
//! Only [`add_element`] can fail. Move, update and delete are total: a
//! missing id is a benign race (the element was deleted between selection
//! and the edit landing) and yields the input document unchanged rather
//! than an error.

use serde_json::{Map, Value};

use crate::document::Document;
use crate::element::{
    creation_z_index, Element, ElementContent, ElementDraft, ElementId, ElementPatch, Position,
};
use crate::error::ValidationError;

/// Validate a draft, assign a fresh id, and append the element.
///
/// The new element lands at the end of the element sequence with a
/// creation-time z-index unless the draft pins one explicitly, so it paints
/// above everything already on the card.
///
/// # Errors
///
/// Returns [`ValidationError`] naming the offending field when the draft's
/// size is not strictly positive or any coordinate is not finite. The
/// document is never modified on failure.
pub fn add_element(
    doc: &Document,
    draft: ElementDraft,
) -> Result<(Document, ElementId), ValidationError> {
    validate_draft(&draft)?;

    let id = ElementId::generate();
    let element = Element {
        id: id.clone(),
        content: draft.content,
        position: draft.position,
        size: draft.size,
        z_index: draft.z_index.unwrap_or_else(creation_z_index),
    };
    tracing::debug!(element = %id, kind = element.content.type_name(), "adding element");

    let mut next = doc.clone();
    next.elements.push(element);
    Ok((next, id))
}

fn validate_draft(draft: &ElementDraft) -> Result<(), ValidationError> {
    let numbers = [
        ("size.width", draft.size.width),
        ("size.height", draft.size.height),
        ("position.x", draft.position.x),
        ("position.y", draft.position.y),
    ];
    for (field, value) in numbers {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite(field.to_string()));
        }
    }
    for (field, value) in [("size.width", draft.size.width), ("size.height", draft.size.height)] {
        if value <= 0.0 {
            return Err(ValidationError::NonPositive(field.to_string()));
        }
    }
    Ok(())
}

/// Move an element, clamping each coordinate to be non-negative.
///
/// There is no upper clamp: dragging past the right or bottom edge is
/// allowed and the element is clipped at paint time. Non-finite coordinates
/// collapse to zero rather than poisoning the document. Unknown ids leave
/// the document unchanged.
#[must_use]
pub fn move_element(doc: &Document, id: &ElementId, position: Position) -> Document {
    let Some(index) = find(doc, id) else {
        tracing::debug!(element = %id, "move ignored, element not found");
        return doc.clone();
    };

    let mut next = doc.clone();
    next.elements[index].position = Position {
        x: clamp_drag(position.x),
        y: clamp_drag(position.y),
    };
    next
}

fn clamp_drag(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Merge a patch into the element with `id`.
///
/// Top-level fields replace wholesale; `data` keys merge one by one into
/// the payload, so patching `text` keeps a sibling `fontSize`. A `null`
/// value removes its key. Fields that would leave the document invalid are
/// skipped rather than failing the whole patch: non-positive or non-finite
/// sizes are ignored, as is a data merge whose result no longer parses for
/// the element's type. Patched positions apply verbatim; only drags clamp.
/// Unknown ids leave the document unchanged.
#[must_use]
pub fn update_element(doc: &Document, id: &ElementId, patch: &ElementPatch) -> Document {
    let Some(index) = find(doc, id) else {
        tracing::debug!(element = %id, "update ignored, element not found");
        return doc.clone();
    };

    let mut next = doc.clone();
    let element = &mut next.elements[index];

    if let Some(position) = patch.position {
        if position.x.is_finite() && position.y.is_finite() {
            element.position = position;
        }
    }
    if let Some(size) = patch.size {
        let valid = size.width.is_finite()
            && size.height.is_finite()
            && size.width > 0.0
            && size.height > 0.0;
        if valid {
            element.size = size;
        } else {
            tracing::debug!(element = %id, "size patch ignored, not strictly positive");
        }
    }
    if let Some(z_index) = patch.z_index {
        element.z_index = z_index;
    }
    if !patch.data.is_empty() {
        match merge_payload(&element.content, &patch.data) {
            Some(content) => element.content = content,
            None => {
                tracing::debug!(element = %id, "data patch ignored, merged payload does not parse");
            }
        }
    }
    next
}

/// Merge patch keys into the JSON image of the payload, then parse the
/// result back for the same type tag. `None` means the merged payload no
/// longer parses and the original content must stand.
fn merge_payload(content: &ElementContent, patch: &Map<String, Value>) -> Option<ElementContent> {
    let mut tagged = serde_json::to_value(content).ok()?;
    let data = tagged
        .as_object_mut()?
        .entry("data")
        .or_insert_with(|| Value::Object(Map::new()));
    let data = data.as_object_mut()?;

    for (key, value) in patch {
        if value.is_null() {
            data.remove(key);
        } else {
            data.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(tagged).ok()
}

/// Remove the element with `id`. Unknown ids leave the document unchanged.
#[must_use]
pub fn delete_element(doc: &Document, id: &ElementId) -> Document {
    let Some(index) = find(doc, id) else {
        tracing::debug!(element = %id, "delete ignored, element not found");
        return doc.clone();
    };

    let mut next = doc.clone();
    next.elements.remove(index);
    next
}

fn find(doc: &Document, id: &ElementId) -> Option<usize> {
    doc.elements.iter().position(|e| &e.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Size;
    use serde_json::json;

    fn draft(content: ElementContent) -> ElementDraft {
        ElementDraft::new(
            content,
            Position { x: 50.0, y: 50.0 },
            Size {
                width: 200.0,
                height: 40.0,
            },
        )
    }

    #[test]
    fn add_assigns_a_fresh_id_and_appends() {
        let doc = Document::default();
        let (doc, id) = add_element(&doc, draft(ElementContent::text("One", 16.0, "#000")))
            .expect("valid draft");
        let (doc, id2) = add_element(&doc, draft(ElementContent::text("Two", 16.0, "#000")))
            .expect("valid draft");

        assert_ne!(id, id2);
        assert_eq!(doc.element_count(), 2);
        assert_eq!(doc.elements()[0].id, id);
        assert_eq!(doc.elements()[1].id, id2);
    }

    #[test]
    fn add_rejects_non_positive_sizes_without_touching_the_document() {
        let doc = Document::default();
        let mut bad = draft(ElementContent::text("Bad", 16.0, "#000"));
        bad.size.width = 0.0;

        let err = add_element(&doc, bad).expect_err("zero width");
        assert_eq!(err, ValidationError::NonPositive("size.width".to_string()));
        assert!(doc.is_empty());
    }

    #[test]
    fn add_rejects_non_finite_coordinates() {
        let doc = Document::default();
        let mut bad = draft(ElementContent::text("Bad", 16.0, "#000"));
        bad.position.x = f64::NAN;

        let err = add_element(&doc, bad).expect_err("nan position");
        assert_eq!(err, ValidationError::NotFinite("position.x".to_string()));
    }

    #[test]
    fn move_clamps_negative_coordinates_to_zero() {
        let doc = Document::default();
        let (doc, id) =
            add_element(&doc, draft(ElementContent::text("T", 16.0, "#000"))).expect("add");

        let moved = move_element(&doc, &id, Position { x: -10.0, y: -5.0 });
        let element = moved.element(&id).expect("element exists");
        assert!((element.position.x - 0.0).abs() < f64::EPSILON);
        assert!((element.position.y - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn move_has_no_upper_clamp() {
        let doc = Document::default();
        let (doc, id) =
            add_element(&doc, draft(ElementContent::text("T", 16.0, "#000"))).expect("add");

        let moved = move_element(
            &doc,
            &id,
            Position {
                x: 10_000.0,
                y: 10_000.0,
            },
        );
        let element = moved.element(&id).expect("element exists");
        assert!((element.position.x - 10_000.0).abs() < f64::EPSILON);
        assert!((element.position.y - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn move_with_unknown_id_returns_the_document_unchanged() {
        let doc = Document::default();
        let (doc, _) =
            add_element(&doc, draft(ElementContent::text("T", 16.0, "#000"))).expect("add");

        let ghost = ElementId::from_string("element-ghost");
        let moved = move_element(&doc, &ghost, Position { x: 1.0, y: 1.0 });
        assert_eq!(moved, doc);
    }

    #[test]
    fn update_merges_data_keys_instead_of_replacing() {
        let doc = Document::default();
        let (doc, id) =
            add_element(&doc, draft(ElementContent::text("Hello", 12.0, "#333"))).expect("add");

        let mut data = Map::new();
        data.insert("text".to_string(), json!("Goodbye"));
        let updated = update_element(&doc, &id, &ElementPatch::data(data));

        let element = updated.element(&id).expect("element exists");
        let ElementContent::Text(payload) = &element.content else {
            panic!("expected text content");
        };
        assert_eq!(payload.text.as_deref(), Some("Goodbye"));
        assert_eq!(payload.font_size, Some(12.0));
        assert_eq!(payload.color.as_deref(), Some("#333"));
    }

    #[test]
    fn update_null_removes_a_data_key() {
        let doc = Document::default();
        let (doc, id) =
            add_element(&doc, draft(ElementContent::text("Hello", 12.0, "#333"))).expect("add");

        let mut data = Map::new();
        data.insert("color".to_string(), Value::Null);
        let updated = update_element(&doc, &id, &ElementPatch::data(data));

        let element = updated.element(&id).expect("element exists");
        let ElementContent::Text(payload) = &element.content else {
            panic!("expected text content");
        };
        assert_eq!(payload.color, None);
    }

    #[test]
    fn update_skips_a_size_that_would_invalidate_the_document() {
        let doc = Document::default();
        let (doc, id) =
            add_element(&doc, draft(ElementContent::text("T", 16.0, "#000"))).expect("add");

        let updated = update_element(
            &doc,
            &id,
            &ElementPatch::size(Size {
                width: -5.0,
                height: 40.0,
            }),
        );
        let element = updated.element(&id).expect("element exists");
        assert!((element.size.width - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn update_skips_a_data_merge_that_breaks_the_payload_type() {
        let doc = Document::default();
        let (doc, id) =
            add_element(&doc, draft(ElementContent::text("T", 16.0, "#000"))).expect("add");

        let mut data = Map::new();
        data.insert("fontSize".to_string(), json!("enormous"));
        let updated = update_element(&doc, &id, &ElementPatch::data(data));

        let element = updated.element(&id).expect("element exists");
        let ElementContent::Text(payload) = &element.content else {
            panic!("expected text content");
        };
        assert_eq!(payload.font_size, Some(16.0));
    }

    #[test]
    fn update_applies_patched_positions_verbatim() {
        let doc = Document::default();
        let (doc, id) =
            add_element(&doc, draft(ElementContent::text("T", 16.0, "#000"))).expect("add");

        let updated = update_element(
            &doc,
            &id,
            &ElementPatch::position(Position { x: -30.0, y: 5.0 }),
        );
        let element = updated.element(&id).expect("element exists");
        assert!((element.position.x + 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn delete_removes_only_the_named_element() {
        let doc = Document::default();
        let (doc, first) =
            add_element(&doc, draft(ElementContent::text("One", 16.0, "#000"))).expect("add");
        let (doc, second) =
            add_element(&doc, draft(ElementContent::text("Two", 16.0, "#000"))).expect("add");

        let doc = delete_element(&doc, &first);
        assert_eq!(doc.element_count(), 1);
        assert!(doc.element(&first).is_none());
        assert!(doc.element(&second).is_some());

        // deleting again is a no-op, not an error
        let doc = delete_element(&doc, &first);
        assert_eq!(doc.element_count(), 1);
    }

    #[test]
    fn operations_never_mutate_their_input() {
        let doc = Document::default();
        let (doc, id) =
            add_element(&doc, draft(ElementContent::text("T", 16.0, "#000"))).expect("add");
        let snapshot = doc.clone();

        let _ = move_element(&doc, &id, Position { x: 99.0, y: 99.0 });
        let _ = update_element(&doc, &id, &ElementPatch::z_index(42));
        let _ = delete_element(&doc, &id);

        assert_eq!(doc, snapshot);
    }
}
