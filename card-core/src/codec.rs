//! Document serialization and the size guard.
//!
//! Deserialization runs in two phases. A structural precheck walks the raw
//! JSON and names the exact missing or mistyped field (`elements[3].size.width`),
//! filling documented defaults for optional fields along the way. Typed
//! parsing then builds the [`Document`], and an invariant pass rejects
//! non-positive sizes and duplicate ids. Unknown top-level and `data`
//! fields ride through every phase untouched.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::document::{Document, DEFAULT_BACKGROUND_COLOR, DOCUMENT_VERSION};
use crate::element::ELEMENT_TYPES;
use crate::error::{CardError, CardResult, ValidationError};

impl Document {
    /// Serialize to the persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::Malformed`] if encoding fails; documents built
    /// through the engine always encode.
    pub fn to_json(&self) -> CardResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate the persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::Malformed`] for text that is not JSON, and
    /// [`CardError::Validation`] naming the offending field for JSON that
    /// is structurally incomplete or violates a document invariant.
    pub fn from_json(text: &str) -> CardResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Validate and convert an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Same contract as [`Document::from_json`].
    pub fn from_value(mut value: Value) -> CardResult<Self> {
        precheck(&mut value)?;
        let doc: Self = serde_json::from_value(value)?;
        validate(&doc)?;
        Ok(doc)
    }
}

/// Reject serialized documents above `limit_bytes`.
///
/// The measurement is the exact UTF-8 byte length of `payload`, the
/// artifact that actually crosses the persistence boundary, never an
/// estimate derived from the in-memory structure. A payload of exactly
/// `limit_bytes` passes.
///
/// # Errors
///
/// Returns [`CardError::PayloadTooLarge`] carrying both the measured size
/// and the limit so callers can surface both numbers.
pub fn enforce_size_limit(payload: &str, limit_bytes: usize) -> CardResult<()> {
    let measured_bytes = payload.len();
    if measured_bytes > limit_bytes {
        return Err(CardError::PayloadTooLarge {
            measured_bytes,
            limit_bytes,
        });
    }
    Ok(())
}

/// Structural walk over raw JSON. Reports the first problem by field path
/// and fills defaults for optional fields: `version`, `background`,
/// per-element `zIndex` and `data`.
fn precheck(value: &mut Value) -> Result<(), ValidationError> {
    let root = value.as_object_mut().ok_or_else(|| ValidationError::WrongType {
        field: "document".to_string(),
        expected: "a JSON object",
    })?;

    match root.get_mut("dimensions") {
        None => return Err(ValidationError::MissingField("dimensions".to_string())),
        Some(dimensions) => precheck_dimensions(dimensions)?,
    }

    if !root.contains_key("version") {
        root.insert("version".to_string(), json!(DOCUMENT_VERSION));
    }
    if !root.contains_key("background") {
        root.insert(
            "background".to_string(),
            json!({ "color": DEFAULT_BACKGROUND_COLOR, "image": null }),
        );
    }

    let elements = match root.get_mut("elements") {
        None => return Err(ValidationError::MissingField("elements".to_string())),
        Some(value) => value.as_array_mut().ok_or_else(|| ValidationError::WrongType {
            field: "elements".to_string(),
            expected: "an array",
        })?,
    };

    for (index, element) in elements.iter_mut().enumerate() {
        precheck_element(index, element)?;
    }
    Ok(())
}

fn precheck_dimensions(dimensions: &mut Value) -> Result<(), ValidationError> {
    let object = dimensions
        .as_object_mut()
        .ok_or_else(|| ValidationError::WrongType {
            field: "dimensions".to_string(),
            expected: "an object",
        })?;

    for key in ["width", "height"] {
        let field = format!("dimensions.{key}");
        let Some(value) = object.get(key) else {
            return Err(ValidationError::MissingField(field));
        };
        let Some(number) = value.as_f64() else {
            return Err(ValidationError::WrongType {
                field,
                expected: "a number",
            });
        };
        if number <= 0.0 {
            return Err(ValidationError::NonPositive(field));
        }
        if number.fract() != 0.0 || number > f64::from(u32::MAX) {
            return Err(ValidationError::WrongType {
                field,
                expected: "a whole number of document units",
            });
        }
        // normalize 800.0 to 800 so the typed field parses as an integer
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        object.insert(key.to_string(), json!(number as u64));
    }
    Ok(())
}

fn precheck_element(index: usize, element: &mut Value) -> Result<(), ValidationError> {
    let object = element
        .as_object_mut()
        .ok_or_else(|| ValidationError::WrongType {
            field: format!("elements[{index}]"),
            expected: "an object",
        })?;

    match object.get("id") {
        None => {
            return Err(ValidationError::MissingField(format!(
                "elements[{index}].id"
            )))
        }
        Some(Value::String(id)) if !id.is_empty() => {}
        Some(Value::String(_)) => {
            return Err(ValidationError::Empty(format!("elements[{index}].id")))
        }
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: format!("elements[{index}].id"),
                expected: "a string",
            })
        }
    }

    match object.get("type") {
        None => {
            return Err(ValidationError::MissingField(format!(
                "elements[{index}].type"
            )))
        }
        Some(Value::String(tag)) if ELEMENT_TYPES.contains(&tag.as_str()) => {}
        Some(Value::String(tag)) => return Err(ValidationError::UnsupportedType(tag.clone())),
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: format!("elements[{index}].type"),
                expected: "a string",
            })
        }
    }

    for (key, subfields) in [("position", ["x", "y"]), ("size", ["width", "height"])] {
        let Some(value) = object.get(key) else {
            return Err(ValidationError::MissingField(format!(
                "elements[{index}].{key}"
            )));
        };
        let Some(inner) = value.as_object() else {
            return Err(ValidationError::WrongType {
                field: format!("elements[{index}].{key}"),
                expected: "an object",
            });
        };
        for sub in subfields {
            let field = format!("elements[{index}].{key}.{sub}");
            let Some(number) = inner.get(sub) else {
                return Err(ValidationError::MissingField(field));
            };
            if !number.is_number() {
                return Err(ValidationError::WrongType {
                    field,
                    expected: "a number",
                });
            }
        }
    }

    if let Some(z_index) = object.get("zIndex") {
        if !z_index.is_i64() {
            return Err(ValidationError::WrongType {
                field: format!("elements[{index}].zIndex"),
                expected: "an integer",
            });
        }
    } else {
        object.insert("zIndex".to_string(), json!(0));
    }
    // the adjacent "type"/"data" encoding requires data to be present
    object
        .entry("data")
        .or_insert_with(|| Value::Object(Map::new()));
    Ok(())
}

/// Invariant pass over the typed document: unique ids, strictly positive
/// finite sizes, finite positions.
fn validate(doc: &Document) -> Result<(), ValidationError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(doc.elements.len());
    for (index, element) in doc.elements.iter().enumerate() {
        if !seen.insert(element.id.as_str()) {
            return Err(ValidationError::DuplicateId(element.id.to_string()));
        }

        let sizes = [
            (format!("elements[{index}].size.width"), element.size.width),
            (
                format!("elements[{index}].size.height"),
                element.size.height,
            ),
        ];
        for (field, value) in sizes {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite(field));
            }
            if value <= 0.0 {
                return Err(ValidationError::NonPositive(field));
            }
        }

        let positions = [
            (format!("elements[{index}].position.x"), element.position.x),
            (format!("elements[{index}].position.y"), element.position.y),
        ];
        for (field, value) in positions {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite(field));
            }
        }
    }
    Ok(())
}
