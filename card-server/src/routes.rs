//! Card CRUD and export handlers.
//!
//! Visibility rules: absent ids are 404; records the caller may not see
//! are 403. Quota and size limits surface from the store with their
//! numbers attached.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use card_core::Document;
use card_renderer::{CardExporter, ExportConfig, ExportFormat};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::metrics;
use crate::store::{sanitize_filename, CardRecord, CardUpdate};
use crate::AppState;

/// Largest accepted export scale factor.
pub const MAX_EXPORT_SCALE: f32 = 8.0;

/// Request body for creating a card.
#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    /// Display title, required non-empty.
    pub title: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the card is publicly visible. Defaults to private.
    #[serde(default)]
    pub is_public: bool,
    /// Initial document; defaults to a blank card.
    #[serde(default)]
    pub document: Option<Value>,
}

/// Request body for updating a card. Absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateCardRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New visibility.
    pub is_public: Option<bool>,
    /// Replacement document.
    pub document: Option<Value>,
}

/// Export query parameters.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Output format: `png` (default), `jpeg`, or `svg`.
    #[serde(default = "default_format")]
    pub format: String,
    /// Scale factor; defaults to the renderer's 2.0.
    pub scale: Option<f32>,
}

fn default_format() -> String {
    "png".to_string()
}

/// List cards visible to the caller, newest first.
#[tracing::instrument(name = "list_cards", skip(state, identity), fields(user = %identity.user_id))]
pub async fn list_cards(State(state): State<AppState>, identity: Identity) -> Json<Value> {
    let cards: Vec<CardRecord> = state
        .cards
        .list()
        .into_iter()
        .filter(|card| identity.can_view(card))
        .collect();
    Json(json!({ "cards": cards }))
}

/// Create a card owned by the caller.
#[tracing::instrument(name = "create_card", skip(state, identity, body), fields(user = %identity.user_id))]
pub async fn create_card(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !identity.role.can_create() {
        return Err(ApiError::Forbidden(
            "Guests cannot create cards".to_string(),
        ));
    }
    let title = required_text(body.title, "title")?;
    let document = parse_document(body.document)?;

    let record = CardRecord::new(identity.user_id.clone(), title, document)
        .with_description(body.description.unwrap_or_default())
        .with_visibility(body.is_public);
    let record = state.cards.create(record)?;
    metrics::set_documents_total(state.cards.len());
    tracing::info!(card = %record.id, "card created");
    Ok((StatusCode::CREATED, Json(json!({ "card": record }))))
}

/// Fetch one card, visibility-checked.
pub async fn get_card(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let card = fetch_visible(&state, &identity, &id)?;
    Ok(Json(json!({ "card": card })))
}

/// Partially update a card. Owner or chef only.
pub async fn update_card(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdateCardRequest>,
) -> Result<Json<Value>, ApiError> {
    let card = state
        .cards
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;
    if !identity.can_modify(&card) {
        return Err(ApiError::Forbidden(
            "Only the owner may edit this card".to_string(),
        ));
    }

    let title = match body.title {
        Some(title) => Some(required_text(Some(title), "title")?),
        None => None,
    };
    let document = match body.document {
        Some(value) => Some(parse_document(Some(value))?),
        None => None,
    };

    let record = state.cards.update(
        &id,
        CardUpdate {
            title,
            description: body.description,
            is_public: body.is_public,
            document,
        },
    )?;
    Ok(Json(json!({ "card": record })))
}

/// Delete a card. Owner or chef only.
pub async fn delete_card(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let card = state
        .cards
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;
    if !identity.can_modify(&card) {
        return Err(ApiError::Forbidden(
            "Only the owner may delete this card".to_string(),
        ));
    }
    state.cards.delete(&id)?;
    metrics::set_documents_total(state.cards.len());
    tracing::info!(card = %id, "card deleted");
    Ok(Json(json!({ "message": "Card deleted" })))
}

/// Export a card as PNG, JPEG, or SVG.
///
/// Rasterization is CPU-bound, so it runs on the blocking pool.
#[tracing::instrument(name = "export_card", skip(state, identity), fields(user = %identity.user_id))]
pub async fn export_card(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let card = fetch_visible(&state, &identity, &id)?;

    let Some(format) = ExportFormat::from_name(&query.format) else {
        metrics::record_validation_failure("export_format");
        return Err(ApiError::Validation(format!(
            "Unsupported export format: {}",
            query.format
        )));
    };
    let config = export_config(query.scale)?;

    let document = card.document.clone();
    let result =
        tokio::task::spawn_blocking(move || CardExporter::new(config).export(&document, format))
            .await
            .map_err(|e| ApiError::Internal(format!("Export task failed: {e}")))?;

    let bytes = match result {
        Ok(bytes) => bytes,
        Err(e) => {
            metrics::record_export(format.name(), false);
            return Err(ApiError::Internal(format!("Export failed: {e}")));
        }
    };
    metrics::record_export(format.name(), true);

    let filename = export_filename(&card.title, format);
    let headers = [
        (header::CONTENT_TYPE, format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// Look up a card and apply the visibility rules.
fn fetch_visible(state: &AppState, identity: &Identity, id: &str) -> Result<CardRecord, ApiError> {
    let card = state
        .cards
        .get(id)
        .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
    if identity.can_view(&card) {
        Ok(card)
    } else {
        Err(ApiError::Forbidden("This card is private".to_string()))
    }
}

/// Validate the requested scale and build the export configuration.
fn export_config(scale: Option<f32>) -> Result<ExportConfig, ApiError> {
    let mut config = ExportConfig::default();
    if let Some(scale) = scale {
        if !scale.is_finite() || scale <= 0.0 || scale > MAX_EXPORT_SCALE {
            metrics::record_validation_failure("export_scale");
            return Err(ApiError::Validation(format!(
                "Scale must be greater than 0 and at most {MAX_EXPORT_SCALE}"
            )));
        }
        config.scale = scale;
    }
    Ok(config)
}

/// Attachment filename derived from the sanitized title.
fn export_filename(title: &str, format: ExportFormat) -> String {
    let stem = sanitize_filename(title);
    let stem = if stem.is_empty() {
        "card".to_string()
    } else {
        stem
    };
    format!("{stem}.{}", format.file_extension())
}

/// Require a non-empty text field, rejecting absent or blank values.
pub(crate) fn required_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            metrics::record_validation_failure(field);
            ApiError::Validation(format!("Missing required field: {field}"))
        })
}

/// Parse an optional document body, defaulting to a blank card.
pub(crate) fn parse_document(value: Option<Value>) -> Result<Document, ApiError> {
    match value {
        Some(value) => Document::from_value(value).map_err(|e| {
            metrics::record_validation_failure("document");
            ApiError::from(e)
        }),
        None => Ok(Document::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_filenames_are_sanitized_titles() {
        assert_eq!(
            export_filename("Apple Pie", ExportFormat::Png),
            "Apple_Pie.png"
        );
        assert_eq!(
            export_filename("Tarte tatin!", ExportFormat::Jpeg),
            "Tarte_tatin_.jpg"
        );
        assert_eq!(export_filename("", ExportFormat::Svg), "card.svg");
    }

    #[test]
    fn export_config_accepts_only_sane_scales() {
        assert!(export_config(None).is_ok());
        assert!(export_config(Some(1.0)).is_ok());
        assert!(export_config(Some(8.0)).is_ok());
        assert!(export_config(Some(0.0)).is_err());
        assert!(export_config(Some(-1.0)).is_err());
        assert!(export_config(Some(8.1)).is_err());
        assert!(export_config(Some(f32::NAN)).is_err());
    }

    #[test]
    fn required_text_trims_and_rejects_blanks() {
        assert_eq!(
            required_text(Some(" Pancakes ".to_string()), "title").expect("valid"),
            "Pancakes"
        );
        assert!(required_text(Some("   ".to_string()), "title").is_err());
        assert!(required_text(None, "title").is_err());
    }

    #[test]
    fn missing_documents_default_to_a_blank_card() {
        let document = parse_document(None).expect("default");
        assert_eq!(document, Document::default());
    }

    #[test]
    fn malformed_documents_name_the_offending_field() {
        let err = parse_document(Some(json!({ "elements": [] }))).expect_err("no dimensions");
        assert!(err.to_string().contains("dimensions"));
    }
}
