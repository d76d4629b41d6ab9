//! Built-in and chef-authored card templates.
//!
//! Templates are complete documents users clone as a starting point. The
//! catalog is seeded with two starter layouts when empty; reads are open to
//! every authenticated role, writes to chefs only.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use card_core::engine::add_element;
use card_core::{Document, ElementContent, ElementDraft, Position, Size};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::metrics;
use crate::routes::{parse_document, required_text};
use crate::store::current_timestamp_ms;
use crate::AppState;

/// A stored template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    /// Record id: `template-` plus a UUID, or a stable slug for built-ins.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the layout is for.
    #[serde(default)]
    pub description: String,
    /// The document to clone.
    pub document: Document,
    /// Creation time, unix millis.
    pub created_at: u64,
}

impl TemplateRecord {
    /// Create a template with a fresh id and current timestamp.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        document: Document,
    ) -> Self {
        Self {
            id: format!("template-{}", Uuid::new_v4()),
            name: name.into(),
            description: description.into(),
            document,
            created_at: current_timestamp_ms(),
        }
    }
}

/// Thread-safe template storage.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: Arc<RwLock<HashMap<String, TemplateRecord>>>,
}

impl TemplateStore {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the starter catalog if the store is empty.
    pub fn seed_if_empty(&self) {
        let mut templates = self
            .templates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if templates.is_empty() {
            for template in starter_templates() {
                templates.insert(template.id.clone(), template);
            }
        }
    }

    /// Insert or replace a template.
    pub fn insert(&self, template: TemplateRecord) {
        let mut templates = self
            .templates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        templates.insert(template.id.clone(), template);
    }

    /// Fetch a template by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<TemplateRecord> {
        let templates = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        templates.get(id).cloned()
    }

    /// All templates sorted by name. Ties break on id.
    #[must_use]
    pub fn list(&self) -> Vec<TemplateRecord> {
        let templates = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<TemplateRecord> = templates.values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        records
    }

    /// Remove a template, returning it if it existed.
    pub fn remove(&self, id: &str) -> Option<TemplateRecord> {
        let mut templates = self
            .templates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        templates.remove(id)
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        let templates = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        templates.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Readiness check: the backing lock is healthy.
    #[must_use]
    pub fn ping(&self) -> bool {
        self.templates.read().is_ok()
    }
}

// ---------------------------------------------------------------------------
// Starter catalog
// ---------------------------------------------------------------------------

/// The two starter layouts: a classic text card and a photo card.
#[must_use]
pub fn starter_templates() -> Vec<TemplateRecord> {
    vec![
        TemplateRecord {
            id: "template-classic".to_string(),
            name: "Classic Recipe".to_string(),
            description: "Title, ingredient list, and numbered steps.".to_string(),
            document: classic_layout(),
            created_at: current_timestamp_ms(),
        },
        TemplateRecord {
            id: "template-photo".to_string(),
            name: "Photo Card".to_string(),
            description: "A large photo with a caption underneath.".to_string(),
            document: photo_layout(),
            created_at: current_timestamp_ms(),
        },
    ]
}

fn classic_layout() -> Document {
    let doc = Document::default();
    let doc = with_element(
        doc,
        ElementDraft::new(
            ElementContent::text("Recipe Title", 32.0, "#2d3436"),
            Position { x: 60.0, y: 40.0 },
            Size {
                width: 680.0,
                height: 60.0,
            },
        )
        .with_z_index(1),
    );
    let doc = with_element(
        doc,
        ElementDraft::new(
            ElementContent::ingredient("2 cups flour", 16.0, "#2d3436"),
            Position { x: 60.0, y: 140.0 },
            Size {
                width: 320.0,
                height: 32.0,
            },
        )
        .with_z_index(2),
    );
    with_element(
        doc,
        ElementDraft::new(
            ElementContent::step("Preheat the oven to 220C.", 16.0, "#2d3436"),
            Position { x: 60.0, y: 220.0 },
            Size {
                width: 680.0,
                height: 48.0,
            },
        )
        .with_z_index(3),
    )
}

fn photo_layout() -> Document {
    let doc = Document::default();
    let doc = with_element(
        doc,
        ElementDraft::new(
            ElementContent::image(""),
            Position { x: 60.0, y: 40.0 },
            Size {
                width: 680.0,
                height: 420.0,
            },
        )
        .with_z_index(1),
    );
    with_element(
        doc,
        ElementDraft::new(
            ElementContent::text("Dish name", 24.0, "#2d3436"),
            Position { x: 60.0, y: 500.0 },
            Size {
                width: 680.0,
                height: 40.0,
            },
        )
        .with_z_index(2),
    )
}

/// Append an element to a starter layout. The drafts here are hard-coded
/// and valid; an invalid one is skipped rather than failing startup.
fn with_element(doc: Document, draft: ElementDraft) -> Document {
    match add_element(&doc, draft) {
        Ok((next, _)) => next,
        Err(e) => {
            tracing::warn!("Skipping starter element: {e}");
            doc
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Request body for creating a template.
#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    /// Display name, required non-empty.
    pub name: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional document; defaults to a blank card.
    #[serde(default)]
    pub document: Option<Value>,
}

/// Request body for updating a template. Absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateTemplateRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement document.
    pub document: Option<Value>,
}

/// List the template catalog.
pub async fn list_templates(State(state): State<AppState>, _identity: Identity) -> Json<Value> {
    let templates = state.templates.list();
    Json(json!({ "templates": templates }))
}

/// Fetch one template.
pub async fn get_template(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let template = state
        .templates
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(id))?;
    Ok(Json(json!({ "template": template })))
}

/// Create a template. Chef only.
#[tracing::instrument(name = "create_template", skip(state, identity, body), fields(user = %identity.user_id))]
pub async fn create_template(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_template_access(&identity)?;
    let name = required_text(body.name, "name")?;
    let document = parse_document(body.document)?;

    let template = TemplateRecord::new(name, body.description.unwrap_or_default(), document);
    state.templates.insert(template.clone());
    metrics::set_templates_total(state.templates.len());
    tracing::info!(template = %template.id, "template created");
    Ok((StatusCode::CREATED, Json(json!({ "template": template }))))
}

/// Update a template. Chef only.
pub async fn update_template(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdateTemplateRequest>,
) -> Result<Json<Value>, ApiError> {
    require_template_access(&identity)?;
    let mut template = state
        .templates
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(id))?;

    if let Some(name) = body.name {
        template.name = required_text(Some(name), "name")?;
    }
    if let Some(description) = body.description {
        template.description = description;
    }
    if let Some(document) = body.document {
        template.document = parse_document(Some(document))?;
    }
    state.templates.insert(template.clone());
    Ok(Json(json!({ "template": template })))
}

/// Delete a template. Chef only.
pub async fn delete_template(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_template_access(&identity)?;
    state
        .templates
        .remove(&id)
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;
    metrics::set_templates_total(state.templates.len());
    tracing::info!(template = %id, "template deleted");
    Ok(Json(json!({ "message": "Template deleted" })))
}

fn require_template_access(identity: &Identity) -> Result<(), ApiError> {
    if identity.role.can_manage_templates() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only chefs manage templates".to_string(),
        ))
    }
}
