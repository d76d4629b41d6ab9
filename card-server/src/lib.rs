//! # Recipe Card Server Library
//!
//! Shared state, router, and handlers for the recipe card service.
//! This library is used by both the binary and integration tests.

use axum::routing::get;
use axum::Router;

pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod store;
pub mod templates;

pub use config::ServerConfig;
pub use error::ApiError;
pub use store::{CardRecord, CardStore, StoreError, StoreLimits};
pub use templates::{TemplateRecord, TemplateStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Resolved server configuration.
    pub config: ServerConfig,
    /// Card records, optionally persisted to disk.
    pub cards: CardStore,
    /// Starter and chef-authored templates, in memory only.
    pub templates: TemplateStore,
}

impl AppState {
    /// Build state from configuration, loading any persisted cards and
    /// seeding the starter template catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the data directory cannot be created
    /// or read.
    pub fn from_config(config: ServerConfig) -> Result<Self, StoreError> {
        let limits = StoreLimits {
            max_document_bytes: config.max_document_bytes,
            max_documents_per_owner: config.max_documents_per_owner,
        };
        let cards = match config.data_dir.as_deref() {
            Some(dir) => CardStore::with_data_dir(limits, dir)?,
            None => CardStore::new(limits),
        };
        let templates = TemplateStore::new();
        templates.seed_if_empty();

        metrics::set_documents_total(cards.len());
        metrics::set_templates_total(templates.len());

        Ok(Self {
            config,
            cards,
            templates,
        })
    }

    /// In-memory state with default limits and seeded templates.
    #[must_use]
    pub fn in_memory() -> Self {
        let templates = TemplateStore::new();
        templates.seed_if_empty();
        Self {
            config: ServerConfig::default(),
            cards: CardStore::new(StoreLimits::default()),
            templates,
        }
    }
}

/// Build the application router.
///
/// Request-id, CORS, and trace layers are added by the binary; this router
/// carries only the routes and the per-route metrics middleware so tests
/// exercise the same surface the binary serves.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route(
            "/api/cards",
            get(routes::list_cards).post(routes::create_card),
        )
        .route(
            "/api/cards/{id}",
            get(routes::get_card)
                .put(routes::update_card)
                .delete(routes::delete_card),
        )
        .route("/api/cards/{id}/export", get(routes::export_card))
        .route(
            "/api/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/api/templates/{id}",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .layer(axum::middleware::from_fn(metrics::track_requests))
        .with_state(state)
}
