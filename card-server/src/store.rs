//! Card persistence.
//!
//! Thread-safe in-memory records with optional JSON file-per-record
//! persistence, shared across handlers. The per-owner quota and the
//! document size guard are enforced here, at the boundary where records
//! become durable, so no handler can bypass them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use card_core::{enforce_size_limit, CardError, Document};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{DEFAULT_MAX_DOCUMENTS_PER_OWNER, DEFAULT_MAX_DOCUMENT_BYTES};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record with the given id.
    #[error("Record not found: {0}")]
    NotFound(String),
    /// The owner is at their card limit.
    #[error("Card limit reached: {current} of {limit}")]
    QuotaExceeded {
        /// Configured per-owner limit.
        limit: usize,
        /// Cards the owner currently holds.
        current: usize,
    },
    /// The document failed validation or the size guard.
    #[error(transparent)]
    Document(#[from] CardError),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Limits enforced at the persistence boundary.
#[derive(Debug, Clone, Copy)]
pub struct StoreLimits {
    /// Maximum serialized document size in bytes.
    pub max_document_bytes: usize,
    /// Maximum cards per owner.
    pub max_documents_per_owner: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_documents_per_owner: DEFAULT_MAX_DOCUMENTS_PER_OWNER,
        }
    }
}

/// A stored recipe card: the canvas document plus ownership and visibility,
/// which the document model knows nothing about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    /// Record id (`card-` plus a UUID).
    pub id: String,
    /// Id of the user who created the card.
    pub owner_id: String,
    /// Display title, also used for export filenames.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Whether any caller may view the card.
    #[serde(default)]
    pub is_public: bool,
    /// The canvas document itself.
    pub document: Document,
    /// Creation time, unix millis.
    pub created_at: u64,
    /// Last update time, unix millis.
    pub updated_at: u64,
}

impl CardRecord {
    /// Create a private record with a fresh id and current timestamps.
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        document: Document,
    ) -> Self {
        let now = current_timestamp_ms();
        Self {
            id: format!("card-{}", Uuid::new_v4()),
            owner_id: owner_id.into(),
            title: title.into(),
            description: String::new(),
            is_public: false,
            document,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the visibility.
    #[must_use]
    pub fn with_visibility(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }
}

/// Partial update applied by [`CardStore::update`]. `None` keeps the
/// current value.
#[derive(Debug, Default)]
pub struct CardUpdate {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New visibility.
    pub is_public: Option<bool>,
    /// Replacement document.
    pub document: Option<Document>,
}

/// Thread-safe card storage shared across handlers.
#[derive(Debug, Clone, Default)]
pub struct CardStore {
    cards: Arc<RwLock<HashMap<String, CardRecord>>>,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
    limits: StoreLimits,
}

impl CardStore {
    /// Create an in-memory store (no persistence).
    #[must_use]
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            cards: Arc::new(RwLock::new(HashMap::new())),
            data_dir: None,
            limits,
        }
    }

    /// Create a store with file-per-record persistence.
    ///
    /// The directory is created if it doesn't exist and any `*.json`
    /// records already in it are loaded. Unreadable files are skipped with
    /// a warning so one corrupt record cannot keep the server down.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or
    /// read.
    pub fn with_data_dir(
        limits: StoreLimits,
        data_dir: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;

        let mut cards = HashMap::new();
        for entry in std::fs::read_dir(&data_dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match load_record(&path) {
                Ok(record) => {
                    cards.insert(record.id.clone(), record);
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable record {}: {e}", path.display());
                }
            }
        }
        tracing::info!(count = cards.len(), "loaded persisted cards");

        Ok(Self {
            cards: Arc::new(RwLock::new(cards)),
            data_dir: Some(data_dir),
            limits,
        })
    }

    /// The limits this store enforces.
    #[must_use]
    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::QuotaExceeded`] when the owner is at their
    /// card limit, or [`StoreError::Document`] when the serialized document
    /// exceeds the size limit.
    pub fn create(&self, record: CardRecord) -> Result<CardRecord, StoreError> {
        {
            let mut cards = self.cards.write().unwrap_or_else(PoisonError::into_inner);
            let current = cards
                .values()
                .filter(|c| c.owner_id == record.owner_id)
                .count();
            if current >= self.limits.max_documents_per_owner {
                return Err(StoreError::QuotaExceeded {
                    limit: self.limits.max_documents_per_owner,
                    current,
                });
            }
            self.check_document_size(&record.document)?;
            cards.insert(record.id.clone(), record.clone());
        }
        self.persist_record(&record);
        Ok(record)
    }

    /// Fetch a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<CardRecord> {
        let cards = self.cards.read().unwrap_or_else(PoisonError::into_inner);
        cards.get(id).cloned()
    }

    /// All records, newest first. Ties break on id so the order is stable.
    #[must_use]
    pub fn list(&self) -> Vec<CardRecord> {
        let cards = self.cards.read().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<CardRecord> = cards.values().cloned().collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        records
    }

    /// Apply a partial update, re-running the size guard when the document
    /// changes. `updated_at` is bumped only when the update applies.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids, or
    /// [`StoreError::Document`] when the replacement document exceeds the
    /// size limit.
    pub fn update(&self, id: &str, update: CardUpdate) -> Result<CardRecord, StoreError> {
        if let Some(ref document) = update.document {
            self.check_document_size(document)?;
        }
        let record = {
            let mut cards = self.cards.write().unwrap_or_else(PoisonError::into_inner);
            let record = cards
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            if let Some(title) = update.title {
                record.title = title;
            }
            if let Some(description) = update.description {
                record.description = description;
            }
            if let Some(is_public) = update.is_public {
                record.is_public = is_public;
            }
            if let Some(document) = update.document {
                record.document = document;
            }
            record.updated_at = current_timestamp_ms();
            record.clone()
        };
        self.persist_record(&record);
        Ok(record)
    }

    /// Remove a record and its persisted file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids.
    pub fn delete(&self, id: &str) -> Result<CardRecord, StoreError> {
        let record = {
            let mut cards = self.cards.write().unwrap_or_else(PoisonError::into_inner);
            cards
                .remove(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?
        };
        self.delete_record_file(&record.id);
        Ok(record)
    }

    /// Number of cards held by `owner_id`.
    #[must_use]
    pub fn count_for_owner(&self, owner_id: &str) -> usize {
        let cards = self.cards.read().unwrap_or_else(PoisonError::into_inner);
        cards.values().filter(|c| c.owner_id == owner_id).count()
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        let cards = self.cards.read().unwrap_or_else(PoisonError::into_inner);
        cards.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Readiness check: the backing lock is healthy.
    #[must_use]
    pub fn ping(&self) -> bool {
        self.cards.read().is_ok()
    }

    fn check_document_size(&self, document: &Document) -> Result<(), StoreError> {
        let json = document.to_json()?;
        enforce_size_limit(&json, self.limits.max_document_bytes)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Save a record to disk as JSON.
    ///
    /// No-op without a data directory; failures are logged, never
    /// propagated, so a full disk degrades durability rather than the API.
    fn persist_record(&self, record: &CardRecord) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let json = match serde_json::to_string_pretty(record) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize card {}: {e}", record.id);
                return;
            }
        };
        let path = data_dir.join(format!("{}.json", sanitize_filename(&record.id)));
        if let Err(e) = std::fs::write(&path, json) {
            tracing::warn!("Failed to persist card {} to {}: {e}", record.id, path.display());
        }
    }

    /// Remove a record's file from disk. No-op without a data directory.
    fn delete_record_file(&self, id: &str) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let path = data_dir.join(format!("{}.json", sanitize_filename(id)));
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to delete card file {}: {e}", path.display());
            }
        }
    }
}

fn load_record(path: &Path) -> Result<CardRecord, StoreError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Sanitize a string for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Get the current Unix timestamp in milliseconds.
pub(crate) fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}
