//! Identity extraction and role-based capability checks.
//!
//! Authentication itself happens upstream; the server trusts the
//! `x-user-id` and `x-user-role` headers set by the gateway. Requests
//! missing either header are rejected with 401 before any handler runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::store::CardRecord;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the caller's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";
/// Maximum accepted length for a user id.
pub const MAX_USER_ID_LEN: usize = 64;

/// Access tiers, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access to public cards.
    Guest,
    /// Creates and manages their own cards.
    HomeCook,
    /// Unrestricted, including template management.
    Chef,
}

impl Role {
    /// Parse a role header value.
    #[must_use]
    pub fn from_header(value: &str) -> Option<Self> {
        match value {
            "guest" => Some(Self::Guest),
            "home_cook" => Some(Self::HomeCook),
            "chef" => Some(Self::Chef),
            _ => None,
        }
    }

    /// Stable wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::HomeCook => "home_cook",
            Self::Chef => "chef",
        }
    }

    /// Whether this role may create cards.
    #[must_use]
    pub const fn can_create(self) -> bool {
        matches!(self, Self::HomeCook | Self::Chef)
    }

    /// Whether this role may create, edit, and delete templates.
    #[must_use]
    pub const fn can_manage_templates(self) -> bool {
        matches!(self, Self::Chef)
    }
}

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Opaque user id from the gateway.
    pub user_id: String,
    /// Access tier.
    pub role: Role,
}

impl Identity {
    /// Whether this caller may read a record. Public cards are readable by
    /// everyone; private cards only by their owner or a chef.
    #[must_use]
    pub fn can_view(&self, card: &CardRecord) -> bool {
        card.is_public || self.owns(card) || self.role == Role::Chef
    }

    /// Whether this caller may edit or delete a record.
    #[must_use]
    pub fn can_modify(&self, card: &CardRecord) -> bool {
        self.role == Role::Chef || (self.owns(card) && self.role.can_create())
    }

    fn owns(&self, card: &CardRecord) -> bool {
        card.owner_id == self.user_id
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)?;
        if user_id.len() > MAX_USER_ID_LEN || !user_id.chars().all(is_valid_id_char) {
            return Err(ApiError::Unauthorized(format!(
                "Invalid {USER_ID_HEADER} header"
            )));
        }

        let role_value = header_value(parts, USER_ROLE_HEADER)?;
        let role = Role::from_header(&role_value)
            .ok_or_else(|| ApiError::Unauthorized(format!("Unknown role: {role_value}")))?;

        Ok(Self { user_id, role })
    }
}

fn header_value(parts: &Parts, name: &str) -> Result<String, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ApiError::Unauthorized(format!("Missing {name} header")))
}

/// Valid id characters: alphanumeric, hyphen, underscore.
fn is_valid_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
