//! Health check endpoints for container probes.
//!
//! - `/health/live` - Liveness probe (restart if fails)
//! - `/health/ready` - Readiness probe (remove from LB if fails)

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Card store accessible
    pub card_store: bool,
    /// Template store accessible
    pub template_store: bool,
}

/// Liveness probe - is the server running?
///
/// Returns 200 OK if the process is alive.
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - is the server ready to accept traffic?
///
/// Exercises both store locks so a poisoned or wedged store takes the
/// instance out of rotation.
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let cards_ok = state.cards.ping();
    let templates_ok = state.templates.ping();
    let all_ok = cards_ok && templates_ok;

    let status = HealthStatus {
        status: if all_ok { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            card_store: cards_ok,
            template_store: templates_ok,
        },
    };

    let code = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "healthy",
            version: "0.1.0",
            checks: HealthChecks {
                card_store: true,
                template_store: true,
            },
        };

        let json = serde_json::to_string(&status).expect("should serialize");
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
        assert!(json.contains("card_store"));
        assert!(json.contains("template_store"));
    }

    #[test]
    fn test_health_status_unhealthy() {
        let status = HealthStatus {
            status: "unhealthy",
            version: "0.1.0",
            checks: HealthChecks {
                card_store: false,
                template_store: true,
            },
        };

        let json = serde_json::to_string(&status).expect("should serialize");
        assert!(json.contains("unhealthy"));
        assert!(json.contains("false")); // card_store: false
    }
}
