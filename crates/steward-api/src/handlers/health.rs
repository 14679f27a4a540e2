use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tracing::warn;

use crate::state::AppState;

/// Liveness plus the active model and storage backend.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_ok = match state.db.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            warn!(subsystem = "api", component = "health", error = %e, "Storage health check failed");
            false
        }
    };

    let status = if storage_ok { "healthy" } else { "degraded" };
    Json(serde_json::json!({
        "status": status,
        "model": state.extractor.model_name(),
        "storage": state.db.backend_name(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
