use axum::Json;
use serde_json::{json, Value};

/// Liveness check
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
