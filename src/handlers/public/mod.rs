// handlers/public/mod.rs - Public handlers (no authentication)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - Service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Patrol API",
            "version": version,
            "description": "Client / location / zone hierarchy with cascade deletes and zone QR codes",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "clients": "/api/clients[/:client] (protected)",
                "hierarchy": "/api/clients/:client/locations/:location[/zones/:zone[/steps/:step]] (protected, DELETE)",
                "users": "/api/users[/:user] (protected)",
            }
        }
    }))
}

/// GET /health - Liveness plus store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}
