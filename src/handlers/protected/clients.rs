use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Message};
use crate::models::{Client, ClientPatch};

use super::utils::parse_body;

/// GET /api/clients - List all clients
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Client>> {
    let clients = state.hierarchy.list_clients().await?;
    Ok(ApiResponse::success(clients))
}

/// POST /api/clients - Create a client, optionally with an initial hierarchy
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Client> {
    let submission: ClientPatch = parse_body(payload)?;
    let client = state.hierarchy.create_client(submission).await?;
    Ok(ApiResponse::created(client))
}

/// GET /api/clients/:client_id - Fetch one client document
pub async fn get(State(state): State<AppState>, Path(client_id): Path<String>) -> ApiResult<Client> {
    let client = state.hierarchy.get_client(&client_id).await?;
    Ok(ApiResponse::success(client))
}

/// PUT /api/clients/:client_id - Reconcile a full or partial client document
pub async fn update(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Client> {
    let submission: ClientPatch = parse_body(payload)?;
    let client = state.hierarchy.reconcile_and_store(&client_id, submission).await?;
    Ok(ApiResponse::success(client))
}

/// DELETE /api/clients/:client_id - Delete a client and its whole hierarchy
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(client_id): Path<String>,
) -> ApiResult<Message> {
    tracing::debug!("{} deleting client {}", user.subject, client_id);
    state.hierarchy.delete_client(&client_id).await?;
    Ok(ApiResponse::success(Message::new("Client deleted successfully")))
}

/// DELETE /api/clients/:client_id/locations/:location_id
pub async fn delete_location(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((client_id, location_id)): Path<(String, String)>,
) -> ApiResult<Message> {
    tracing::debug!("{} deleting location {}/{}", user.subject, client_id, location_id);
    state.hierarchy.delete_location(&client_id, &location_id).await?;
    Ok(ApiResponse::success(Message::new("Location deleted successfully")))
}

/// DELETE /api/clients/:client_id/locations/:location_id/zones/:zone_id
pub async fn delete_zone(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((client_id, location_id, zone_id)): Path<(String, String, String)>,
) -> ApiResult<Message> {
    tracing::debug!("{} deleting zone {}/{}/{}", user.subject, client_id, location_id, zone_id);
    state.hierarchy.delete_zone(&client_id, &location_id, &zone_id).await?;
    Ok(ApiResponse::success(Message::new("Zone deleted successfully")))
}

/// DELETE /api/clients/:client_id/locations/:location_id/zones/:zone_id/steps/:step_id
pub async fn delete_step(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((client_id, location_id, zone_id, step_id)): Path<(String, String, String, String)>,
) -> ApiResult<Message> {
    tracing::debug!(
        "{} deleting step {}/{}/{}/{}",
        user.subject,
        client_id,
        location_id,
        zone_id,
        step_id
    );
    state
        .hierarchy
        .delete_step(&client_id, &location_id, &zone_id, &step_id)
        .await?;
    Ok(ApiResponse::success(Message::new("Step deleted successfully")))
}
