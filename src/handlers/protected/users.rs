use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{UserPatch, UserProfile};

use super::utils::parse_body;

/// GET /api/users
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<UserProfile>> {
    Ok(ApiResponse::success(state.users.list_users().await?))
}

/// POST /api/users - Register a user
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<UserProfile> {
    let fields: UserPatch = parse_body(payload)?;
    Ok(ApiResponse::created(state.users.create_user(fields).await?))
}

/// GET /api/users/:user_id
pub async fn get(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(state.users.get_user(&user_id).await?))
}

/// PUT /api/users/:user_id - Overwrite the listed user fields
pub async fn update(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<UserProfile> {
    let patch: UserPatch = parse_body(payload)?;
    Ok(ApiResponse::success(state.users.update_user(&user_id, patch).await?))
}
