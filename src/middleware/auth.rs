use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::AuthError;
use crate::error::ApiError;

pub use crate::auth::AuthUser;

/// JWT authentication middleware that validates tokens and injects the
/// caller into request extensions. Runs before any handler logic.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_headers(&headers)?;
    let auth_user = state.auth.authenticate(&token).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Extract the token from the Authorization header.
///
/// Accepts `Bearer <token>` as well as a bare token.
fn extract_token_from_headers(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Authorization header is not valid text".to_string()))?;

    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token.to_string())
}
