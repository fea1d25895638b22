use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Decode a JSON request body into a document type.
///
/// Malformed JSON is a 400; JSON that does not fit the document contract
/// (unknown fields, wrong types, malformed nested ids) is a 422.
pub fn parse_body<T: DeserializeOwned>(payload: Result<Json<Value>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = payload.map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;
    if !value.is_object() {
        return Err(ApiError::invalid_json("Request body must be a JSON object"));
    }
    Ok(serde_json::from_value(value)?)
}
