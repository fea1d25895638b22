use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Deserialize an optional nested `_id`.
///
/// A missing field, `null` and the empty string all mean the object has not
/// been assigned an identifier yet. Any other string must be a UUID.
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid identifier '{}'", value))),
    }
}
