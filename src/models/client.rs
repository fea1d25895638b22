use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::ids::deserialize_optional_id;

/// Root aggregate: one stored document per client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "clientname")]
    pub name: String,
    #[serde(rename = "location", default)]
    pub locations: Vec<Location>,
    #[serde(rename = "userRefs", default)]
    pub user_refs: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Uuid>,
    #[serde(rename = "locationname")]
    pub name: String,
    #[serde(rename = "assignedusers", default)]
    pub assigned_users: Vec<Uuid>,
    #[serde(rename = "zone", default)]
    pub zones: Vec<Zone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Zone {
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Uuid>,
    #[serde(rename = "zonename")]
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Data URI of the zone's QR code, derived from `id` once
    #[serde(rename = "qrcode", default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(rename = "lastcheckin", default, skip_serializing_if = "Option::is_none")]
    pub last_check_in: Option<String>,
    #[serde(rename = "lastcheckout", default, skip_serializing_if = "Option::is_none")]
    pub last_check_out: Option<String>,
    #[serde(rename = "timespent", default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<String>,
    #[serde(rename = "assignedusers", default)]
    pub assigned_users: Vec<Uuid>,
}

impl Zone {
    pub fn has_artifact(&self) -> bool {
        self.qr_code.as_deref().is_some_and(|code| !code.is_empty())
    }
}

/// One entry of a zone's ordered checklist.
///
/// Accepts either `{"_id": ..., "text": ...}` or a bare string on input; a
/// bare string is a step that has not been assigned an identifier yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StepInput")]
pub struct Step {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub text: String,
}

impl Step {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepInput {
    Text(String),
    Full(StepFields),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StepFields {
    #[serde(rename = "_id", default, deserialize_with = "deserialize_optional_id")]
    id: Option<Uuid>,
    text: String,
}

impl From<StepInput> for Step {
    fn from(input: StepInput) -> Self {
        match input {
            StepInput::Text(text) => Step { id: None, text },
            StepInput::Full(fields) => Step {
                id: fields.id,
                text: fields.text,
            },
        }
    }
}

/// Full or partial client submission.
///
/// Only the fields present are written; absent fields keep their stored
/// value. A top-level `_id` is accepted and ignored because the path
/// identifier decides which document is written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientPatch {
    #[serde(rename = "_id", default, skip_serializing)]
    body_id: Option<Value>,
    #[serde(rename = "clientname", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "location", default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    #[serde(rename = "userRefs", default, skip_serializing_if = "Option::is_none")]
    pub user_refs: Option<Vec<Uuid>>,
}

impl ClientPatch {
    pub fn new(name: Option<String>, locations: Option<Vec<Location>>, user_refs: Option<Vec<Uuid>>) -> Self {
        Self {
            body_id: None,
            name,
            locations,
            user_refs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.locations.is_none() && self.user_refs.is_none()
    }

    /// Overwrite the fields present in the patch
    pub fn apply_to(&self, client: &mut Client) {
        if let Some(name) = &self.name {
            client.name = name.clone();
        }
        if let Some(locations) = &self.locations {
            client.locations = locations.clone();
        }
        if let Some(user_refs) = &self.user_refs {
            client.user_refs = user_refs.clone();
        }
    }
}
