use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stored user document. Referenced by id from clients, locations and zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub role: String,
    pub email: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    #[serde(rename = "assignedlocations", default)]
    pub assigned_locations: Vec<Uuid>,
    #[serde(rename = "assignedzones", default)]
    pub assigned_zones: Vec<Uuid>,
    #[serde(rename = "clientid", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
}

/// User as returned over the API (no credential hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub role: String,
    pub email: String,
    #[serde(rename = "assignedlocations")]
    pub assigned_locations: Vec<Uuid>,
    #[serde(rename = "assignedzones")]
    pub assigned_zones: Vec<Uuid>,
    #[serde(rename = "clientid", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            firstname: user.firstname,
            lastname: user.lastname,
            role: user.role,
            email: user.email,
            assigned_locations: user.assigned_locations,
            assigned_zones: user.assigned_zones,
            client_id: user.client_id,
        }
    }
}

/// Partial user update; same `$set` semantics as `ClientPatch`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    #[serde(rename = "_id", default, skip_serializing)]
    body_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "passwordHash", default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(rename = "assignedlocations", default, skip_serializing_if = "Option::is_none")]
    pub assigned_locations: Option<Vec<Uuid>>,
    #[serde(rename = "assignedzones", default, skip_serializing_if = "Option::is_none")]
    pub assigned_zones: Option<Vec<Uuid>>,
    #[serde(rename = "clientid", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
}

impl UserPatch {
    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.firstname {
            user.firstname = v.clone();
        }
        if let Some(v) = &self.lastname {
            user.lastname = v.clone();
        }
        if let Some(v) = &self.role {
            user.role = v.clone();
        }
        if let Some(v) = &self.email {
            user.email = v.clone();
        }
        if let Some(v) = &self.password_hash {
            user.password_hash = v.clone();
        }
        if let Some(v) = &self.assigned_locations {
            user.assigned_locations = v.clone();
        }
        if let Some(v) = &self.assigned_zones {
            user.assigned_zones = v.clone();
        }
        if let Some(v) = self.client_id {
            user.client_id = Some(v);
        }
    }
}
