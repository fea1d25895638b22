//! Structural contract every stored document must satisfy.
//!
//! Both store backends validate a document against these schemas right
//! before writing it, the way a collection validator would.

use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use super::StoreError;

const UUID_PATTERN: &str = "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

fn id_schema() -> Value {
    json!({ "type": "string", "pattern": UUID_PATTERN })
}

fn id_list_schema() -> Value {
    json!({ "type": "array", "items": id_schema() })
}

fn zone_schema() -> Value {
    json!({
        "type": "object",
        "required": ["_id", "zonename", "steps", "assignedusers"],
        "additionalProperties": false,
        "properties": {
            "_id": id_schema(),
            "zonename": { "type": "string" },
            "steps": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["_id", "text"],
                    "additionalProperties": false,
                    "properties": {
                        "_id": id_schema(),
                        "text": { "type": "string" }
                    }
                }
            },
            "assignedusers": id_list_schema(),
            "qrcode": { "type": "string" },
            "lastcheckin": { "type": "string" },
            "lastcheckout": { "type": "string" },
            "timespent": { "type": "string" }
        }
    })
}

fn location_schema() -> Value {
    json!({
        "type": "object",
        "required": ["_id", "locationname", "assignedusers", "zone"],
        "additionalProperties": false,
        "properties": {
            "_id": id_schema(),
            "locationname": { "type": "string" },
            "assignedusers": id_list_schema(),
            "zone": { "type": "array", "items": zone_schema() }
        }
    })
}

pub fn client_schema() -> Value {
    json!({
        "type": "object",
        "required": ["_id", "clientname", "location", "userRefs"],
        "additionalProperties": false,
        "properties": {
            "_id": id_schema(),
            "clientname": { "type": "string" },
            "location": { "type": "array", "items": location_schema() },
            "userRefs": id_list_schema()
        }
    })
}

pub fn user_schema() -> Value {
    json!({
        "type": "object",
        "required": [
            "_id", "firstname", "lastname", "role", "email",
            "passwordHash", "assignedlocations", "assignedzones"
        ],
        "additionalProperties": false,
        "properties": {
            "_id": id_schema(),
            "firstname": { "type": "string" },
            "lastname": { "type": "string" },
            "role": { "type": "string" },
            "email": { "type": "string" },
            "passwordHash": { "type": "string" },
            "assignedlocations": id_list_schema(),
            "assignedzones": id_list_schema(),
            "clientid": id_schema()
        }
    })
}

static CLIENT_VALIDATOR: Lazy<JSONSchema> = Lazy::new(|| compile(&client_schema()));
static USER_VALIDATOR: Lazy<JSONSchema> = Lazy::new(|| compile(&user_schema()));

fn compile(schema: &Value) -> JSONSchema {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .expect("built-in document schema must compile")
}

/// Collection a document is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Clients,
    Users,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Clients => "clients",
            Collection::Users => "users",
        }
    }

    fn validator(&self) -> &'static JSONSchema {
        match self {
            Collection::Clients => &CLIENT_VALIDATOR,
            Collection::Users => &USER_VALIDATOR,
        }
    }
}

/// Check a serialized document against its collection schema
pub fn validate(collection: Collection, document: &Value) -> Result<(), StoreError> {
    let validator = collection.validator();
    if let Err(errors) = validator.validate(document) {
        let details: Vec<String> = errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();
        return Err(StoreError::Validation(format!(
            "{} document failed validation: {}",
            collection.name(),
            details.join("; ")
        )));
    }
    Ok(())
}
