use serde_json::Value;
use uuid::Uuid;

use crate::models::{Client, ClientPatch, Location, Step, User, Zone};

/// Location without identifier, as a caller would submit it
pub fn location(name: &str, zones: Vec<Zone>) -> Location {
    Location {
        id: None,
        name: name.to_string(),
        assigned_users: vec![],
        zones,
    }
}

/// Zone without identifier or artifact
pub fn zone(name: &str, steps: &[&str]) -> Zone {
    Zone {
        id: None,
        name: name.to_string(),
        steps: steps.iter().map(|s| Step::new(*s)).collect(),
        qr_code: None,
        last_check_in: None,
        last_check_out: None,
        time_spent: None,
        assigned_users: vec![],
    }
}

/// Client ready to insert; `locations` must already carry identifiers
pub fn stored_client(name: &str, locations: Vec<Location>) -> Client {
    Client {
        id: Uuid::new_v4(),
        name: name.to_string(),
        locations,
        user_refs: vec![],
    }
}

pub fn patch(body: Value) -> ClientPatch {
    serde_json::from_value(body).expect("fixture patch must deserialize")
}

pub fn user(firstname: &str) -> User {
    User {
        id: Uuid::new_v4(),
        firstname: firstname.to_string(),
        lastname: "Tester".to_string(),
        role: "guard".to_string(),
        email: format!("{}@example.com", firstname.to_lowercase()),
        password_hash: "$2b$10$fixture".to_string(),
        assigned_locations: vec![],
        assigned_zones: vec![],
        client_id: None,
    }
}
