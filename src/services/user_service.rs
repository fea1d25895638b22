use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::hierarchy::cascade::parse_identifier;
use crate::hierarchy::HierarchyError;
use crate::models::{User, UserPatch, UserProfile};
use crate::store::{with_timeout, DocumentStore};

/// Flat user documents. No nesting and no cascade: clients, locations and
/// zones refer to users by id only, and dangling references are allowed.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, HierarchyError> {
        let users = with_timeout("list_users", self.timeout, self.store.list_users()).await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserProfile, HierarchyError> {
        let id = parse_identifier("user", user_id)?;
        with_timeout("find_user_by_id", self.timeout, self.store.find_user_by_id(id))
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| HierarchyError::not_found("User not found"))
    }

    /// Create a user from the submitted fields; `passwordHash` is stored as given
    pub async fn create_user(&self, fields: UserPatch) -> Result<UserProfile, HierarchyError> {
        let user = User {
            id: Uuid::new_v4(),
            firstname: required(fields.firstname, "firstname")?,
            lastname: required(fields.lastname, "lastname")?,
            role: required(fields.role, "role")?,
            email: required(fields.email, "email")?,
            password_hash: required(fields.password_hash, "passwordHash")?,
            assigned_locations: fields.assigned_locations.unwrap_or_default(),
            assigned_zones: fields.assigned_zones.unwrap_or_default(),
            client_id: fields.client_id,
        };

        with_timeout("insert_user", self.timeout, self.store.insert_user(&user)).await?;
        info!("Created user {}", user.id);

        self.get_user(&user.id.to_string()).await
    }

    pub async fn update_user(&self, user_id: &str, patch: UserPatch) -> Result<UserProfile, HierarchyError> {
        let id = parse_identifier("user", user_id)?;
        let outcome = with_timeout(
            "replace_user_except_id",
            self.timeout,
            self.store.replace_user_except_id(id, &patch),
        )
        .await?;

        if !outcome.matched {
            warn!("User update matched no user {}", id);
            return Err(HierarchyError::not_found("User not found"));
        }

        self.get_user(user_id).await
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, HierarchyError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| HierarchyError::invalid_document(format!("{} is required", field)))
}
