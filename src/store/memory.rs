use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::schema::{self, Collection};
use super::{DocumentStore, StoreError, WriteOutcome};
use crate::models::{Client, ClientPatch, Location, User, UserPatch};

/// Process-local document store, kept in insertion order.
///
/// Applies the same schema validation as the database backend, which makes
/// it a drop-in for tests and for running the service without PostgreSQL.
#[derive(Default)]
pub struct MemoryStore {
    clients: RwLock<Vec<Client>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_client(client: &Client) -> Result<(), StoreError> {
    schema::validate(Collection::Clients, &serde_json::to_value(client)?)
}

fn check_user(user: &User) -> Result<(), StoreError> {
    schema::validate(Collection::Users, &serde_json::to_value(user)?)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_client_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        let clients = self.clients.read().await;
        Ok(clients.iter().find(|c| c.id == id).cloned())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        Ok(self.clients.read().await.clone())
    }

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        check_client(client)?;
        let mut clients = self.clients.write().await;
        if clients.iter().any(|c| c.id == client.id) {
            return Err(StoreError::Validation(format!("duplicate clients _id {}", client.id)));
        }
        clients.push(client.clone());
        Ok(())
    }

    async fn replace_client_locations(&self, id: Uuid, locations: &[Location]) -> Result<WriteOutcome, StoreError> {
        let mut clients = self.clients.write().await;
        let Some(stored) = clients.iter_mut().find(|c| c.id == id) else {
            return Ok(WriteOutcome::unmatched());
        };

        let mut updated = stored.clone();
        updated.locations = locations.to_vec();
        check_client(&updated)?;

        let modified = updated != *stored;
        *stored = updated;
        Ok(WriteOutcome::matched(modified))
    }

    async fn replace_client_document_except_id(
        &self,
        id: Uuid,
        fields: &ClientPatch,
    ) -> Result<WriteOutcome, StoreError> {
        let mut clients = self.clients.write().await;
        let Some(stored) = clients.iter_mut().find(|c| c.id == id) else {
            return Ok(WriteOutcome::unmatched());
        };

        let mut updated = stored.clone();
        fields.apply_to(&mut updated);
        check_client(&updated)?;

        let modified = updated != *stored;
        *stored = updated;
        Ok(WriteOutcome::matched(modified))
    }

    async fn delete_client(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|c| c.id != id);
        Ok(clients.len() != before)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().await.clone())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        check_user(user)?;
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id == user.id) {
            return Err(StoreError::Validation(format!("duplicate users _id {}", user.id)));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn replace_user_except_id(&self, id: Uuid, fields: &UserPatch) -> Result<WriteOutcome, StoreError> {
        let mut users = self.users.write().await;
        let Some(stored) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(WriteOutcome::unmatched());
        };

        let mut updated = stored.clone();
        fields.apply_to(&mut updated);
        check_user(&updated)?;

        let modified = updated != *stored;
        *stored = updated;
        Ok(WriteOutcome::matched(modified))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
