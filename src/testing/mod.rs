pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Client, ClientPatch, Location, User, UserPatch};
use crate::store::{DocumentStore, MemoryStore, StoreError, WriteOutcome};

/// Store wrapper that counts every call reaching the backend
pub struct CountingStore<S> {
    inner: S,
    calls: AtomicUsize,
}

impl<S: DocumentStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for CountingStore<S> {
    async fn find_client_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        self.hit();
        self.inner.find_client_by_id(id).await
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        self.hit();
        self.inner.list_clients().await
    }

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        self.hit();
        self.inner.insert_client(client).await
    }

    async fn replace_client_locations(&self, id: Uuid, locations: &[Location]) -> Result<WriteOutcome, StoreError> {
        self.hit();
        self.inner.replace_client_locations(id, locations).await
    }

    async fn replace_client_document_except_id(
        &self,
        id: Uuid,
        fields: &ClientPatch,
    ) -> Result<WriteOutcome, StoreError> {
        self.hit();
        self.inner.replace_client_document_except_id(id, fields).await
    }

    async fn delete_client(&self, id: Uuid) -> Result<bool, StoreError> {
        self.hit();
        self.inner.delete_client(id).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.hit();
        self.inner.find_user_by_id(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.hit();
        self.inner.list_users().await
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.hit();
        self.inner.insert_user(user).await
    }

    async fn replace_user_except_id(&self, id: Uuid, fields: &UserPatch) -> Result<WriteOutcome, StoreError> {
        self.hit();
        self.inner.replace_user_except_id(id, fields).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}

/// How a `FaultyStore` misbehaves
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Every call sleeps this long before reaching the backend
    Stall(Duration),
    /// Reads work; every write fails collection validation
    RejectWrites,
}

/// Memory store that stalls or rejects calls
pub struct FaultyStore {
    inner: MemoryStore,
    fault: Fault,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore, fault: Fault) -> Self {
        Self { inner, fault }
    }

    async fn read(&self) {
        if let Fault::Stall(delay) = self.fault {
            tokio::time::sleep(delay).await;
        }
    }

    async fn write(&self) -> Result<(), StoreError> {
        match self.fault {
            Fault::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Fault::RejectWrites => Err(StoreError::Validation(
                "document does not match collection schema".to_string(),
            )),
        }
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn find_client_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        self.read().await;
        self.inner.find_client_by_id(id).await
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        self.read().await;
        self.inner.list_clients().await
    }

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        self.write().await?;
        self.inner.insert_client(client).await
    }

    async fn replace_client_locations(&self, id: Uuid, locations: &[Location]) -> Result<WriteOutcome, StoreError> {
        self.write().await?;
        self.inner.replace_client_locations(id, locations).await
    }

    async fn replace_client_document_except_id(
        &self,
        id: Uuid,
        fields: &ClientPatch,
    ) -> Result<WriteOutcome, StoreError> {
        self.write().await?;
        self.inner.replace_client_document_except_id(id, fields).await
    }

    async fn delete_client(&self, id: Uuid) -> Result<bool, StoreError> {
        self.write().await?;
        self.inner.delete_client(id).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.read().await;
        self.inner.find_user_by_id(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.read().await;
        self.inner.list_users().await
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.write().await?;
        self.inner.insert_user(user).await
    }

    async fn replace_user_except_id(&self, id: Uuid, fields: &UserPatch) -> Result<WriteOutcome, StoreError> {
        self.write().await?;
        self.inner.replace_user_except_id(id, fields).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}
