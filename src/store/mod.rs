//! Persistence boundary for client and user documents.

pub mod memory;
pub mod postgres;
pub mod schema;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Client, ClientPatch, Location, User, UserPatch};

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("Store operation '{operation}' timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Stored {collection} document {id} is unreadable: {reason}")]
    Corrupt {
        collection: &'static str,
        id: Uuid,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Result of a write matched by document id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOutcome {
    pub matched: bool,
    pub modified: bool,
}

impl WriteOutcome {
    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn matched(modified: bool) -> Self {
        Self {
            matched: true,
            modified,
        }
    }
}

/// Schema-validated document storage.
///
/// Writes replace whole fields of a single document; a backend must make
/// each call atomic at the document level. There is no version check, so
/// two read-modify-write cycles on the same client race and the later
/// write wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_client_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError>;

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError>;

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError>;

    /// Replace the `location` field of one client
    async fn replace_client_locations(&self, id: Uuid, locations: &[Location]) -> Result<WriteOutcome, StoreError>;

    /// Overwrite every field present in `fields`, leaving `_id` alone
    async fn replace_client_document_except_id(&self, id: Uuid, fields: &ClientPatch)
        -> Result<WriteOutcome, StoreError>;

    async fn delete_client(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn replace_user_except_id(&self, id: Uuid, fields: &UserPatch) -> Result<WriteOutcome, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Bound a store call by `limit`
pub async fn with_timeout<T, F>(operation: &'static str, limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation,
            elapsed: limit,
        }),
    }
}
