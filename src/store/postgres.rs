use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::schema::{self, Collection};
use super::{DocumentStore, StoreError, WriteOutcome};
use crate::config::StoreConfig;
use crate::models::{Client, ClientPatch, Location, User, UserPatch};

/// Document store on PostgreSQL: one `jsonb` document per row.
///
/// Each write locks the target row (`SELECT ... FOR UPDATE`), applies the
/// change in memory, validates the result and writes it back inside one
/// transaction.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let raw = config
            .database_url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let url = url::Url::parse(raw).map_err(|_| StoreError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.operation_timeout_ms))
            .connect(url.as_str())
            .await?;

        info!("Connected document store to {}", redact(&url));

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the collections if this is a fresh database
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for collection in [Collection::Clients, Collection::Users] {
            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id uuid PRIMARY KEY,
                    doc jsonb NOT NULL,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now()
                )",
                collection.name()
            );
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn find_document<T: DeserializeOwned>(&self, collection: Collection, id: Uuid) -> Result<Option<T>, StoreError> {
        let sql = format!("SELECT doc FROM {} WHERE id = $1", collection.name());
        let row: Option<(Value,)> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(|(doc,)| decode(collection, id, doc)).transpose()
    }

    async fn list_documents<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, StoreError> {
        let sql = format!("SELECT id, doc FROM {} ORDER BY created_at, id", collection.name());
        let rows: Vec<(Uuid, Value)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(|(id, doc)| decode(collection, id, doc)).collect()
    }

    async fn insert_document<T: Serialize>(&self, collection: Collection, id: Uuid, document: &T) -> Result<(), StoreError> {
        let doc = serde_json::to_value(document)?;
        schema::validate(collection, &doc)?;

        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", collection.name());
        sqlx::query(&sql).bind(id).bind(Json(&doc)).execute(&self.pool).await?;
        debug!("Inserted {} document {}", collection.name(), id);
        Ok(())
    }

    async fn modify_document<T, F>(&self, collection: Collection, id: Uuid, mutate: F) -> Result<WriteOutcome, StoreError>
    where
        T: Serialize + DeserializeOwned + PartialEq + Send,
        F: FnOnce(&mut T) + Send,
    {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT doc FROM {} WHERE id = $1 FOR UPDATE", collection.name());
        let row: Option<(Value,)> = sqlx::query_as(&select).bind(id).fetch_optional(&mut *tx).await?;
        let Some((doc,)) = row else {
            return Ok(WriteOutcome::unmatched());
        };

        let stored: T = decode(collection, id, doc.clone())?;
        let mut updated: T = decode(collection, id, doc)?;
        mutate(&mut updated);

        if updated == stored {
            tx.commit().await?;
            return Ok(WriteOutcome::matched(false));
        }

        let new_doc = serde_json::to_value(&updated)?;
        schema::validate(collection, &new_doc)?;

        let update = format!("UPDATE {} SET doc = $2, updated_at = now() WHERE id = $1", collection.name());
        sqlx::query(&update).bind(id).bind(Json(&new_doc)).execute(&mut *tx).await?;
        tx.commit().await?;

        debug!("Replaced {} document {}", collection.name(), id);
        Ok(WriteOutcome::matched(true))
    }

    async fn delete_document(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", collection.name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

fn decode<T: DeserializeOwned>(collection: Collection, id: Uuid, doc: Value) -> Result<T, StoreError> {
    serde_json::from_value(doc).map_err(|e| StoreError::Corrupt {
        collection: collection.name(),
        id,
        reason: e.to_string(),
    })
}

/// Connection URL with the password masked, for logs
fn redact(url: &url::Url) -> String {
    let mut shown = url.clone();
    if shown.password().is_some() {
        let _ = shown.set_password(Some("****"));
    }
    shown.to_string()
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_client_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        self.find_document(Collection::Clients, id).await
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        self.list_documents(Collection::Clients).await
    }

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        self.insert_document(Collection::Clients, client.id, client).await
    }

    async fn replace_client_locations(&self, id: Uuid, locations: &[Location]) -> Result<WriteOutcome, StoreError> {
        let locations = locations.to_vec();
        self.modify_document(Collection::Clients, id, move |client: &mut Client| {
            client.locations = locations;
        })
        .await
    }

    async fn replace_client_document_except_id(
        &self,
        id: Uuid,
        fields: &ClientPatch,
    ) -> Result<WriteOutcome, StoreError> {
        self.modify_document(Collection::Clients, id, |client: &mut Client| fields.apply_to(client))
            .await
    }

    async fn delete_client(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_document(Collection::Clients, id).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.find_document(Collection::Users, id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.list_documents(Collection::Users).await
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.insert_document(Collection::Users, user.id, user).await
    }

    async fn replace_user_except_id(&self, id: Uuid, fields: &UserPatch) -> Result<WriteOutcome, StoreError> {
        self.modify_document(Collection::Users, id, |user: &mut User| fields.apply_to(user))
            .await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
