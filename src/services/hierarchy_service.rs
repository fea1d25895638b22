use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::hierarchy::cascade::parse_identifier;
use crate::hierarchy::{assign_identities, check_unique_identities, remove_node, HierarchyError, NodePath, QrGenerator};
use crate::models::{Client, ClientPatch, Location};
use crate::store::{with_timeout, DocumentStore, StoreError};

/// Client documents: reconciliation on write and cascade deletes.
///
/// Every mutation is a read-modify-write of one client document. Two
/// concurrent mutations of the same client are not serialized against each
/// other; the later write wins.
#[derive(Clone)]
pub struct HierarchyService {
    store: Arc<dyn DocumentStore>,
    qr: QrGenerator,
    timeout: Duration,
}

impl HierarchyService {
    pub fn new(store: Arc<dyn DocumentStore>, qr: QrGenerator, timeout: Duration) -> Self {
        Self { store, qr, timeout }
    }

    async fn call<T, F>(&self, operation: &'static str, call: F) -> Result<T, HierarchyError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        Ok(with_timeout(operation, self.timeout, call).await?)
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, HierarchyError> {
        self.call("list_clients", self.store.list_clients()).await
    }

    pub async fn get_client(&self, client_id: &str) -> Result<Client, HierarchyError> {
        let id = parse_identifier("client", client_id)?;
        self.load(id).await
    }

    async fn load(&self, id: Uuid) -> Result<Client, HierarchyError> {
        self.call("find_client_by_id", self.store.find_client_by_id(id))
            .await?
            .ok_or_else(|| {
                warn!("Client {} not found", id);
                HierarchyError::not_found("Client not found")
            })
    }

    /// Fill in identifiers and QR artifacts for a submitted location tree.
    /// Identifiers the caller supplied must not repeat anywhere in the tree.
    async fn reconcile_locations(&self, locations: &mut [Location]) -> Result<(), HierarchyError> {
        check_unique_identities(locations).map_err(|e| {
            warn!("Rejected location tree: {}", e);
            e
        })?;
        let ids = assign_identities(locations);
        let artifacts = self.qr.fill_missing_artifacts(locations).await?;
        debug!("Reconciled location tree: {} identifiers, {} QR artifacts", ids, artifacts);
        Ok(())
    }

    /// Create a client; the initial hierarchy is reconciled like an update
    pub async fn create_client(&self, mut submitted: ClientPatch) -> Result<Client, HierarchyError> {
        let name = submitted
            .name
            .take()
            .ok_or_else(|| HierarchyError::invalid_document("clientname is required"))?;

        let mut locations = submitted.locations.take().unwrap_or_default();
        self.reconcile_locations(&mut locations).await?;

        let client = Client {
            id: Uuid::new_v4(),
            name,
            locations,
            user_refs: submitted.user_refs.take().unwrap_or_default(),
        };
        self.call("insert_client", self.store.insert_client(&client)).await?;
        info!("Created client {}", client.id);

        self.load(client.id).await
    }

    /// Reconcile a full or partial submission against the stored client.
    ///
    /// The path identifier decides the target document; any `_id` in the
    /// body is ignored. New locations, zones and steps get identifiers,
    /// zones without a QR artifact get one, then the provided fields replace
    /// the stored ones and the result is read back from the store.
    pub async fn reconcile_and_store(&self, client_id: &str, mut submitted: ClientPatch) -> Result<Client, HierarchyError> {
        let id = parse_identifier("client", client_id)?;

        if let Some(locations) = submitted.locations.as_mut() {
            self.reconcile_locations(locations).await?;
        }

        let outcome = self
            .call(
                "replace_client_document_except_id",
                self.store.replace_client_document_except_id(id, &submitted),
            )
            .await?;

        if !outcome.matched {
            warn!("Reconcile matched no client {}", id);
            return Err(HierarchyError::not_found("Client not found"));
        }
        debug!("Reconciled client {} (modified: {})", id, outcome.modified);

        self.load(id).await
    }

    /// Delete the node addressed by raw path segments
    /// (`[client]`, `[client, location]`, ...)
    pub async fn delete_path(&self, segments: &[&str]) -> Result<(), HierarchyError> {
        let path = NodePath::parse(segments)?;
        self.delete(&path).await
    }

    pub async fn delete_client(&self, client_id: &str) -> Result<(), HierarchyError> {
        self.delete_path(&[client_id]).await
    }

    pub async fn delete_location(&self, client_id: &str, location_id: &str) -> Result<(), HierarchyError> {
        self.delete_path(&[client_id, location_id]).await
    }

    pub async fn delete_zone(&self, client_id: &str, location_id: &str, zone_id: &str) -> Result<(), HierarchyError> {
        self.delete_path(&[client_id, location_id, zone_id]).await
    }

    pub async fn delete_step(
        &self,
        client_id: &str,
        location_id: &str,
        zone_id: &str,
        step_id: &str,
    ) -> Result<(), HierarchyError> {
        self.delete_path(&[client_id, location_id, zone_id, step_id]).await
    }

    /// Remove a node and everything beneath it
    pub async fn delete(&self, path: &NodePath) -> Result<(), HierarchyError> {
        let client_id = path.client_id();

        if let NodePath::Client(_) = path {
            let deleted = self.call("delete_client", self.store.delete_client(client_id)).await?;
            if !deleted {
                warn!("Delete matched no client {}", client_id);
                return Err(HierarchyError::not_found("Client not found"));
            }
            info!("Deleted client {}", client_id);
            return Ok(());
        }

        let mut client = self.load(client_id).await?;
        let removed = remove_node(&mut client.locations, path).map_err(|e| {
            warn!("{} delete on client {} failed: {}", path.kind(), client_id, e);
            e
        })?;

        let outcome = self
            .call(
                "replace_client_locations",
                self.store.replace_client_locations(client_id, &client.locations),
            )
            .await?;

        if !outcome.matched {
            warn!("Client {} disappeared before {} delete was written", client_id, path.kind());
            return Err(HierarchyError::not_found("Client not found"));
        }

        info!(
            "Deleted {} from client {} ({} nodes removed)",
            path.kind(),
            client_id,
            removed.node_count()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Step;
    use crate::store::MemoryStore;
    use crate::testing::{fixtures, CountingStore, Fault, FaultyStore};
    use serde_json::json;

    fn service_with(store: Arc<dyn DocumentStore>) -> HierarchyService {
        HierarchyService::new(store, QrGenerator::default(), Duration::from_secs(5))
    }

    async fn seeded() -> (HierarchyService, Client) {
        let service = service_with(Arc::new(MemoryStore::new()));
        let client = service
            .create_client(fixtures::patch(json!({
                "clientname": "C1",
                "location": [{
                    "locationname": "L1",
                    "zone": [
                        { "zonename": "Z1", "steps": ["doors"] },
                        { "zonename": "Z2", "steps": ["hatch", "ladder"] }
                    ]
                }]
            })))
            .await
            .unwrap();
        (service, client)
    }

    fn id(value: Option<Uuid>) -> String {
        value.unwrap().to_string()
    }

    #[tokio::test]
    async fn create_assigns_identifiers_and_artifacts() {
        let (_, client) = seeded().await;
        let zones = &client.locations[0].zones;

        assert!(client.locations[0].id.is_some());
        assert_eq!(zones.len(), 2);
        assert!(zones.iter().all(|z| z.id.is_some() && z.has_artifact()));
        assert!(zones[1].steps.iter().all(|s| s.id.is_some()));
    }

    #[tokio::test]
    async fn reconcile_fills_new_nodes_with_distinct_ids() {
        let (service, client) = seeded().await;
        let mut locations = client.locations.clone();
        locations.push(fixtures::location("L2", vec![fixtures::zone("Z3", &[])]));

        let stored = service
            .reconcile_and_store(
                &client.id.to_string(),
                ClientPatch::new(None, Some(locations), None),
            )
            .await
            .unwrap();

        let new_location = &stored.locations[1];
        let new_zone = &new_location.zones[0];
        let mut all_ids: Vec<Uuid> = vec![client.id];
        for location in &stored.locations {
            all_ids.push(location.id.unwrap());
            all_ids.extend(location.zones.iter().map(|z| z.id.unwrap()));
        }
        let unique: std::collections::HashSet<_> = all_ids.iter().collect();

        assert!(new_location.id.is_some());
        assert!(new_zone.has_artifact());
        assert_eq!(unique.len(), all_ids.len());
        assert_eq!(stored.name, "C1");
    }

    #[tokio::test]
    async fn reconcile_never_regenerates_existing_artifacts() {
        let (service, client) = seeded().await;
        let mut locations = client.locations.clone();
        locations[0].zones[0].name = "Z1 renamed".into();
        locations[0].zones[0].last_check_in = Some("2024-03-01T08:00:00Z".into());
        locations[0].zones[1].qr_code = Some("data:image/png;base64,printed".into());

        let stored = service
            .reconcile_and_store(&client.id.to_string(), ClientPatch::new(None, Some(locations), None))
            .await
            .unwrap();

        let zones = &stored.locations[0].zones;
        assert_eq!(zones[0].qr_code, client.locations[0].zones[0].qr_code);
        assert_eq!(zones[0].id, client.locations[0].zones[0].id);
        assert_eq!(zones[0].name, "Z1 renamed");
        assert_eq!(zones[1].qr_code.as_deref(), Some("data:image/png;base64,printed"));

        let again = service
            .reconcile_and_store(
                &client.id.to_string(),
                ClientPatch::new(None, Some(stored.locations.clone()), None),
            )
            .await
            .unwrap();
        assert_eq!(again, stored);
    }

    #[tokio::test]
    async fn reconcile_tolerates_partial_submissions() {
        let (service, client) = seeded().await;

        let renamed = service
            .reconcile_and_store(&client.id.to_string(), fixtures::patch(json!({ "clientname": "C1b" })))
            .await
            .unwrap();
        assert_eq!(renamed.name, "C1b");
        assert_eq!(renamed.locations, client.locations);

        let emptied = service
            .reconcile_and_store(
                &client.id.to_string(),
                fixtures::patch(json!({ "location": [{ "locationname": "Bare" }] })),
            )
            .await
            .unwrap();
        assert_eq!(emptied.locations.len(), 1);
        assert!(emptied.locations[0].zones.is_empty());
    }

    #[tokio::test]
    async fn reconcile_uses_path_id_not_body_id() {
        let (service, client) = seeded().await;
        let other = service
            .create_client(fixtures::patch(json!({ "clientname": "Other" })))
            .await
            .unwrap();

        let patch = fixtures::patch(json!({ "_id": other.id.to_string(), "clientname": "Target" }));
        service.reconcile_and_store(&client.id.to_string(), patch).await.unwrap();

        assert_eq!(service.get_client(&client.id.to_string()).await.unwrap().name, "Target");
        assert_eq!(service.get_client(&other.id.to_string()).await.unwrap().name, "Other");
    }

    #[tokio::test]
    async fn reconcile_unknown_client_is_not_found() {
        let (service, _) = seeded().await;
        let err = service
            .reconcile_and_store(&Uuid::new_v4().to_string(), fixtures::patch(json!({ "clientname": "x" })))
            .await
            .unwrap_err();
        assert_eq!(err, HierarchyError::not_found("Client not found"));
    }

    #[tokio::test]
    async fn reconcile_rejects_malformed_client_id() {
        let (service, _) = seeded().await;
        let err = service
            .reconcile_and_store("65a1f0c2e4b0a1b2c3d4e5f6", ClientPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidIdentifier { kind: "client", .. }));
    }

    #[tokio::test]
    async fn cascade_scenario_down_to_empty() {
        let (service, client) = seeded().await;
        let c1 = client.id.to_string();
        let l1 = id(client.locations[0].id);
        let z1 = client.locations[0].zones[0].id;
        let z2 = id(client.locations[0].zones[1].id);

        service.delete_zone(&c1, &l1, &z2).await.unwrap();
        let stored = service.get_client(&c1).await.unwrap();
        let zone_ids: Vec<_> = stored.locations[0].zones.iter().map(|z| z.id).collect();
        assert_eq!(zone_ids, vec![z1]);

        service.delete_zone(&c1, &l1, &id(z1)).await.unwrap();
        let stored = service.get_client(&c1).await.unwrap();
        assert!(stored.locations[0].zones.is_empty());

        service.delete_location(&c1, &l1).await.unwrap();
        let stored = service.get_client(&c1).await.unwrap();
        assert!(stored.locations.is_empty());
    }

    #[tokio::test]
    async fn deleting_location_leaves_no_residue() {
        let (service, client) = seeded().await;
        let c1 = client.id.to_string();
        let location = &client.locations[0];

        service.delete_location(&c1, &id(location.id)).await.unwrap();

        let stored = serde_json::to_string(&service.get_client(&c1).await.unwrap()).unwrap();
        assert!(!stored.contains(&id(location.id)));
        for zone in &location.zones {
            assert!(!stored.contains(&id(zone.id)));
            for step in &zone.steps {
                assert!(!stored.contains(&id(step.id)));
            }
        }
    }

    #[tokio::test]
    async fn deleting_step_keeps_sibling_order() {
        let (service, client) = seeded().await;
        let c1 = client.id.to_string();
        let location = &client.locations[0];
        let zone = &location.zones[1];

        service
            .delete_step(&c1, &id(location.id), &id(zone.id), &id(zone.steps[0].id))
            .await
            .unwrap();

        let stored = service.get_client(&c1).await.unwrap();
        let steps: Vec<&Step> = stored.locations[0].zones[1].steps.iter().collect();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].text, "ladder");
    }

    #[tokio::test]
    async fn missing_zone_is_not_found_and_document_unchanged() {
        let (service, client) = seeded().await;
        let c1 = client.id.to_string();

        let err = service
            .delete_zone(&c1, &id(client.locations[0].id), &Uuid::new_v4().to_string())
            .await
            .unwrap_err();

        assert_eq!(err, HierarchyError::not_found("Zone not found"));
        assert_eq!(service.get_client(&c1).await.unwrap(), client);
    }

    #[tokio::test]
    async fn missing_levels_report_which_level() {
        let (service, client) = seeded().await;
        let c1 = client.id.to_string();
        let l1 = id(client.locations[0].id);
        let z1 = id(client.locations[0].zones[0].id);
        let unknown = Uuid::new_v4().to_string();

        assert_eq!(
            service.delete_location(&unknown, &l1).await.unwrap_err(),
            HierarchyError::not_found("Client not found")
        );
        assert_eq!(
            service.delete_location(&c1, &unknown).await.unwrap_err(),
            HierarchyError::not_found("Location not found")
        );
        assert_eq!(
            service.delete_step(&c1, &l1, &z1, &unknown).await.unwrap_err(),
            HierarchyError::not_found("Step not found")
        );
    }

    #[tokio::test]
    async fn malformed_path_never_reaches_the_store() {
        let store = Arc::new(CountingStore::new(MemoryStore::new()));
        let service = service_with(store.clone());
        let c3 = Uuid::new_v4().to_string();

        let err = service.delete_location(&c3, "not-a-location").await.unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidIdentifier { kind: "location", .. }));

        let err = service
            .delete_step(&c3, &Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), "42")
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidIdentifier { kind: "step", .. }));

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn deleting_client_removes_document() {
        let (service, client) = seeded().await;
        let c1 = client.id.to_string();

        service.delete_client(&c1).await.unwrap();
        assert_eq!(
            service.get_client(&c1).await.unwrap_err(),
            HierarchyError::not_found("Client not found")
        );
        assert_eq!(
            service.delete_client(&c1).await.unwrap_err(),
            HierarchyError::not_found("Client not found")
        );
    }

    #[tokio::test]
    async fn create_requires_a_name() {
        let service = service_with(Arc::new(MemoryStore::new()));
        let err = service.create_client(ClientPatch::default()).await.unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn repeated_identifiers_are_rejected_before_any_write() {
        let (service, client) = seeded().await;
        let c1 = client.id.to_string();
        let shared = client.locations[0].id;

        // Same id on a second location and on a zone of the first
        let mut locations = client.locations.clone();
        locations[0].zones[0].id = shared;
        let mut twin = fixtures::location("L1 copy", vec![]);
        twin.id = shared;
        locations.push(twin);

        let err = service
            .reconcile_and_store(&c1, ClientPatch::new(None, Some(locations), None))
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidDocument(_)));
        assert_eq!(service.get_client(&c1).await.unwrap(), client);

        let err = service
            .create_client(fixtures::patch(json!({
                "clientname": "C4",
                "location": [
                    { "_id": id(shared), "locationname": "A" },
                    { "_id": id(shared), "locationname": "B" }
                ]
            })))
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidDocument(_)));
        assert_eq!(service.list_clients().await.unwrap().len(), 1);
    }

    async fn faulty_service(fault: Fault, timeout: Duration) -> (HierarchyService, Client) {
        let mut locations = vec![fixtures::location("L1", vec![fixtures::zone("Z1", &["doors"])])];
        assign_identities(&mut locations);
        QrGenerator::default().fill_missing_artifacts(&mut locations).await.unwrap();
        let client = fixtures::stored_client("C1", locations);

        let inner = MemoryStore::new();
        inner.insert_client(&client).await.unwrap();
        let store = Arc::new(FaultyStore::new(inner, fault));
        (HierarchyService::new(store, QrGenerator::default(), timeout), client)
    }

    #[tokio::test]
    async fn stalled_store_is_unavailable() {
        let (service, client) = faulty_service(Fault::Stall(Duration::from_millis(500)), Duration::from_millis(20)).await;
        let c1 = client.id.to_string();

        let err = service
            .delete_location(&c1, &id(client.locations[0].id))
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::StoreUnavailable(ref msg) if msg.contains("find_client_by_id")));

        let err = service
            .reconcile_and_store(&c1, ClientPatch::new(Some("C1 renamed".into()), None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::StoreUnavailable(ref msg) if msg.contains("replace_client_document_except_id")));
    }

    #[tokio::test]
    async fn rejected_write_is_an_invalid_document() {
        let (service, client) = faulty_service(Fault::RejectWrites, Duration::from_secs(5)).await;
        let c1 = client.id.to_string();

        let err = service
            .delete_location(&c1, &id(client.locations[0].id))
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidDocument(_)));

        let err = service
            .reconcile_and_store(&c1, ClientPatch::new(Some("C1 renamed".into()), None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidDocument(_)));

        // Reads still work and nothing was written
        assert_eq!(service.get_client(&c1).await.unwrap(), client);
    }
}
