use tracing::{info, warn};

use super::{KeyValueStore, StoreError, CLIENTS_KEY};
use crate::models::Client;

/// In-memory client collection backed by a key-value store.
///
/// Every mutating call writes the full collection back before returning.
/// When that write fails the mutation is kept in memory, the repository is
/// marked dirty and the error is handed to the caller.
pub struct ClientRepository<S> {
    store: S,
    clients: Vec<Client>,
    dirty: bool,
}

impl<S: KeyValueStore> ClientRepository<S> {
    /// Read the stored collection. Absent or unreadable data yields an empty
    /// repository; the problem is logged and never surfaced.
    pub async fn load(store: S) -> Self {
        let clients = match store.get(CLIENTS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Client>>(&raw) {
                Ok(clients) => clients,
                Err(e) => {
                    warn!(error = %e, "stored clients could not be parsed, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read stored clients, starting empty");
                Vec::new()
            }
        };

        info!(count = clients.len(), "loaded clients");

        Self {
            store,
            clients,
            dirty: false,
        }
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn get(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// True while the last write failed and memory is ahead of the store.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Serialize the whole collection and replace the stored value.
    pub async fn save_all(&mut self) -> Result<(), StoreError> {
        let result = self.write().await;
        self.dirty = result.is_err();
        if let Err(e) = &result {
            warn!(error = %e, "failed to persist clients, keeping them in memory");
        }
        result
    }

    async fn write(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.clients)?;
        self.store.put(CLIENTS_KEY, &raw).await
    }

    /// Add a client at the front of the collection.
    pub async fn create(&mut self, client: Client) -> Result<(), StoreError> {
        info!(id = %client.id, "creating client");
        self.clients.insert(0, client);
        self.save_all().await
    }

    /// Replace the mutable fields of the client with the same identifier.
    ///
    /// The stored identifier and creation time always win. Returns `Ok(false)`
    /// without touching anything when no client matches.
    pub async fn update(&mut self, client: Client) -> Result<bool, StoreError> {
        let Some(existing) = self.clients.iter_mut().find(|c| c.id == client.id) else {
            return Ok(false);
        };

        info!(id = %client.id, "updating client");
        existing.name = client.name;
        existing.phone = client.phone;
        existing.measurements = client.measurements;

        self.save_all().await?;
        Ok(true)
    }

    /// Remove the client with `id`. Returns `Ok(false)` when nothing matched.
    pub async fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.clients.len();
        self.clients.retain(|c| c.id != id);
        if self.clients.len() == before {
            return Ok(false);
        }

        info!(id, "deleted client");
        self.save_all().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::db::Database;
    use crate::models::{MeasurementField, Measurements};

    /// Map-backed store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        values: Mutex<HashMap<String, String>>,
        fail_writes: AtomicBool,
    }

    impl FlakyStore {
        fn with_value(raw: &str) -> Self {
            let store = Self::default();
            store
                .values
                .lock()
                .unwrap()
                .insert(CLIENTS_KEY.to_string(), raw.to_string());
            store
        }

        fn raw(&self) -> Option<String> {
            self.values.lock().unwrap().get(CLIENTS_KEY).cloned()
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("quota exceeded".into()));
            }
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    struct BrokenReads;

    #[async_trait]
    impl KeyValueStore for BrokenReads {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disk gone".into()))
        }

        async fn put(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn client(name: &str, waist: &str) -> Client {
        let mut measurements = Measurements::default();
        measurements.set(MeasurementField::Waist, waist);
        Client::new(name, Some("0912".into()), measurements)
    }

    fn persisted(repo: &ClientRepository<FlakyStore>) -> Vec<Client> {
        serde_json::from_str(&repo.store().raw().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn empty_store_loads_empty() {
        let repo = ClientRepository::load(FlakyStore::default()).await;
        assert!(repo.is_empty());
        assert!(!repo.is_dirty());
    }

    #[tokio::test]
    async fn malformed_blob_loads_empty() {
        let repo = ClientRepository::load(FlakyStore::with_value("{not json")).await;
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn read_failure_loads_empty() {
        let repo = ClientRepository::load(BrokenReads).await;
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn create_prepends_and_persists() {
        let mut repo = ClientRepository::load(FlakyStore::default()).await;
        let first = client("Ali", "80");
        let second = client("Sara", "70");

        repo.create(first.clone()).await.unwrap();
        repo.create(second.clone()).await.unwrap();

        assert_eq!(repo.len(), 2);
        assert_eq!(repo.clients()[0], second);
        assert_eq!(repo.clients()[1], first);
        assert_eq!(persisted(&repo), repo.clients());
    }

    #[tokio::test]
    async fn update_keeps_identity_and_creation_time() {
        let mut repo = ClientRepository::load(FlakyStore::default()).await;
        let original = client("Ali", "80");
        let other = client("Sara", "70");
        repo.create(original.clone()).await.unwrap();
        repo.create(other.clone()).await.unwrap();

        let mut edited = original.clone();
        edited.name = "Ali R.".into();
        edited.created_at = 42;
        edited.measurements.set(MeasurementField::Waist, "82");

        assert!(repo.update(edited).await.unwrap());

        let saved = repo.get(&original.id).unwrap();
        assert_eq!(saved.name, "Ali R.");
        assert_eq!(saved.created_at, original.created_at);
        assert_eq!(saved.measurements.waist.as_deref(), Some("82"));
        assert_eq!(repo.get(&other.id), Some(&other));
        assert_eq!(persisted(&repo), repo.clients());
    }

    #[tokio::test]
    async fn update_of_unknown_id_changes_nothing() {
        let mut repo = ClientRepository::load(FlakyStore::default()).await;
        repo.create(client("Ali", "80")).await.unwrap();
        let before = repo.clients().to_vec();

        let stranger = client("Nobody", "1");
        assert!(!repo.update(stranger).await.unwrap());
        assert_eq!(repo.clients(), before.as_slice());
    }

    #[tokio::test]
    async fn delete_removes_only_the_target() {
        let mut repo = ClientRepository::load(FlakyStore::default()).await;
        let a = client("A", "1");
        let b = client("B", "2");
        let c = client("C", "3");
        for x in [&a, &b, &c] {
            repo.create(x.clone()).await.unwrap();
        }

        assert!(repo.delete(&b.id).await.unwrap());
        assert_eq!(repo.clients(), &[c.clone(), a.clone()]);
        assert_eq!(persisted(&repo), repo.clients());

        assert!(!repo.delete("missing").await.unwrap());
        assert_eq!(repo.clients(), &[c, a]);
    }

    #[tokio::test]
    async fn failed_write_keeps_memory_and_marks_dirty() {
        let mut repo = ClientRepository::load(FlakyStore::default()).await;
        repo.create(client("Ali", "80")).await.unwrap();

        repo.store().fail_writes.store(true, Ordering::SeqCst);
        let err = repo.create(client("Sara", "70")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(repo.len(), 2);
        assert!(repo.is_dirty());
        assert_eq!(persisted(&repo).len(), 1);

        repo.store().fail_writes.store(false, Ordering::SeqCst);
        repo.save_all().await.unwrap();
        assert!(!repo.is_dirty());
        assert_eq!(persisted(&repo), repo.clients());
    }

    #[tokio::test]
    async fn create_update_delete_scenario_round_trips() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let mut repo = ClientRepository::load(db).await;

        let mut measurements = Measurements::default();
        measurements.set(MeasurementField::Waist, "80");
        let ali = Client::new("Ali Rezaei", Some("0912".into()), measurements);
        repo.create(ali.clone()).await.unwrap();

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.clients()[0].name, "Ali Rezaei");
        assert_eq!(repo.clients()[0].measurements.waist.as_deref(), Some("80"));

        let mut edited = ali.clone();
        edited.measurements.set(MeasurementField::Waist, "82");
        repo.update(edited).await.unwrap();
        assert_eq!(repo.clients()[0].id, ali.id);
        assert_eq!(repo.clients()[0].measurements.waist.as_deref(), Some("82"));

        let raw = repo.store().get(CLIENTS_KEY).await.unwrap().unwrap();
        let stored: Vec<Client> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, repo.clients());

        repo.delete(&ali.id).await.unwrap();
        assert!(repo.is_empty());
        let raw = repo.store().get(CLIENTS_KEY).await.unwrap().unwrap();
        assert_eq!(raw, "[]");
    }

    #[tokio::test]
    async fn reload_sees_previous_writes() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let mut repo = ClientRepository::load(db).await;
        let ali = client("Ali", "80");
        repo.create(ali.clone()).await.unwrap();

        let ClientRepository { store, .. } = repo;
        let reloaded = ClientRepository::load(store).await;
        assert_eq!(reloaded.clients(), &[ali]);
    }
}
