//! Process state: seen-set store, destination registry and the session owning them
//!
//! Both stores are best-effort durable: load failures degrade to an empty
//! state and persist failures are logged without rolling back memory.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::model::Destination;
use crate::ports::{DestinationsRepo, SeenIdsRepo};

/// Durable set of article ids already processed, shared by all feeds
pub struct SeenSetStore {
    repo: Arc<dyn SeenIdsRepo>,
    ids: HashSet<u64>,
}

impl SeenSetStore {
    /// Load the stored ids.
    ///
    /// Returns the store and whether durable state was usable. A missing or
    /// unreadable document yields an empty set and `false`.
    pub async fn load(repo: Arc<dyn SeenIdsRepo>) -> (Self, bool) {
        let (ids, had_state) = match repo.load().await {
            Ok(Some(ids)) => (ids, true),
            Ok(None) => (HashSet::new(), false),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load seen article ids");
                (HashSet::new(), false)
            }
        };

        tracing::debug!(count = ids.len(), had_state, "Loaded seen article ids");
        (Self { repo, ids }, had_state)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Insert an id, returning whether it was absent
    pub fn add(&mut self, id: u64) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Write the full set back; failures are logged and swallowed
    pub async fn persist(&self) {
        if let Err(e) = self.repo.save(&self.ids).await {
            tracing::error!(error = %e, count = self.ids.len(), "Failed to persist seen article ids");
        }
    }
}

/// Outcome of an unregister request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unregistered {
    /// The entry with this key was removed
    Removed { key: String },
    /// No entry carried the address
    NotRegistered,
}

/// Durable mapping from display key to delivery address
pub struct DestinationRegistry {
    repo: Arc<dyn DestinationsRepo>,
    entries: BTreeMap<String, String>,
}

impl DestinationRegistry {
    /// Load registered destinations; failures yield an empty registry
    pub async fn load(repo: Arc<dyn DestinationsRepo>) -> Self {
        let entries = match repo.load().await {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load registered destinations");
                BTreeMap::new()
            }
        };

        Self { repo, entries }
    }

    /// Upsert `key -> address` and persist
    pub async fn register(&mut self, key: impl Into<String>, address: impl Into<String>) {
        let key = key.into();
        let address = address.into();
        tracing::info!(key = %key, address = %address, "Registering destination");
        self.entries.insert(key, address);
        self.persist().await;
    }

    /// Remove the first entry whose address matches
    pub async fn unregister_by_address(&mut self, address: &str) -> Unregistered {
        let key = self
            .entries
            .iter()
            .find(|(_, saved)| saved.as_str() == address)
            .map(|(key, _)| key.clone());

        match key {
            Some(key) => {
                self.entries.remove(&key);
                self.persist().await;
                tracing::info!(key = %key, "Unregistered destination");
                Unregistered::Removed { key }
            }
            None => Unregistered::NotRegistered,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Snapshot of all destinations
    pub fn destinations(&self) -> Vec<Destination> {
        self.entries
            .iter()
            .map(|(key, address)| Destination {
                key: key.clone(),
                address: address.clone(),
            })
            .collect()
    }

    pub async fn persist(&self) {
        if let Err(e) = self.repo.save(&self.entries).await {
            tracing::error!(error = %e, "Failed to persist registered destinations");
        }
    }
}

/// State mutated by a reconciliation cycle
pub struct ReconcileState {
    pub seen: SeenSetStore,
    /// True until the first cycle after a fresh deployment completes
    pub first_run: bool,
    pub last_check: Option<OffsetDateTime>,
}

/// Process-lifetime state shared by the checker and command handlers
pub struct Session {
    /// Held for a whole cycle so only one runs at a time
    cycle: Mutex<()>,
    /// Held only while the seen set is read or updated
    reconcile: Mutex<ReconcileState>,
    registry: RwLock<DestinationRegistry>,
    scheduler_running: AtomicBool,
}

impl Session {
    /// Load durable state through the given repositories
    pub async fn load(
        seen_repo: Arc<dyn SeenIdsRepo>,
        destinations_repo: Arc<dyn DestinationsRepo>,
    ) -> Self {
        let (seen, had_state) = SeenSetStore::load(seen_repo).await;
        let registry = DestinationRegistry::load(destinations_repo).await;

        if !had_state {
            tracing::info!("No seen-article state found, treating next check as first run");
        }

        Self {
            cycle: Mutex::new(()),
            reconcile: Mutex::new(ReconcileState {
                seen,
                first_run: !had_state,
                last_check: None,
            }),
            registry: RwLock::new(registry),
            scheduler_running: AtomicBool::new(false),
        }
    }

    /// Claim the in-flight cycle slot without waiting
    pub fn try_begin_check(&self) -> Option<MutexGuard<'_, ()>> {
        self.cycle.try_lock().ok()
    }

    /// Lock the seen set and first-run flag
    pub async fn reconcile_state(&self) -> MutexGuard<'_, ReconcileState> {
        self.reconcile.lock().await
    }

    pub fn registry(&self) -> &RwLock<DestinationRegistry> {
        &self.registry
    }

    pub fn set_scheduler_running(&self, running: bool) {
        self.scheduler_running.store(running, Ordering::SeqCst);
    }

    pub fn scheduler_running(&self) -> bool {
        self.scheduler_running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::ports::StateError;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Seen-ids repo backed by memory, with switchable failures
    #[derive(Default)]
    pub struct FakeSeenRepo {
        pub stored: StdMutex<Option<HashSet<u64>>>,
        pub fail_load: bool,
        pub fail_save: bool,
        pub saves: StdMutex<usize>,
    }

    impl FakeSeenRepo {
        pub fn with_ids(ids: &[u64]) -> Self {
            Self {
                stored: StdMutex::new(Some(ids.iter().copied().collect())),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl SeenIdsRepo for FakeSeenRepo {
        async fn load(&self) -> Result<Option<HashSet<u64>>, StateError> {
            if self.fail_load {
                return Err(StateError::Serialization("corrupt".to_string()));
            }
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn save(&self, ids: &HashSet<u64>) -> Result<(), StateError> {
            *self.saves.lock().unwrap() += 1;
            if self.fail_save {
                return Err(StateError::Io("disk full".to_string()));
            }
            *self.stored.lock().unwrap() = Some(ids.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeDestinationsRepo {
        pub stored: StdMutex<Option<BTreeMap<String, String>>>,
    }

    impl FakeDestinationsRepo {
        pub fn with_entries(entries: &[(&str, &str)]) -> Self {
            Self {
                stored: StdMutex::new(Some(
                    entries
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                )),
            }
        }
    }

    #[async_trait]
    impl DestinationsRepo for FakeDestinationsRepo {
        async fn load(&self) -> Result<Option<BTreeMap<String, String>>, StateError> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StateError> {
            *self.stored.lock().unwrap() = Some(entries.clone());
            Ok(())
        }
    }
}
