//! AccountService - the primary public API of the engine.
//!
//! Wires a ledger store, a task source, and the catalog into one facade.
//! All ledger mutations for a given user id are serialized behind a
//! per-user lock; different user ids proceed in parallel.

use crate::catalog::Catalog;
use crate::inventory::{self, InventoryError};
use crate::ledger::{LedgerSeed, LedgerStore, StoreError, UserLedger};
use crate::reconcile::{reconcile, SyncStats};
use crate::tasks::TaskSource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from account service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("persistence failure: {0}")]
    Store(#[from] StoreError),
}

/// Tunable policy for the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Points credited per newly-counted task.
    pub points_per_task: u64,

    /// Seed for ledgers created on first access.
    pub seed: LedgerSeed,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            points_per_task: 10,
            seed: LedgerSeed::default(),
        }
    }
}

/// A point-in-time view of a ledger plus the stats of the sync that
/// produced it.
#[derive(Debug, Clone)]
pub struct StateView {
    pub ledger: UserLedger,
    pub stats: SyncStats,
}

pub struct AccountService {
    store: Arc<dyn LedgerStore>,
    source: Arc<dyn TaskSource>,
    catalog: Arc<Catalog>,
    config: ServiceConfig,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        source: Arc<dyn TaskSource>,
        catalog: Arc<Catalog>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            source,
            catalog,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// One lock per user id, created on first use and held for the process
    /// lifetime. The map is never pruned; each entry is a few machine words,
    /// bounded by the number of distinct user ids seen.
    fn user_lock(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    async fn load_or_seed(&self, user_id: &str) -> Result<UserLedger, StoreError> {
        Ok(self
            .store
            .get(user_id)
            .await?
            .unwrap_or_else(|| UserLedger::seeded(&self.config.seed)))
    }

    /// Fetch the completed-task snapshot and reconcile it into the ledger.
    ///
    /// Source failures are not propagated: the cached ledger is served
    /// with zero-delta stats. Store failures are - a credit that did not
    /// reach disk must not look committed.
    pub async fn sync_state(&self, user_id: &str) -> Result<StateView, ServiceError> {
        // The fetch happens before the per-user lock: network I/O must not
        // serialize unrelated mutations for the same user.
        let snapshot = match self.source.list_completed().await {
            Ok(tasks) => Some(tasks),
            Err(e) => {
                warn!(user_id, error = %e, "task source unavailable; serving cached ledger");
                None
            }
        };

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut ledger = self.load_or_seed(user_id).await?;
        let stats = match snapshot {
            Some(tasks) => {
                let stats = reconcile(&mut ledger, &tasks, self.config.points_per_task);
                if stats.changed() {
                    self.store.put(user_id, &ledger).await?;
                    debug!(
                        user_id,
                        points = stats.points_gained_this_sync,
                        tasks = stats.newly_counted_tasks,
                        "credited sync points"
                    );
                }
                stats
            }
            None => SyncStats::default(),
        };

        Ok(StateView { ledger, stats })
    }

    /// Buy an accessory. Returns the updated ledger.
    pub async fn purchase(
        &self,
        user_id: &str,
        accessory_id: &str,
    ) -> Result<UserLedger, ServiceError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut ledger = self.load_or_seed(user_id).await?;
        inventory::purchase(&mut ledger, &self.catalog, accessory_id)?;
        self.store.put(user_id, &ledger).await?;
        debug!(user_id, accessory_id, "accessory purchased");
        Ok(ledger)
    }

    /// Equip an owned accessory. Returns the updated ledger.
    pub async fn equip(
        &self,
        user_id: &str,
        accessory_id: &str,
    ) -> Result<UserLedger, ServiceError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut ledger = self.load_or_seed(user_id).await?;
        inventory::equip(&mut ledger, &self.catalog, accessory_id)?;
        self.store.put(user_id, &ledger).await?;
        Ok(ledger)
    }

    /// Unequip an accessory. Returns the updated ledger.
    pub async fn unequip(
        &self,
        user_id: &str,
        accessory_id: &str,
    ) -> Result<UserLedger, ServiceError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut ledger = self.load_or_seed(user_id).await?;
        inventory::unequip(&mut ledger, accessory_id)?;
        self.store.put(user_id, &ledger).await?;
        Ok(ledger)
    }
}
