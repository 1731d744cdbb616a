//! Shared relay service wrapper used by the CLI and any external scheduler.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::RelayConfig;
use crate::crm::{CrmClient, DealDefaults, HubSpotClient};
use crate::db::{
    ActionableRepository, CallRepository, Database, IntegrationRepository,
    LibSqlActionableRepository, LibSqlCallRepository, LibSqlIntegrationRepository,
    LibSqlSyncStatusRepository, SyncRecordFilter, SyncStatusRepository,
};
use crate::models::{
    Actionable, Call, EntityId, EntityType, IntegrationSettings, SweepReport, SyncId, SyncOutcome,
    SyncRecord, UserId,
};
use crate::sync::{BackoffPolicy, RetryScheduler, SyncDispatcher};
use crate::Result;

/// Thread-safe service owning the database, the CRM client and the retry
/// policy.
///
/// Every operation runs under the database lock, so one service instance
/// processes syncs strictly one at a time.
pub struct RelayService<C> {
    db: Arc<Mutex<Database>>,
    crm: Arc<C>,
    policy: Arc<BackoffPolicy>,
    deals: Arc<DealDefaults>,
}

impl<C> Clone for RelayService<C> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            crm: Arc::clone(&self.crm),
            policy: Arc::clone(&self.policy),
            deals: Arc::clone(&self.deals),
        }
    }
}

impl RelayService<HubSpotClient> {
    /// Open the database at `db_path` and build a HubSpot client from `config`.
    pub async fn open(db_path: impl AsRef<Path>, config: &RelayConfig) -> Result<Self> {
        let db_path = db_path.as_ref();
        let crm = HubSpotClient::new(config.hubspot_base_url.clone(), config.http_timeout)?;
        let db = Database::open(db_path).await?;
        tracing::debug!(
            db_path = %db_path.display(),
            hubspot = crm.base_url(),
            "Relay service opened"
        );
        Ok(Self::new(db, crm, config))
    }
}

impl<C: CrmClient> RelayService<C> {
    pub fn new(db: Database, crm: C, config: &RelayConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            crm: Arc::new(crm),
            policy: Arc::new(config.backoff.clone()),
            deals: Arc::new(config.deals.clone()),
        }
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Start a fresh sync lineage for an entity.
    ///
    /// Dispatch errors are returned after being recorded on the entity's
    /// sync-status record.
    pub async fn trigger_sync(
        &self,
        user: &UserId,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> Result<SyncOutcome> {
        let db = self.db.lock().await;
        SyncDispatcher::new(db.connection(), self.crm.as_ref(), &self.deals)
            .sync_entity(user, entity_type, entity_id, 0)
            .await
    }

    /// Retry one failed record; never fails, the outcome carries the reason.
    pub async fn retry(&self, sync_id: &SyncId) -> SyncOutcome {
        let db = self.db.lock().await;
        self.scheduler(db.connection()).retry(sync_id).await
    }

    /// Retry one failed record, returning the typed reason on failure.
    pub async fn try_retry(&self, sync_id: &SyncId) -> Result<SyncOutcome> {
        let db = self.db.lock().await;
        self.scheduler(db.connection()).try_retry(sync_id).await
    }

    /// Sweep every failed record below the retry ceiling.
    pub async fn retry_all_failed(&self) -> Result<SweepReport> {
        let db = self.db.lock().await;
        self.scheduler(db.connection()).retry_all_failed().await
    }

    /// Retry on behalf of a user, who must own the record.
    pub async fn manual_retry(
        &self,
        sync_id: &SyncId,
        requesting_user: &UserId,
    ) -> Result<SyncOutcome> {
        let db = self.db.lock().await;
        self.scheduler(db.connection())
            .manual_retry(sync_id, requesting_user)
            .await
    }

    /// Fetch a sync record by id.
    pub async fn get_record(&self, sync_id: &SyncId) -> Result<Option<SyncRecord>> {
        let db = self.db.lock().await;
        LibSqlSyncStatusRepository::new(db.connection())
            .get(sync_id)
            .await
    }

    /// List sync records, oldest first.
    pub async fn list_records(&self, filter: &SyncRecordFilter) -> Result<Vec<SyncRecord>> {
        let db = self.db.lock().await;
        LibSqlSyncStatusRepository::new(db.connection())
            .list(filter)
            .await
    }

    /// Store a user's HubSpot credential.
    pub async fn save_integration(&self, settings: &IntegrationSettings) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlIntegrationRepository::new(db.connection())
            .save(settings)
            .await
    }

    /// Store a call.
    pub async fn add_call(&self, call: &Call) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlCallRepository::new(db.connection()).create(call).await
    }

    /// Store an actionable.
    pub async fn add_actionable(&self, actionable: &Actionable) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlActionableRepository::new(db.connection())
            .create(actionable)
            .await
    }

    /// Fetch an actionable by id.
    pub async fn get_actionable(&self, id: &EntityId) -> Result<Option<Actionable>> {
        let db = self.db.lock().await;
        LibSqlActionableRepository::new(db.connection())
            .get(id)
            .await
    }

    fn scheduler<'a>(&'a self, conn: &'a libsql::Connection) -> RetryScheduler<'a, C> {
        RetryScheduler::new(conn, self.crm.as_ref(), &self.deals, &self.policy)
    }
}
