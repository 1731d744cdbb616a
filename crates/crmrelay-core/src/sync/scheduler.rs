//! Retry scheduler: backoff-gated re-dispatch of failed sync records, the
//! batch sweep over them, and the owner-checked manual retry.

use libsql::Connection;

use crate::crm::{CrmClient, DealDefaults};
use crate::db::{LibSqlSyncStatusRepository, SyncRecordFilter, SyncStatusRepository};
use crate::error::{Error, Result};
use crate::models::{SweepReport, SyncId, SyncOutcome, SyncRecord, SyncStatus, UserId};
use crate::util::unix_millis_now;

use super::{BackoffPolicy, SyncDispatcher};

pub struct RetryScheduler<'a, C> {
    conn: &'a Connection,
    dispatcher: SyncDispatcher<'a, C>,
    policy: &'a BackoffPolicy,
}

impl<'a, C: CrmClient> RetryScheduler<'a, C> {
    pub const fn new(
        conn: &'a Connection,
        crm: &'a C,
        deals: &'a DealDefaults,
        policy: &'a BackoffPolicy,
    ) -> Self {
        Self {
            conn,
            dispatcher: SyncDispatcher::new(conn, crm, deals),
            policy,
        }
    }

    const fn statuses(&self) -> LibSqlSyncStatusRepository<'a> {
        LibSqlSyncStatusRepository::new(self.conn)
    }

    /// Retry one record, reporting any failure in the outcome
    pub async fn retry(&self, sync_id: &SyncId) -> SyncOutcome {
        match self.try_retry(sync_id).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(
                    %sync_id,
                    %error,
                    retryable = error.is_retryable(),
                    "Retry did not succeed"
                );
                SyncOutcome::failed(error)
            }
        }
    }

    /// Retry one record, returning the typed reason when it is not retried
    /// or the re-dispatch fails.
    pub async fn try_retry(&self, sync_id: &SyncId) -> Result<SyncOutcome> {
        let record = self
            .statuses()
            .get(sync_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sync record {sync_id}")))?;
        self.retry_record(&record).await
    }

    async fn retry_record(&self, record: &SyncRecord) -> Result<SyncOutcome> {
        if !record.is_failed() {
            return Err(Error::RetryNotApplicable(record.id.to_string()));
        }

        let now = unix_millis_now();
        self.policy
            .check(record.retry_count, record.last_attempt, now)?;

        if !self.statuses().claim_retry(record, now).await? {
            return Err(Error::RetryConflict(record.id.to_string()));
        }

        let retry_count = record.retry_count + 1;
        tracing::debug!(
            sync_id = %record.id,
            entity_type = %record.entity_type,
            retry_count,
            "Retry claimed, re-dispatching"
        );

        self.dispatcher
            .sync_entity(
                &record.user_id,
                record.entity_type,
                &record.entity_id,
                retry_count,
            )
            .await
    }

    /// Retry every failed record below the retry ceiling, one at a time
    pub async fn retry_all_failed(&self) -> Result<SweepReport> {
        let failed = self
            .statuses()
            .list(&SyncRecordFilter {
                status: Some(SyncStatus::Failed),
                ..SyncRecordFilter::default()
            })
            .await?;

        let mut report = SweepReport::default();
        for record in failed {
            if record.retry_count >= self.policy.max_retries() {
                report.skipped_count += 1;
                continue;
            }

            report.processed_count += 1;
            match self.try_retry(&record.id).await {
                Ok(outcome) if outcome.success => report.succeeded_count += 1,
                Ok(_) => report.failed_count += 1,
                Err(error) => {
                    report.failed_count += 1;
                    if error.is_retryable() {
                        tracing::warn!(
                            sync_id = %record.id,
                            %error,
                            "Retry failed, will try again next sweep"
                        );
                    } else {
                        tracing::error!(
                            sync_id = %record.id,
                            %error,
                            "Retry failed permanently"
                        );
                    }
                }
            }
        }

        tracing::info!(
            processed = report.processed_count,
            succeeded = report.succeeded_count,
            failed = report.failed_count,
            skipped = report.skipped_count,
            "Sweep finished"
        );
        Ok(report)
    }

    /// Retry on behalf of `requesting_user`, who must own the record
    pub async fn manual_retry(
        &self,
        sync_id: &SyncId,
        requesting_user: &UserId,
    ) -> Result<SyncOutcome> {
        let record = self
            .statuses()
            .get(sync_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sync record {sync_id}")))?;

        if &record.user_id != requesting_user {
            return Err(Error::Authorization(format!(
                "user {requesting_user} does not own sync record {sync_id}"
            )));
        }

        Ok(self.retry(sync_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, SyncAttempt};
    use crate::models::{CrmEntityType, EntityId, EntityType};
    use crate::sync::testing::{enable_integration, seed_call, user, FakeCrm};
    use pretty_assertions::assert_eq;

    const MINUTE_MS: i64 = 60_000;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    /// Store a failed lineage for `entity_id` with the given state
    async fn seed_failed(
        db: &Database,
        owner: &UserId,
        entity_id: &EntityId,
        retry_count: u32,
        minutes_ago: i64,
    ) -> SyncRecord {
        let attempt = SyncAttempt {
            user_id: owner,
            entity_type: EntityType::Call,
            entity_id,
            crm_entity_type: CrmEntityType::Note,
            attempted_at: unix_millis_now() - minutes_ago * MINUTE_MS,
        };
        LibSqlSyncStatusRepository::new(db.connection())
            .record_failure(&attempt, retry_count, "HTTP 503")
            .await
            .unwrap()
    }

    async fn reload(db: &Database, id: &SyncId) -> SyncRecord {
        LibSqlSyncStatusRepository::new(db.connection())
            .get(id)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_retry_after_backoff_succeeds() {
        let db = setup().await;
        let rep = user("rep-1");
        enable_integration(&db, &rep).await;
        let call_id = seed_call(&db, &rep).await;
        let record = seed_failed(&db, &rep, &call_id, 1, 20).await;

        let crm = FakeCrm::default();
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        let outcome = scheduler.retry(&record.id).await;
        assert_eq!(outcome, SyncOutcome::synced("crm-1"));

        let stored = reload(&db, &record.id).await;
        assert_eq!(stored.sync_status, SyncStatus::Completed);
        assert_eq!(stored.retry_count, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_retry_before_backoff_is_rejected_without_mutation() {
        let db = setup().await;
        let rep = user("rep-1");
        enable_integration(&db, &rep).await;
        let call_id = seed_call(&db, &rep).await;
        let record = seed_failed(&db, &rep, &call_id, 1, 10).await;

        let crm = FakeCrm::default();
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        let error = scheduler.try_retry(&record.id).await.unwrap_err();
        assert!(matches!(error, Error::BackoffNotElapsed { .. }));
        assert!(!scheduler.retry(&record.id).await.success);
        assert_eq!(crm.request_count(), 0);
        assert_eq!(reload(&db, &record.id).await, record);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_exhausted_record_is_always_ineligible() {
        let db = setup().await;
        let rep = user("rep-1");
        enable_integration(&db, &rep).await;
        let call_id = seed_call(&db, &rep).await;
        let record = seed_failed(&db, &rep, &call_id, 3, 24 * 60).await;

        let crm = FakeCrm::default();
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        let error = scheduler.try_retry(&record.id).await.unwrap_err();
        assert!(matches!(error, Error::RetryExhausted { .. }));
        let outcome = scheduler.retry(&record.id).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("Retry limit reached"));
        assert_eq!(crm.request_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_retry_increments_count_and_is_reported() {
        let db = setup().await;
        let rep = user("rep-1");
        enable_integration(&db, &rep).await;
        let call_id = seed_call(&db, &rep).await;
        let record = seed_failed(&db, &rep, &call_id, 0, 6).await;

        let crm = FakeCrm::failing_once("HTTP 502");
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        let outcome = scheduler.retry(&record.id).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("HTTP 502"));

        let stored = reload(&db, &record.id).await;
        assert_eq!(stored.sync_status, SyncStatus::Failed);
        assert_eq!(stored.retry_count, 1);
        assert!(stored.last_attempt > record.last_attempt);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_record_is_not_found() {
        let db = setup().await;
        let crm = FakeCrm::default();
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        let error = scheduler.try_retry(&SyncId::new()).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
        assert!(!error.is_retryable());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_completed_record_is_not_retried() {
        let db = setup().await;
        let rep = user("rep-1");
        enable_integration(&db, &rep).await;
        let call_id = seed_call(&db, &rep).await;

        let crm = FakeCrm::default();
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let dispatcher = SyncDispatcher::new(db.connection(), &crm, &deals);
        dispatcher.sync_call(&rep, &call_id, 0).await.unwrap();
        let record = LibSqlSyncStatusRepository::new(db.connection())
            .find_by_entity(EntityType::Call, &call_id)
            .await
            .unwrap()
            .unwrap();

        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);
        let error = scheduler.try_retry(&record.id).await.unwrap_err();
        assert!(matches!(error, Error::RetryNotApplicable(_)));
        assert_eq!(crm.request_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stale_snapshot_loses_claim() {
        let db = setup().await;
        let rep = user("rep-1");
        enable_integration(&db, &rep).await;
        let call_id = seed_call(&db, &rep).await;
        let snapshot = seed_failed(&db, &rep, &call_id, 0, 30).await;

        let crm = FakeCrm::failing_once("HTTP 500");
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        // First retry wins the claim and fails again
        assert!(!scheduler.retry(&snapshot.id).await.success);

        // A concurrent caller still holding the old snapshot cannot fire
        let error = scheduler.retry_record(&snapshot).await.unwrap_err();
        assert!(matches!(error, Error::RetryConflict(_)));
        assert_eq!(crm.request_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_policy_override_changes_windows() {
        let db = setup().await;
        let rep = user("rep-1");
        enable_integration(&db, &rep).await;
        let call_id = seed_call(&db, &rep).await;
        let record = seed_failed(&db, &rep, &call_id, 0, 0).await;

        let crm = FakeCrm::default();
        let deals = DealDefaults::default();
        let policy = BackoffPolicy::new(vec![std::time::Duration::ZERO], 1).unwrap();
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        assert!(scheduler.retry(&record.id).await.success);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sweep_skips_exhausted_records() {
        let db = setup().await;
        let rep = user("rep-1");
        enable_integration(&db, &rep).await;

        // N = 5 failed records, k = 2 at the ceiling
        let mut seeded = Vec::new();
        for (retry_count, minutes_ago) in [(0, 10), (1, 20), (3, 60), (2, 5), (4, 90)] {
            let call_id = seed_call(&db, &rep).await;
            seeded.push(seed_failed(&db, &rep, &call_id, retry_count, minutes_ago).await);
        }

        let crm = FakeCrm::default();
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        let report = scheduler.retry_all_failed().await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                processed_count: 3,
                succeeded_count: 2,
                failed_count: 1,
                skipped_count: 2,
            }
        );
        // (2, 5 minutes ago) is still inside its 45 minute window
        assert_eq!(crm.request_count(), 2);
        assert_eq!(reload(&db, &seeded[3].id).await, seeded[3]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sweep_continues_past_failing_record() {
        let db = setup().await;
        let rep = user("rep-1");
        enable_integration(&db, &rep).await;
        let first = seed_call(&db, &rep).await;
        let second = seed_call(&db, &rep).await;
        seed_failed(&db, &rep, &first, 0, 10).await;
        seed_failed(&db, &rep, &second, 0, 10).await;

        let crm = FakeCrm::failing_once("HTTP 500");
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        let report = scheduler.retry_all_failed().await.unwrap();
        assert_eq!(report.processed_count, 2);
        assert_eq!(report.succeeded_count, 1);
        assert_eq!(report.failed_count, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_manual_retry_by_non_owner_is_rejected_before_mutation() {
        let db = setup().await;
        let owner = user("rep-1");
        let intruder = user("rep-2");
        enable_integration(&db, &owner).await;
        let call_id = seed_call(&db, &owner).await;
        let record = seed_failed(&db, &owner, &call_id, 0, 30).await;

        let crm = FakeCrm::default();
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        let error = scheduler
            .manual_retry(&record.id, &intruder)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Authorization(_)));
        assert_eq!(reload(&db, &record.id).await, record);
        assert_eq!(crm.request_count(), 0);

        let outcome = scheduler.manual_retry(&record.id, &owner).await.unwrap();
        assert!(outcome.success);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_manual_retry_of_missing_record_is_not_found() {
        let db = setup().await;
        let crm = FakeCrm::default();
        let (deals, policy) = (DealDefaults::default(), BackoffPolicy::default());
        let scheduler = RetryScheduler::new(db.connection(), &crm, &deals, &policy);

        let error = scheduler
            .manual_retry(&SyncId::new(), &user("rep-1"))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }
}
