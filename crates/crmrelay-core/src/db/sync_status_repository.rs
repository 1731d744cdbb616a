//! Sync-status repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT and counters

use crate::error::{Error, Result};
use crate::models::{
    CrmEntityType, EntityId, EntityType, SyncId, SyncRecord, SyncStatus, UserId,
};
use libsql::{Connection, Row};

use super::entity_repository::{parse_entity_id, parse_user_id};

const SELECT_COLUMNS: &str = "SELECT id, user_id, entity_type, entity_id, crm_entity_type,
    crm_entity_id, sync_status, retry_count, last_attempt, error_message, created_at, updated_at
    FROM sync_status";

/// One dispatch attempt to persist onto a lineage
#[derive(Debug, Clone)]
pub struct SyncAttempt<'a> {
    pub user_id: &'a UserId,
    pub entity_type: EntityType,
    pub entity_id: &'a EntityId,
    pub crm_entity_type: CrmEntityType,
    pub attempted_at: i64,
}

/// Filter for listing sync records
#[derive(Debug, Clone, Default)]
pub struct SyncRecordFilter {
    pub status: Option<SyncStatus>,
    pub user_id: Option<UserId>,
    pub limit: Option<usize>,
}

/// Trait for sync-status storage operations
#[allow(async_fn_in_trait)]
pub trait SyncStatusRepository {
    /// Get a record by ID
    async fn get(&self, id: &SyncId) -> Result<Option<SyncRecord>>;

    /// Get the lineage record of an entity
    async fn find_by_entity(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<SyncRecord>>;

    /// Record a successful attempt: completed, retry count reset to 0
    async fn record_success(&self, attempt: &SyncAttempt<'_>, crm_entity_id: &str)
        -> Result<SyncRecord>;

    /// Record a failed attempt with the given retry count and error
    async fn record_failure(
        &self,
        attempt: &SyncAttempt<'_>,
        retry_count: u32,
        error_message: &str,
    ) -> Result<SyncRecord>;

    /// Atomically increment the retry count if the record is still failed and
    /// unchanged since it was read. Returns false when another caller won.
    async fn claim_retry(&self, observed: &SyncRecord, claimed_at: i64) -> Result<bool>;

    /// List records matching the filter, oldest first
    async fn list(&self, filter: &SyncRecordFilter) -> Result<Vec<SyncRecord>>;
}

/// libSQL implementation of `SyncStatusRepository`
pub struct LibSqlSyncStatusRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSyncStatusRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_record(row: &Row) -> Result<SyncRecord> {
        let id: String = row.get(0)?;
        let retry_count: i64 = row.get(7)?;
        Ok(SyncRecord {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid sync id '{id}'")))?,
            user_id: parse_user_id(&row.get::<String>(1)?)?,
            entity_type: row.get::<String>(2)?.parse()?,
            entity_id: parse_entity_id(&row.get::<String>(3)?)?,
            crm_entity_type: row.get::<String>(4)?.parse()?,
            crm_entity_id: row.get(5)?,
            sync_status: row.get::<String>(6)?.parse()?,
            retry_count: u32::try_from(retry_count)
                .map_err(|_| Error::Database(format!("invalid retry_count {retry_count}")))?,
            last_attempt: row.get(8)?,
            error_message: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    async fn upsert(
        &self,
        attempt: &SyncAttempt<'_>,
        status: SyncStatus,
        crm_entity_id: Option<&str>,
        retry_count: u32,
        error_message: Option<&str>,
    ) -> Result<SyncRecord> {
        self.conn
            .execute(
                "INSERT INTO sync_status (id, user_id, entity_type, entity_id, crm_entity_type,
                    crm_entity_id, sync_status, retry_count, last_attempt, error_message,
                    created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(entity_type, entity_id) DO UPDATE SET
                    user_id = excluded.user_id,
                    crm_entity_type = excluded.crm_entity_type,
                    crm_entity_id = excluded.crm_entity_id,
                    sync_status = excluded.sync_status,
                    retry_count = excluded.retry_count,
                    last_attempt = excluded.last_attempt,
                    error_message = excluded.error_message,
                    updated_at = excluded.updated_at",
                libsql::params![
                    SyncId::new().as_str(),
                    attempt.user_id.as_str(),
                    attempt.entity_type.as_str(),
                    attempt.entity_id.as_str(),
                    attempt.crm_entity_type.as_str(),
                    crm_entity_id,
                    status.as_str(),
                    i64::from(retry_count),
                    attempt.attempted_at,
                    error_message,
                    attempt.attempted_at,
                    attempt.attempted_at
                ],
            )
            .await?;

        self.find_by_entity(attempt.entity_type, attempt.entity_id)
            .await?
            .ok_or_else(|| {
                Error::Database(format!(
                    "sync record for {} {} vanished after write",
                    attempt.entity_type, attempt.entity_id
                ))
            })
    }

    async fn collect(&self, mut rows: libsql::Rows) -> Result<Vec<SyncRecord>> {
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }
}

impl SyncStatusRepository for LibSqlSyncStatusRepository<'_> {
    async fn get(&self, id: &SyncId) -> Result<Option<SyncRecord>> {
        let mut rows = self
            .conn
            .query(&format!("{SELECT_COLUMNS} WHERE id = ?"), [id.as_str()])
            .await?;

        match rows.next().await? {
            Some(row) => Self::parse_record(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn find_by_entity(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<SyncRecord>> {
        let mut rows = self
            .conn
            .query(
                &format!("{SELECT_COLUMNS} WHERE entity_type = ? AND entity_id = ?"),
                libsql::params![entity_type.as_str(), entity_id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::parse_record(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn record_success(
        &self,
        attempt: &SyncAttempt<'_>,
        crm_entity_id: &str,
    ) -> Result<SyncRecord> {
        self.upsert(attempt, SyncStatus::Completed, Some(crm_entity_id), 0, None)
            .await
    }

    async fn record_failure(
        &self,
        attempt: &SyncAttempt<'_>,
        retry_count: u32,
        error_message: &str,
    ) -> Result<SyncRecord> {
        self.upsert(
            attempt,
            SyncStatus::Failed,
            None,
            retry_count,
            Some(error_message),
        )
        .await
    }

    async fn claim_retry(&self, observed: &SyncRecord, claimed_at: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE sync_status
                 SET retry_count = retry_count + 1, last_attempt = ?, updated_at = ?
                 WHERE id = ? AND sync_status = 'failed' AND retry_count = ? AND last_attempt IS ?",
                libsql::params![
                    claimed_at,
                    claimed_at,
                    observed.id.as_str(),
                    i64::from(observed.retry_count),
                    observed.last_attempt
                ],
            )
            .await?;

        Ok(rows == 1)
    }

    async fn list(&self, filter: &SyncRecordFilter) -> Result<Vec<SyncRecord>> {
        let limit = filter.limit.map_or(-1, |limit| limit as i64);
        let rows = self
            .conn
            .query(
                &format!(
                    "{SELECT_COLUMNS}
                     WHERE (?1 IS NULL OR sync_status = ?1) AND (?2 IS NULL OR user_id = ?2)
                     ORDER BY created_at ASC, rowid ASC
                     LIMIT ?3"
                ),
                libsql::params![
                    filter.status.map(SyncStatus::as_str),
                    filter.user_id.as_ref().map(|user| user.as_str().to_string()),
                    limit
                ],
            )
            .await?;

        self.collect(rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn attempt<'a>(user: &'a UserId, entity: &'a EntityId, at: i64) -> SyncAttempt<'a> {
        SyncAttempt {
            user_id: user,
            entity_type: EntityType::Call,
            entity_id: entity,
            crm_entity_type: CrmEntityType::Note,
            attempted_at: at,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_then_success_reuses_record() {
        let db = setup().await;
        let repo = LibSqlSyncStatusRepository::new(db.connection());
        let user = UserId::new("rep-1").unwrap();
        let entity = EntityId::new();

        let failed = repo
            .record_failure(&attempt(&user, &entity, 100), 2, "HTTP 502")
            .await
            .unwrap();
        assert_eq!(failed.sync_status, SyncStatus::Failed);
        assert_eq!(failed.retry_count, 2);
        assert_eq!(failed.error_message.as_deref(), Some("HTTP 502"));
        assert_eq!(failed.last_attempt, Some(100));

        let completed = repo
            .record_success(&attempt(&user, &entity, 200), "555")
            .await
            .unwrap();
        assert_eq!(completed.id, failed.id);
        assert_eq!(completed.sync_status, SyncStatus::Completed);
        assert_eq!(completed.retry_count, 0);
        assert_eq!(completed.crm_entity_id.as_deref(), Some("555"));
        assert_eq!(completed.error_message, None);
        assert_eq!(completed.created_at, 100);

        let fetched = repo.get(&failed.id).await.unwrap().unwrap();
        assert_eq!(fetched, completed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_claim_retry_is_compare_and_swap() {
        let db = setup().await;
        let repo = LibSqlSyncStatusRepository::new(db.connection());
        let user = UserId::new("rep-1").unwrap();
        let entity = EntityId::new();

        let record = repo
            .record_failure(&attempt(&user, &entity, 100), 0, "timeout")
            .await
            .unwrap();

        assert!(repo.claim_retry(&record, 500).await.unwrap());
        // Second claimant read the same snapshot and must lose
        assert!(!repo.claim_retry(&record, 501).await.unwrap());

        let claimed = repo.get(&record.id).await.unwrap().unwrap();
        assert_eq!(claimed.retry_count, 1);
        assert_eq!(claimed.last_attempt, Some(500));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_claim_retry_rejects_completed_record() {
        let db = setup().await;
        let repo = LibSqlSyncStatusRepository::new(db.connection());
        let user = UserId::new("rep-1").unwrap();
        let entity = EntityId::new();

        let record = repo
            .record_success(&attempt(&user, &entity, 100), "1")
            .await
            .unwrap();
        assert!(!repo.claim_retry(&record, 200).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_filters_by_status_and_user() {
        let db = setup().await;
        let repo = LibSqlSyncStatusRepository::new(db.connection());
        let alice = UserId::new("alice").unwrap();
        let bob = UserId::new("bob").unwrap();
        let (e1, e2, e3) = (EntityId::new(), EntityId::new(), EntityId::new());

        repo.record_failure(&attempt(&alice, &e1, 1), 0, "x")
            .await
            .unwrap();
        repo.record_success(&attempt(&alice, &e2, 2), "9")
            .await
            .unwrap();
        repo.record_failure(&attempt(&bob, &e3, 3), 1, "y")
            .await
            .unwrap();

        let failed = repo
            .list(&SyncRecordFilter {
                status: Some(SyncStatus::Failed),
                ..SyncRecordFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(
            failed.iter().map(|r| r.entity_id).collect::<Vec<_>>(),
            vec![e1, e3]
        );

        let alice_records = repo
            .list(&SyncRecordFilter {
                user_id: Some(alice),
                limit: Some(1),
                ..SyncRecordFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(alice_records.len(), 1);
        assert_eq!(alice_records[0].entity_id, e1);

        assert_eq!(repo.list(&SyncRecordFilter::default()).await.unwrap().len(), 3);
    }
}
