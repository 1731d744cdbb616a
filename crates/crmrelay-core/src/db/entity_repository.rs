//! Call and actionable repositories

use crate::error::{Error, Result};
use crate::models::{Actionable, Call, EntityId, UserId};
use libsql::{Connection, Row};

/// Trait for call storage operations
#[allow(async_fn_in_trait)]
pub trait CallRepository {
    /// Store a new call
    async fn create(&self, call: &Call) -> Result<()>;

    /// Get a call by ID
    async fn get(&self, id: &EntityId) -> Result<Option<Call>>;
}

/// Trait for actionable storage operations
#[allow(async_fn_in_trait)]
pub trait ActionableRepository {
    /// Store a new actionable
    async fn create(&self, actionable: &Actionable) -> Result<()>;

    /// Get an actionable by ID
    async fn get(&self, id: &EntityId) -> Result<Option<Actionable>>;

    /// Write the CRM object ID back onto the actionable
    async fn mark_synced(&self, id: &EntityId, crm_id: &str, synced_at: i64) -> Result<()>;
}

/// libSQL implementation of `CallRepository`
pub struct LibSqlCallRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlCallRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_call(row: &Row) -> Result<Call> {
        Ok(Call {
            id: parse_entity_id(&row.get::<String>(0)?)?,
            user_id: parse_user_id(&row.get::<String>(1)?)?,
            title: row.get(2)?,
            transcription: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl CallRepository for LibSqlCallRepository<'_> {
    async fn create(&self, call: &Call) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO calls (id, user_id, title, transcription, created_at) VALUES (?, ?, ?, ?, ?)",
                libsql::params![
                    call.id.as_str(),
                    call.user_id.as_str(),
                    call.title.as_str(),
                    call.transcription.clone(),
                    call.created_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &EntityId) -> Result<Option<Call>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, title, transcription, created_at FROM calls WHERE id = ?",
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::parse_call(&row).map(Some),
            None => Ok(None),
        }
    }
}

/// libSQL implementation of `ActionableRepository`
pub struct LibSqlActionableRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlActionableRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_actionable(row: &Row) -> Result<Actionable> {
        let call_id = row
            .get::<Option<String>>(2)?
            .map(|value| parse_entity_id(&value))
            .transpose()?;

        Ok(Actionable {
            id: parse_entity_id(&row.get::<String>(0)?)?,
            user_id: parse_user_id(&row.get::<String>(1)?)?,
            call_id,
            kind: row.get::<String>(3)?.parse()?,
            title: row.get(4)?,
            description: row.get(5)?,
            due_date: row.get(6)?,
            priority: row.get::<String>(7)?.parse()?,
            status: row.get::<String>(8)?.parse()?,
            amount: row.get(9)?,
            crm_id: row.get(10)?,
            synced_at: row.get(11)?,
            created_at: row.get(12)?,
        })
    }
}

impl ActionableRepository for LibSqlActionableRepository<'_> {
    async fn create(&self, actionable: &Actionable) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO actionables (id, user_id, call_id, kind, title, description, due_date,
                    priority, status, amount, crm_id, synced_at, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                libsql::params![
                    actionable.id.as_str(),
                    actionable.user_id.as_str(),
                    actionable.call_id.map(|id| id.as_str()),
                    actionable.kind.as_str(),
                    actionable.title.as_str(),
                    actionable.description.clone(),
                    actionable.due_date,
                    actionable.priority.as_str(),
                    actionable.status.as_str(),
                    actionable.amount,
                    actionable.crm_id.clone(),
                    actionable.synced_at,
                    actionable.created_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &EntityId) -> Result<Option<Actionable>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, call_id, kind, title, description, due_date, priority, status,
                    amount, crm_id, synced_at, created_at
                 FROM actionables WHERE id = ?",
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::parse_actionable(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn mark_synced(&self, id: &EntityId, crm_id: &str, synced_at: i64) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE actionables SET crm_id = ?, synced_at = ? WHERE id = ?",
                libsql::params![crm_id, synced_at, id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("actionable {id}")));
        }
        Ok(())
    }
}

pub(super) fn parse_entity_id(value: &str) -> Result<EntityId> {
    value
        .parse()
        .map_err(|_| Error::Database(format!("invalid entity id '{value}'")))
}

pub(super) fn parse_user_id(value: &str) -> Result<UserId> {
    UserId::new(value).ok_or_else(|| Error::Database("empty user id".into()))
}
