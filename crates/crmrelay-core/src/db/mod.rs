//! Database layer for crmrelay

mod connection;
mod entity_repository;
mod integration_repository;
mod migrations;
mod sync_status_repository;

pub use connection::Database;
pub use entity_repository::{
    ActionableRepository, CallRepository, LibSqlActionableRepository, LibSqlCallRepository,
};
pub use integration_repository::{IntegrationRepository, LibSqlIntegrationRepository};
pub use sync_status_repository::{
    LibSqlSyncStatusRepository, SyncAttempt, SyncRecordFilter, SyncStatusRepository,
};
