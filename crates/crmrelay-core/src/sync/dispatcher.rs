//! Sync dispatcher: one CRM create call per invocation, outcome recorded on
//! the entity's sync-status record.

use libsql::Connection;

use crate::crm::{note_for_call, request_for_actionable, CrmClient, CrmRequest, DealDefaults};
use crate::db::{
    ActionableRepository, CallRepository, IntegrationRepository, LibSqlActionableRepository,
    LibSqlCallRepository, LibSqlIntegrationRepository, LibSqlSyncStatusRepository, SyncAttempt,
    SyncStatusRepository,
};
use crate::error::{Error, Result};
use crate::models::{EntityId, EntityType, SyncOutcome, UserId};
use crate::util::unix_millis_now;

pub struct SyncDispatcher<'a, C> {
    conn: &'a Connection,
    crm: &'a C,
    deals: &'a DealDefaults,
}

impl<'a, C: CrmClient> SyncDispatcher<'a, C> {
    pub const fn new(conn: &'a Connection, crm: &'a C, deals: &'a DealDefaults) -> Self {
        Self { conn, crm, deals }
    }

    /// Sync any entity, selecting the mapping by entity type
    pub async fn sync_entity(
        &self,
        user: &UserId,
        entity_type: EntityType,
        entity_id: &EntityId,
        retry_count: u32,
    ) -> Result<SyncOutcome> {
        match entity_type {
            EntityType::Call => self.sync_call(user, entity_id, retry_count).await,
            EntityType::Actionable => self.sync_actionable(user, entity_id, retry_count).await,
        }
    }

    /// Relay a call as a HubSpot note
    pub async fn sync_call(
        &self,
        user: &UserId,
        call_id: &EntityId,
        retry_count: u32,
    ) -> Result<SyncOutcome> {
        let api_key = self.load_api_key(user).await?;
        let call = LibSqlCallRepository::new(self.conn)
            .get(call_id)
            .await?
            .filter(|call| &call.user_id == user)
            .ok_or_else(|| Error::NotFound(format!("call {call_id}")))?;

        let request = CrmRequest::Note(note_for_call(&call));
        let crm_id = self
            .dispatch(user, EntityType::Call, call_id, &api_key, &request, retry_count)
            .await?;
        Ok(SyncOutcome::synced(crm_id))
    }

    /// Relay an actionable as a HubSpot task or deal, then write the CRM ID back
    pub async fn sync_actionable(
        &self,
        user: &UserId,
        actionable_id: &EntityId,
        retry_count: u32,
    ) -> Result<SyncOutcome> {
        let api_key = self.load_api_key(user).await?;
        let actionables = LibSqlActionableRepository::new(self.conn);
        let actionable = actionables
            .get(actionable_id)
            .await?
            .filter(|actionable| &actionable.user_id == user)
            .ok_or_else(|| Error::NotFound(format!("actionable {actionable_id}")))?;

        let request = request_for_actionable(&actionable, self.deals, unix_millis_now());
        let crm_id = self
            .dispatch(
                user,
                EntityType::Actionable,
                actionable_id,
                &api_key,
                &request,
                retry_count,
            )
            .await?;

        // The sync-status record already holds the CRM ID, so the outcome
        // stays successful even when the write-back fails.
        if let Err(error) = actionables
            .mark_synced(actionable_id, &crm_id, unix_millis_now())
            .await
        {
            tracing::error!(
                %actionable_id,
                crm_entity_id = %crm_id,
                %error,
                "Synced to HubSpot but CRM ID could not be written back"
            );
        }
        Ok(SyncOutcome::synced(crm_id))
    }

    async fn load_api_key(&self, user: &UserId) -> Result<String> {
        let settings = LibSqlIntegrationRepository::new(self.conn)
            .get(user)
            .await?
            .ok_or_else(|| {
                Error::Configuration(format!("HubSpot integration is not set up for user {user}"))
            })?;
        settings.usable_api_key().map(str::to_string)
    }

    async fn dispatch(
        &self,
        user: &UserId,
        entity_type: EntityType,
        entity_id: &EntityId,
        api_key: &str,
        request: &CrmRequest,
        retry_count: u32,
    ) -> Result<String> {
        let statuses = LibSqlSyncStatusRepository::new(self.conn);
        let attempt = SyncAttempt {
            user_id: user,
            entity_type,
            entity_id,
            crm_entity_type: request.crm_entity_type(),
            attempted_at: unix_millis_now(),
        };

        match self.crm.create(api_key, request).await {
            Ok(crm_id) => {
                if let Err(error) = statuses.record_success(&attempt, &crm_id).await {
                    // Nothing ties the CRM object to this entity now; a later
                    // sync will create a duplicate.
                    tracing::error!(
                        %entity_type,
                        %entity_id,
                        crm_entity_id = %crm_id,
                        %error,
                        "CRM object created but sync status could not be recorded"
                    );
                    return Err(error);
                }
                tracing::info!(
                    %entity_type,
                    %entity_id,
                    crm_entity_type = %attempt.crm_entity_type,
                    crm_entity_id = %crm_id,
                    "Synced to HubSpot"
                );
                Ok(crm_id)
            }
            Err(error) => {
                let message = match &error {
                    Error::ExternalService(message) => message.clone(),
                    other => other.to_string(),
                };
                statuses
                    .record_failure(&attempt, retry_count, &message)
                    .await?;
                tracing::warn!(
                    %entity_type,
                    %entity_id,
                    retry_count,
                    error = %message,
                    "HubSpot sync failed"
                );
                Err(error)
            }
        }
    }
}
