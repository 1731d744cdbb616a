//! crmrelay-core - Core library for crmrelay
//!
//! This crate contains the models, database layer, HubSpot client and the
//! sync/retry logic used by the crmrelay CLI and any scheduler driving it.

pub mod config;
pub mod crm;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{EntityId, EntityType, SyncId, SyncOutcome, SyncStatus, UserId};
