//! CRM sync dispatch and retry scheduling

mod backoff;
mod dispatcher;
mod scheduler;

pub use backoff::{BackoffPolicy, DEFAULT_BACKOFF_MINUTES, DEFAULT_MAX_RETRIES};
pub use dispatcher::SyncDispatcher;
pub use scheduler::RetryScheduler;
