pub mod actionable;
pub mod call;
pub mod common;
pub mod completions;
pub mod integration;
pub mod retry;
pub mod status;
pub mod sweep;
pub mod sync;
