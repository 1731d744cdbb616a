//! Service layer shared by clients

mod relay;

pub use relay::RelayService;
