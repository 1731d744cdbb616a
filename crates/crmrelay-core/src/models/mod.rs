//! Data models for crmrelay

/// Lowercase text mapping for storage enums (`as_str`, `Display`, `FromStr`).
macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(crate::Error::InvalidInput(format!(
                        concat!("unknown ", stringify!($ty), " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

mod actionable;
mod call;
mod ids;
mod integration;
mod sync_record;

pub use actionable::{Actionable, ActionableKind, ActionableStatus, Priority};
pub use call::Call;
pub use ids::{EntityId, SyncId, UserId};
pub use integration::IntegrationSettings;
pub use sync_record::{CrmEntityType, EntityType, SweepReport, SyncOutcome, SyncRecord, SyncStatus};
