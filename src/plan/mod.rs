//! Storage plans and premium activation keys.

mod key;
mod repository;
mod service;
mod types;

pub use key::{ActivationKey, KeyFormatError, KEY_PREFIX};
pub use repository::{KeyRepository, PlanRepository};
pub use service::{PlanService, RedeemError, MAX_MINT_COUNT};
pub use types::{KeyRecord, PlanType, UserPlan};
