//! API handlers.

pub mod admin;
pub mod auth;
pub mod file;
pub mod maintenance;
pub mod plan;
pub mod user;

pub use admin::*;
pub use auth::*;
pub use file::*;
pub use plan::*;
pub use user::*;
