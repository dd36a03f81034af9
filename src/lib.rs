//! PinPin Cloud
//!
//! A file sharing service with per-plan storage quotas, premium activation
//! keys and a site-wide maintenance mode controlled from the admin panel.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod maintenance;
pub mod plan;
pub mod web;

pub use auth::{
    check_permission, ensure_founder, hash_password, register, register_with_role,
    require_admin, require_founder, verify_password, PasswordError, PermissionError,
    RegistrationError, RegistrationRequest, RoleResolver, UserRoleResolver,
};
pub use config::Config;
pub use db::{Database, NewUser, Role, Theme, User, UserRepository, UserUpdate};
pub use error::{PinpinError, Result};
pub use file::{BlobStore, FileRecord, FileRepository, FileService};
pub use maintenance::{
    MaintenanceConfig, MaintenanceEditor, MaintenanceMode, MaintenanceObserver, SqliteConfigStore,
};
pub use plan::{ActivationKey, PlanService, PlanType, UserPlan};
pub use web::WebServer;
