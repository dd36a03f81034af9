//! Web API module for PinPin.
//!
//! REST endpoints for accounts, files, plans and the admin panel, plus the
//! public maintenance status and its Server-Sent Events stream.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::{create_router, create_router_with_limits};
pub use server::WebServer;
pub use state::AppState;
