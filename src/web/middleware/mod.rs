//! Middleware for Web API.

pub mod auth;
pub mod cors;
pub mod maintenance;
pub mod rate_limit;

pub use auth::{jwt_auth, AuthUser, JwtClaims, JwtState, OptionalAuthUser};
pub use cors::create_cors_layer;
pub use maintenance::{maintenance_gate, BYPASS_HEADER, NOTICE_HEADER};
pub use rate_limit::{rate_limit, Bucket, RateLimitState};
