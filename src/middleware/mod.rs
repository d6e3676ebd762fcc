//! Middleware: request tracing, sign-in rate limiting and admin authentication

pub mod auth;
mod rate_limiter;
mod tracing;

pub use auth::AdminUser;
pub use rate_limiter::{login_rate_limit, LoginRateLimiter};
pub use tracing::request_tracing;
