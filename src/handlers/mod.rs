//! API handlers

pub mod auth;
pub mod gifts;
pub mod guests;
pub mod health;
pub mod payments;
pub mod webhooks;

pub use crate::middleware::AdminUser;
