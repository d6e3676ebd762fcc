//! Wedding gift registry backend
//!
//! Gift catalogue, guest RSVPs, admin authentication and gift purchases paid through a PIX
//! provider (AbacatePay) or a checkout provider (Mercado Pago), with provider
//! webhooks and status polls reconciled against stored purchases.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gifts;
pub mod guests;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod providers;
pub mod routes;
pub mod state;
