//! Route definitions for the wedding registry API

mod auth;
mod gifts;
mod guests;
mod payments;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::health::health_check;
use crate::middleware::request_tracing;
use crate::state::AppState;

pub use auth::auth_routes;
pub use gifts::gift_routes;
pub use guests::guest_routes;
pub use payments::payment_routes;

/// Full application router with state and layers applied
pub fn app_router(state: AppState, cors_allowed_origins: Option<&str>) -> Router {
    let api = Router::new()
        .merge(auth_routes(&state))
        .merge(gift_routes())
        .merge(guest_routes())
        .merge(payment_routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(axum::middleware::from_fn(request_tracing))
        .layer(configure_cors(cors_allowed_origins))
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();
    if allowed_origins.trim().is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
