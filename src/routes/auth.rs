//! Authentication routes

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::middleware::login_rate_limit;
use crate::state::AppState;

/// Create authentication routes. Sign-in sits behind the login rate limiter.
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let signin = Router::new()
        .route("/auth/signin", post(auth::signin))
        .route_layer(from_fn_with_state(
            state.login_limiter.clone(),
            login_rate_limit,
        ));

    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signout", post(auth::signout))
        .route("/auth/me", get(auth::me))
        .merge(signin)
}
