//! Guest list and RSVP routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::guests;
use crate::state::AppState;

pub fn guest_routes() -> Router<AppState> {
    Router::new()
        .route("/guests/family/:phone", get(guests::get_family))
        .route("/guests/confirm", post(guests::confirm_guests))
        .route("/guests/stats/overview", get(guests::confirmation_stats))
        .route("/guests/:status", get(guests::list_guests_by_status))
}
