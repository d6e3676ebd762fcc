//! Gift catalogue routes

use axum::{routing::get, Router};

use crate::handlers::gifts;
use crate::state::AppState;

pub fn gift_routes() -> Router<AppState> {
    Router::new()
        .route("/gifts", get(gifts::list_gifts).post(gifts::create_gift))
        .route(
            "/gifts/:id",
            get(gifts::get_gift)
                .put(gifts::update_gift)
                .delete(gifts::delete_gift),
        )
}
