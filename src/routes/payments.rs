//! Payment and webhook routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{payments, webhooks};
use crate::state::AppState;

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/create", post(payments::create_payment))
        .route("/payments/pix/create", post(payments::create_payment))
        .route("/payments/purchases", get(payments::list_purchases))
        .route("/payments/purchases/:purchase_id", get(payments::get_purchase))
        .route("/payments/:purchase_id/status", get(payments::payment_status))
        .route("/payments/:purchase_id/cancel", post(payments::cancel_payment))
        .route("/payments/:purchase_id/simulate", post(payments::simulate_payment))
        .route(
            "/payments/webhook/abacatepay",
            post(webhooks::abacatepay_webhook),
        )
        .route(
            "/payments/webhook/mercadopago",
            post(webhooks::mercadopago_webhook).get(webhooks::mercadopago_webhook_get),
        )
}
