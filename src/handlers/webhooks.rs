//! Payment provider webhooks
//!
//! Both endpoints always acknowledge with 200 once the caller is accepted, so
//! providers do not retry signals that cannot be matched. Reconciliation
//! failures are logged by the payment service.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::payments::{
    CheckoutNotificationBody, CheckoutNotificationQuery, PaymentService, PixWebhookPayload,
};
use crate::state::AppState;

const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Deserialize, Default)]
pub struct PixWebhookQuery {
    #[serde(rename = "webhookSecret")]
    pub webhook_secret: Option<String>,
}

fn secret_matches(expected: &str, provided: &str) -> bool {
    expected.len() == provided.len()
        && expected
            .bytes()
            .zip(provided.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Accept when no secret is configured, otherwise require it in the header
/// or the `webhookSecret` query parameter
fn authorize_pix_webhook(
    expected: Option<&str>,
    headers: &HeaderMap,
    query: &PixWebhookQuery,
) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|h| h.to_str().ok())
        .or(query.webhook_secret.as_deref());

    match provided {
        Some(secret) if secret_matches(expected, secret) => Ok(()),
        _ => {
            tracing::warn!("PIX webhook rejected: bad or missing secret");
            Err(ApiError::Unauthorized("Invalid webhook secret".to_string()))
        }
    }
}

/// POST /api/payments/webhook/abacatepay
pub async fn abacatepay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PixWebhookQuery>,
    body: Bytes,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    authorize_pix_webhook(state.pix_webhook_secret.as_deref(), &headers, &query)?;

    let payload: PixWebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed PIX webhook body");
            return Ok(Json(ApiResponse::ack()));
        }
    };

    tracing::info!(event = %payload.event, charge_id = %payload.data.id, "PIX webhook received");

    if let Some(outcome) = state.payment_service.handle_pix_webhook(&payload).await {
        tracing::info!(
            purchase_id = outcome.purchase_id,
            status = outcome.status.as_str(),
            "PIX webhook reconciled"
        );
    }

    Ok(Json(ApiResponse::ack()))
}

/// POST /api/payments/webhook/mercadopago
///
/// The provider may put the notification in the query string, the body or
/// both. Each form present is processed.
pub async fn mercadopago_webhook(
    State(service): State<Arc<PaymentService>>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Json<ApiResponse<()>> {
    let mut notifications = Vec::with_capacity(2);

    if let Some(n) = notification_query(query).into_notification() {
        notifications.push(n);
    }

    if !body.is_empty() {
        match serde_json::from_slice::<CheckoutNotificationBody>(&body) {
            Ok(parsed) => {
                if let Some(n) = parsed.into_notification() {
                    if !notifications.contains(&n) {
                        notifications.push(n);
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "Malformed checkout notification body"),
        }
    }

    for notification in &notifications {
        tracing::info!(kind = %notification.kind, id = %notification.id, "Checkout notification received");
        if let Some(outcome) = service.process_checkout_notification(notification).await {
            tracing::info!(
                purchase_id = outcome.purchase_id,
                status = outcome.status.as_str(),
                "Checkout notification reconciled"
            );
        }
    }

    Json(ApiResponse::ack())
}

/// GET /api/payments/webhook/mercadopago (IPN style, query string only)
pub async fn mercadopago_webhook_get(
    State(service): State<Arc<PaymentService>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<ApiResponse<()>> {
    if let Some(notification) = notification_query(query).into_notification() {
        tracing::info!(kind = %notification.kind, id = %notification.id, "Checkout IPN received");
        service.process_checkout_notification(&notification).await;
    }

    Json(ApiResponse::ack())
}

/// Lenient query parsing: unknown or repeated keys never reject the request
fn notification_query(mut query: HashMap<String, String>) -> CheckoutNotificationQuery {
    CheckoutNotificationQuery {
        topic: query.remove("topic"),
        kind: query.remove("type"),
        id: query.remove("id"),
        data_id: query.remove("data.id"),
    }
}
