//! Payment HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use super::AdminUser;
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::payments::{
    CreatePaymentRequest, CreatePaymentResponse, PaymentService, PaymentStatus, Purchase,
    PurchaseFilter, PurchaseWithGift,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftSummary {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
}

/// Poll response for the payment page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub purchase_id: i32,
    pub status: PaymentStatus,
    pub needs_update: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub gift: Option<GiftSummary>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseStatusResponse {
    pub purchase_id: i32,
    pub status: PaymentStatus,
}

impl From<Purchase> for PurchaseStatusResponse {
    fn from(purchase: Purchase) -> Self {
        Self {
            purchase_id: purchase.id,
            status: purchase.payment_status,
        }
    }
}

/// POST /api/payments/create (alias /api/payments/pix/create)
pub async fn create_payment(
    State(service): State<Arc<PaymentService>>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatePaymentResponse>>), ApiError> {
    let response = service.create_payment(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response))))
}

/// GET /api/payments/:purchase_id/status
pub async fn payment_status(
    State(service): State<Arc<PaymentService>>,
    Path(purchase_id): Path<i32>,
) -> Result<Json<ApiResponse<PaymentStatusResponse>>, ApiError> {
    let check = service.check_payment_status(purchase_id).await?;
    let PurchaseWithGift { purchase, gift } = service.get_purchase_with_gift(purchase_id).await?;

    Ok(Json(ApiResponse::ok(PaymentStatusResponse {
        purchase_id: purchase.id,
        status: purchase.payment_status,
        needs_update: check.needs_update,
        expires_at: purchase.expires_at,
        gift: gift.map(|g| GiftSummary {
            id: g.id,
            name: g.name,
            price: g.price,
        }),
        updated_at: purchase.updated_at,
    })))
}

/// POST /api/payments/:purchase_id/cancel
pub async fn cancel_payment(
    State(service): State<Arc<PaymentService>>,
    Path(purchase_id): Path<i32>,
) -> Result<Json<ApiResponse<PurchaseStatusResponse>>, ApiError> {
    let purchase = service.cancel_payment(purchase_id).await?;
    Ok(Json(ApiResponse::ok(purchase.into())))
}

/// POST /api/payments/:purchase_id/simulate - dev mode only
pub async fn simulate_payment(
    State(service): State<Arc<PaymentService>>,
    Path(purchase_id): Path<i32>,
) -> Result<Json<ApiResponse<PurchaseStatusResponse>>, ApiError> {
    let purchase = service.simulate_payment(purchase_id).await?;
    Ok(Json(ApiResponse::ok(purchase.into())))
}

/// GET /api/payments/purchases
pub async fn list_purchases(
    State(service): State<Arc<PaymentService>>,
    _admin: AdminUser,
    Query(filter): Query<PurchaseFilter>,
) -> Result<Json<ApiResponse<Vec<PurchaseWithGift>>>, ApiError> {
    let purchases = service.list_purchases(&filter).await?;
    Ok(Json(ApiResponse::ok(purchases)))
}

/// GET /api/payments/purchases/:purchase_id
pub async fn get_purchase(
    State(service): State<Arc<PaymentService>>,
    _admin: AdminUser,
    Path(purchase_id): Path<i32>,
) -> Result<Json<ApiResponse<PurchaseWithGift>>, ApiError> {
    let purchase = service.get_purchase_with_gift(purchase_id).await?;
    Ok(Json(ApiResponse::ok(purchase)))
}
