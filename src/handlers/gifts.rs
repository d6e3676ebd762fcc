use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AdminUser;
use crate::error::ApiError;
use crate::gifts::{
    CreateGiftRequest, Gift, GiftPage, GiftService, GiftWithBuyers, ListGiftsQuery,
    UpdateGiftRequest,
};
use crate::models::ApiResponse;

pub async fn list_gifts(
    State(service): State<Arc<GiftService>>,
    Query(query): Query<ListGiftsQuery>,
) -> Result<Json<ApiResponse<GiftPage>>, ApiError> {
    let page = service.list(&query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_gift(
    State(service): State<Arc<GiftService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<GiftWithBuyers>>, ApiError> {
    let gift = service.get(id).await?;
    Ok(Json(ApiResponse::ok(gift)))
}

pub async fn create_gift(
    State(service): State<Arc<GiftService>>,
    _admin: AdminUser,
    Json(request): Json<CreateGiftRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Gift>>), ApiError> {
    let gift = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(gift))))
}

pub async fn update_gift(
    State(service): State<Arc<GiftService>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateGiftRequest>,
) -> Result<Json<ApiResponse<Gift>>, ApiError> {
    let gift = service.update(id, request).await?;
    Ok(Json(ApiResponse::ok(gift)))
}

pub async fn delete_gift(
    State(service): State<Arc<GiftService>>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
