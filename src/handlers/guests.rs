use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::AdminUser;
use crate::error::ApiError;
use crate::guests::{
    ConfirmGuestsRequest, ConfirmGuestsResponse, ConfirmationStats, FamilyResponse,
    GuestListResponse, GuestService, RsvpStatus,
};
use crate::models::ApiResponse;

pub async fn get_family(
    State(service): State<Arc<GuestService>>,
    Path(phone): Path<String>,
) -> Result<Json<ApiResponse<FamilyResponse>>, ApiError> {
    let family = service.family_by_phone(&phone).await?;
    Ok(Json(ApiResponse::ok(family)))
}

pub async fn confirm_guests(
    State(service): State<Arc<GuestService>>,
    Json(request): Json<ConfirmGuestsRequest>,
) -> Result<Json<ApiResponse<ConfirmGuestsResponse>>, ApiError> {
    request.validate()?;
    let result = service.confirm_by_phone(request).await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn list_guests_by_status(
    State(service): State<Arc<GuestService>>,
    _admin: AdminUser,
    Path(status): Path<String>,
) -> Result<Json<ApiResponse<GuestListResponse>>, ApiError> {
    let status = RsvpStatus::parse(&status).ok_or_else(|| {
        ApiError::BadRequest("Status must be \"confirmed\" or \"unconfirmed\"".to_string())
    })?;
    let guests = service.list_by_status(status).await?;
    Ok(Json(ApiResponse::ok(guests)))
}

pub async fn confirmation_stats(
    State(service): State<Arc<GuestService>>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<ConfirmationStats>>, ApiError> {
    let stats = service.stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}
