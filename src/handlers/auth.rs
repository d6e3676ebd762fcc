//! Authentication HTTP handlers

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use validator::Validate;

use super::AdminUser;
use crate::auth::{
    AdminResponse, AuthTokenResponse, ClientInfo, MeResponse, SigninRequest, SignupRequest,
};
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::state::AppState;

fn client_info(headers: &HeaderMap) -> ClientInfo {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    ClientInfo {
        ip_address,
        user_agent,
    }
}

/// POST /api/auth/signup - Create an admin account
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AdminResponse>>), ApiError> {
    req.validate()?;
    let admin = state.auth_service.signup(req).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(admin.into()))))
}

/// POST /api/auth/signin - Exchange credentials for an access token
pub async fn signin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SigninRequest>,
) -> Result<Json<ApiResponse<AuthTokenResponse>>, ApiError> {
    req.validate()?;
    let tokens = state
        .auth_service
        .signin(req, client_info(&headers))
        .await?;

    Ok(Json(ApiResponse::ok(tokens)))
}

/// POST /api/auth/signout - Revoke current session
pub async fn signout(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<StatusCode, ApiError> {
    state.auth_service.revoke_session(&admin.jti).await?;
    tracing::info!(admin_id = %admin.admin_id, "Admin signed out");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me - Current admin and session
pub async fn me(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let user = state.auth_service.get_admin(admin.admin_id).await?;
    let session = state.auth_service.verify_session(&admin.jti).await?;

    Ok(Json(ApiResponse::ok(MeResponse {
        user: user.into(),
        session,
    })))
}
