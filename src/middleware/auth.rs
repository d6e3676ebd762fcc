//! Authentication middleware
//!
//! Extractor for admin-only routes: verifies the bearer JWT and checks that
//! its session has not been revoked.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthError, AuthService};
use crate::error::ApiError;

/// Authenticated admin extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub admin_id: Uuid,
    pub email: String,
    pub jti: String,
}

/// ```rust,ignore
/// async fn protected_handler(admin: AdminUser) -> impl IntoResponse {
///     format!("Hello, {}", admin.email)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = auth_service.decode_token(bearer.token())?;
        let admin_id = claims
            .admin_id()
            .map_err(|e| ApiError::from(AuthError::from(e)))?;

        auth_service.verify_session(&claims.jti).await?;

        Ok(AdminUser {
            admin_id,
            email: claims.email,
            jti: claims.jti,
        })
    }
}
