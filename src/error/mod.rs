//! Centralized API error handling
//!
//! Domain errors from the payment, gift, guest and auth services are mapped onto a
//! single [`ApiError`] with an HTTP status and a `{error: {code, message}}`
//! JSON body.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::gifts::GiftError;
use crate::guests::GuestError;
use crate::payments::PaymentError;
use crate::providers::ProviderError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Too many attempts, try again in {retry_after_secs} seconds")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Payment provider error: {0}")]
    ExternalServiceError(String),

    #[error("{0}")]
    ValidationError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TooManyRequests { .. } => "TOO_MANY_REQUESTS",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        match &self {
            ApiError::InternalError(_)
            | ApiError::DatabaseError(_)
            | ApiError::ExternalServiceError(_) => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = Json(ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
            },
        });

        match self {
            ApiError::TooManyRequests { retry_after_secs } => (
                status,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                body,
            )
                .into_response(),
            // Internal details stay in the logs
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => (
                status,
                Json(ErrorResponse {
                    error: ErrorDetails {
                        code: error_code.to_string(),
                        message: "Internal server error".to_string(),
                    },
                }),
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                ApiError::BadRequest("Referenced record does not exist".to_string())
            }
            _ => ApiError::DatabaseError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::DevModeOnly => ApiError::Forbidden(err.to_string()),
            _ => ApiError::ExternalServiceError(err.to_string()),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound(msg) => ApiError::NotFound(msg),
            PaymentError::InvalidState(msg) => ApiError::BadRequest(msg),
            PaymentError::Validation(msg) => ApiError::ValidationError(msg),
            PaymentError::Provider(e) => e.into(),
            PaymentError::Database(e) => e.into(),
        }
    }
}

impl From<GiftError> for ApiError {
    fn from(err: GiftError) -> Self {
        match err {
            GiftError::NotFound => ApiError::NotFound(err.to_string()),
            GiftError::Validation(msg) => ApiError::ValidationError(msg),
            GiftError::Conflict(msg) => ApiError::Conflict(msg),
            GiftError::Database(e) => e.into(),
        }
    }
}

impl From<GuestError> for ApiError {
    fn from(err: GuestError) -> Self {
        match err {
            GuestError::FamilyNotFound => ApiError::NotFound(err.to_string()),
            GuestError::Validation(msg) => ApiError::ValidationError(msg),
            GuestError::Database(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::TokenError(_)
            | AuthError::TokenExpired
            | AuthError::AdminNotFound => ApiError::Unauthorized(err.to_string()),
            AuthError::EmailTaken => ApiError::Conflict(err.to_string()),
            AuthError::SignupDisabled => ApiError::Forbidden(err.to_string()),
            AuthError::DatabaseError(msg) => ApiError::DatabaseError(msg),
            AuthError::HashingFailed(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            ApiError::TooManyRequests {
                retry_after_secs: 60
            }
            .error_code(),
            "TOO_MANY_REQUESTS"
        );
    }

    #[test]
    fn test_payment_error_mapping() {
        let err: ApiError = PaymentError::InvalidState("already pending".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = PaymentError::NotFound("Purchase not found".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = PaymentError::Provider(ProviderError::Api {
            status: 500,
            body: String::new(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err: ApiError = PaymentError::Provider(ProviderError::DevModeOnly).into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_auth_error_mapping() {
        let err: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err: ApiError = AuthError::EmailTaken.into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_too_many_requests_sets_retry_after() {
        let response = ApiError::TooManyRequests {
            retry_after_secs: 120,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "120");
    }
}
