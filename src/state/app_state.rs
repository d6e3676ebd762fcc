//! Application state shared across handlers

use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::gifts::GiftService;
use crate::guests::GuestService;
use crate::middleware::LoginRateLimiter;
use crate::payments::PaymentService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub payment_service: Arc<PaymentService>,
    pub gift_service: Arc<GiftService>,
    pub guest_service: Arc<GuestService>,
    pub auth_service: Arc<AuthService>,
    pub login_limiter: LoginRateLimiter,
    /// Shared secret for the PIX webhook, if configured
    pub pix_webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(
        db_pool: PgPool,
        payment_service: Arc<PaymentService>,
        gift_service: Arc<GiftService>,
        guest_service: Arc<GuestService>,
        auth_service: Arc<AuthService>,
        login_limiter: LoginRateLimiter,
        pix_webhook_secret: Option<String>,
    ) -> Self {
        Self {
            db_pool,
            payment_service,
            gift_service,
            guest_service,
            auth_service,
            login_limiter,
            pix_webhook_secret,
        }
    }
}

impl FromRef<AppState> for Arc<PaymentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_service.clone()
    }
}

impl FromRef<AppState> for Arc<GiftService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.gift_service.clone()
    }
}

impl FromRef<AppState> for Arc<GuestService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.guest_service.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for LoginRateLimiter {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.login_limiter.clone()
    }
}
