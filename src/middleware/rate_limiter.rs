//! Sign-in rate limiting
//!
//! Fixed window per client: the first attempt opens a window, and once
//! `max_attempts` have been made inside it further attempts are refused until
//! the window closes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::error::ApiError;

#[derive(Debug, Clone)]
struct Attempts {
    count: u32,
    reset_at: Instant,
}

/// Login attempt limiter, owned by the application state
#[derive(Clone)]
pub struct LoginRateLimiter {
    attempts: Arc<RwLock<HashMap<String, Attempts>>>,
    max_attempts: u32,
    window: Duration,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    /// Record an attempt. `Err` carries the time left until the window resets.
    pub async fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut attempts = self.attempts.write().await;

        match attempts.get_mut(key) {
            Some(entry) if now < entry.reset_at => {
                if entry.count >= self.max_attempts {
                    return Err(entry.reset_at - now);
                }
                entry.count += 1;
                Ok(())
            }
            _ => {
                attempts.insert(
                    key.to_string(),
                    Attempts {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                Ok(())
            }
        }
    }

    /// Drop entries whose window has closed; returns how many were removed
    pub async fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now()).await
    }

    async fn cleanup_at(&self, now: Instant) -> usize {
        let mut attempts = self.attempts.write().await;
        let before = attempts.len();
        attempts.retain(|_, entry| now < entry.reset_at);
        before - attempts.len()
    }

    /// Periodic eviction, runs until the runtime shuts down
    pub fn spawn_eviction(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = limiter.cleanup().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted expired login rate-limit entries");
                }
            }
        })
    }
}

/// Middleware for the sign-in route
pub async fn login_rate_limit(
    State(limiter): State<LoginRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client_key = extract_client_ip(&request);

    if let Err(retry_after) = limiter.check(&client_key).await {
        tracing::warn!(client = %client_key, "Login rate limit exceeded");
        return ApiError::TooManyRequests {
            retry_after_secs: retry_after.as_secs().max(1),
        }
        .into_response();
    }

    next.run(request).await
}

/// Extract client IP from proxy headers
pub(crate) fn extract_client_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(s) = forwarded.to_str() {
            if let Some(ip) = s.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(s) = real_ip.to_str() {
            return s.to_string();
        }
    }

    "unknown".to_string()
}
