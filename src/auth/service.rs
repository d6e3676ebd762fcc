//! Authentication service
//!
//! Core business logic for admin sign-up, sign-in and session management.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::jwt::{generate_access_token, verify_token, Claims, JwtError};
use super::password::{hash_password, verify_password};
use super::{Admin, AdminSession, AuthTokenResponse, ClientInfo, SigninRequest, SignupRequest};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Admin signup is closed")]
    SignupDisabled,

    #[error("Admin not found")]
    AdminNotFound,

    #[error("Session not found or revoked")]
    SessionNotFound,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::DatabaseError(e.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::TokenExpired => AuthError::TokenExpired,
            other => AuthError::TokenError(other.to_string()),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
    /// Outside production anyone may create an admin
    open_signup: bool,
}

impl AuthService {
    pub fn new(
        db_pool: PgPool,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        open_signup: bool,
    ) -> Self {
        Self {
            db_pool,
            jwt_secret,
            access_token_ttl_seconds,
            open_signup,
        }
    }

    /// Create an admin account.
    ///
    /// With closed signup only the very first admin can be created.
    pub async fn signup(&self, request: SignupRequest) -> Result<Admin, AuthError> {
        if !self.open_signup {
            let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
                .fetch_one(&self.db_pool)
                .await?;
            if admins > 0 {
                return Err(AuthError::SignupDisabled);
            }
        }

        let email = request.email.trim().to_lowercase();
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::HashingFailed(e.to_string()))?
            .map_err(|e| AuthError::HashingFailed(e.to_string()))?;

        let now = Utc::now();
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(now)
        .bind(now)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::EmailTaken)?;

        tracing::info!(admin_id = %admin.id, "Admin account created");
        Ok(admin)
    }

    /// Check credentials, open a session and issue an access token
    pub async fn signin(
        &self,
        request: SigninRequest,
        client: ClientInfo,
    ) -> Result<AuthTokenResponse, AuthError> {
        let email = request.email.trim().to_lowercase();

        let admin: Admin = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM admins
            WHERE email = $1
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        let password = request.password;
        let password_hash = admin.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| AuthError::HashingFailed(e.to_string()))?;

        if !valid {
            tracing::warn!(email = %email, "Failed admin sign-in");
            return Err(AuthError::InvalidCredentials);
        }

        let jti = Uuid::new_v4().to_string();
        let access_token =
            generate_access_token(&admin, &jti, &self.jwt_secret, self.access_token_ttl_seconds)?;

        let expires_at = Utc::now() + Duration::seconds(self.access_token_ttl_seconds);

        sqlx::query(
            r#"
            INSERT INTO admin_sessions (id, admin_id, jti, ip_address, user_agent, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(admin.id)
        .bind(&jti)
        .bind(&client.ip_address)
        .bind(&client.user_agent)
        .bind(expires_at)
        .execute(&self.db_pool)
        .await?;

        tracing::info!(admin_id = %admin.id, "Admin signed in");

        Ok(AuthTokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl_seconds,
            user: admin.into(),
        })
    }

    /// Revoke a session (signout)
    pub async fn revoke_session(&self, jti: &str) -> Result<(), AuthError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE admin_sessions
            SET revoked = TRUE, revoked_at = NOW()
            WHERE jti = $1 AND revoked = FALSE
            "#,
        )
        .bind(jti)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AuthError::SessionNotFound);
        }

        Ok(())
    }

    pub async fn get_admin(&self, admin_id: Uuid) -> Result<Admin, AuthError> {
        sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(admin_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::AdminNotFound)
    }

    /// Verify a session is valid (not revoked, not expired)
    pub async fn verify_session(&self, jti: &str) -> Result<AdminSession, AuthError> {
        sqlx::query_as(
            r#"
            SELECT id, admin_id, jti, ip_address, user_agent, expires_at, revoked, revoked_at, created_at
            FROM admin_sessions
            WHERE jti = $1 AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::SessionNotFound)
    }

    /// Decode a bearer token without touching the database
    pub fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(verify_token(token, &self.jwt_secret)?)
    }
}
