//! Configuration management for the wedding backend
//!
//! Loads and validates configuration from environment variables, with support
//! for different environments (development, staging, production) and for the
//! two payment providers a deployment can be wired to.

use std::env;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Payment provider wired into purchase creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentProvider {
    /// PIX QR-code charges (charge-id reconciliation)
    #[default]
    AbacatePay,
    /// Checkout preferences (preference-id / external-reference reconciliation)
    MercadoPago,
}

impl PaymentProvider {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "abacatepay" | "pix" => Ok(PaymentProvider::AbacatePay),
            "mercadopago" | "checkout" => Ok(PaymentProvider::MercadoPago),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid payment provider: '{}'. Expected: abacatepay or mercadopago",
                s
            ))),
        }
    }
}

/// AbacatePay (PIX) settings
#[derive(Debug, Clone)]
pub struct AbacatePayConfig {
    pub base_url: String,
    pub api_key: String,
    pub dev_mode: bool,
    /// Shared secret expected on inbound webhooks, if set
    pub webhook_secret: Option<String>,
    /// Charge lifetime in seconds
    pub charge_expires_in: i64,
}

/// Mercado Pago (checkout preference) settings
#[derive(Debug, Clone)]
pub struct MercadoPagoConfig {
    pub base_url: String,
    pub access_token: String,
    /// Public base URL the provider posts notifications to
    pub notification_base_url: String,
    pub success_url: String,
    pub failure_url: String,
    pub pending_url: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// JWT secret for admin token signing
    pub jwt_secret: String,

    /// Access token TTL in seconds (default: 7 days)
    pub jwt_access_token_ttl_seconds: i64,

    /// Active payment provider
    pub payment_provider: PaymentProvider,

    pub abacatepay: AbacatePayConfig,

    pub mercadopago: MercadoPagoConfig,

    /// Timeout applied to every outbound provider request
    pub provider_timeout_secs: u64,

    /// Failed sign-in attempts allowed per client inside the window
    pub login_max_attempts: u32,

    /// Sign-in rate-limit window in seconds
    pub login_window_secs: u64,
}

const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3338".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 5);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
            }
            _ => DEV_JWT_SECRET.to_string(),
        };

        let jwt_access_token_ttl_seconds = parse_or("JWT_ACCESS_TOKEN_TTL_SECONDS", 7 * 24 * 3600);

        let payment_provider = env::var("PAYMENT_PROVIDER")
            .map(|s| PaymentProvider::parse(&s))
            .unwrap_or(Ok(PaymentProvider::AbacatePay))?;

        let abacatepay = AbacatePayConfig {
            base_url: env::var("ABACATEPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.abacatepay.com/v1".to_string()),
            api_key: env::var("ABACATEPAY_API_KEY").unwrap_or_default(),
            dev_mode: env::var("ABACATEPAY_DEV_MODE")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            webhook_secret: env::var("ABACATEPAY_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            charge_expires_in: parse_or("ABACATEPAY_CHARGE_EXPIRES_IN", 3600),
        };

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let mercadopago = MercadoPagoConfig {
            base_url: env::var("MERCADOPAGO_BASE_URL")
                .unwrap_or_else(|_| "https://api.mercadopago.com".to_string()),
            access_token: env::var("MERCADOPAGO_ACCESS_TOKEN").unwrap_or_default(),
            notification_base_url: env::var("MERCADOPAGO_URL_WEBHOOK").unwrap_or_default(),
            success_url: env::var("MERCADOPAGO_SUCCESS_URL")
                .unwrap_or_else(|_| format!("{}/payment/success", frontend_url)),
            failure_url: env::var("MERCADOPAGO_FAILURE_URL")
                .unwrap_or_else(|_| format!("{}/payment/failure", frontend_url)),
            pending_url: env::var("MERCADOPAGO_PENDING_URL")
                .unwrap_or_else(|_| format!("{}/payment/pending", frontend_url)),
        };

        match payment_provider {
            PaymentProvider::AbacatePay if abacatepay.api_key.is_empty() => {
                tracing::warn!("ABACATEPAY_API_KEY not set; PIX charges will be rejected by the provider");
            }
            PaymentProvider::MercadoPago if mercadopago.access_token.is_empty() => {
                tracing::warn!("MERCADOPAGO_ACCESS_TOKEN not set; checkout preferences will fail");
            }
            _ => {}
        }

        Ok(Config {
            database_url,
            environment,
            port,
            db_max_connections,
            cors_allowed_origins,
            log_level,
            jwt_secret,
            jwt_access_token_ttl_seconds,
            payment_provider,
            abacatepay,
            mercadopago,
            provider_timeout_secs: parse_or("PROVIDER_TIMEOUT_SECS", 10),
            login_max_attempts: parse_or("LOGIN_MAX_ATTEMPTS", 5),
            login_window_secs: parse_or("LOGIN_WINDOW_SECS", 15 * 60),
        })
    }

    /// Database URL with the password masked, for logging
    pub fn database_url_masked(&self) -> String {
        if let Some(at_pos) = self.database_url.find('@') {
            if let Some(colon_pos) = self.database_url[..at_pos].rfind(':') {
                // "postgres://user@host" has its only colon in the scheme
                if !self.database_url[colon_pos..].starts_with("://") {
                    let prefix = &self.database_url[..colon_pos + 1];
                    let suffix = &self.database_url[at_pos..];
                    return format!("{}****{}", prefix, suffix);
                }
            }
        }
        self.database_url.clone()
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
