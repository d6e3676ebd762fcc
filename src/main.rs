//! Wedding registry API server

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use wedding_server::auth::AuthService;
use wedding_server::config::Config;
use wedding_server::db;
use wedding_server::gifts::GiftService;
use wedding_server::guests::GuestService;
use wedding_server::middleware::LoginRateLimiter;
use wedding_server::payments::store::PgPurchaseStore;
use wedding_server::payments::PaymentService;
use wedding_server::providers::{AbacatePayClient, MercadoPagoClient};
use wedding_server::routes;
use wedding_server::state::AppState;

const RATE_LIMIT_EVICTION_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    if let Err(e) = run(config).await {
        tracing::error!(error = %format!("{:#}", e), "Server failed");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        environment = config.environment.as_str(),
        provider = ?config.payment_provider,
        database = %config.database_url_masked(),
        "Starting wedding registry server"
    );

    let db_pool = db::connect(&config)
        .await
        .context("failed to initialise database")?;

    let pix = AbacatePayClient::new(&config.abacatepay, config.provider_timeout_secs)
        .context("failed to build AbacatePay client")?;
    let checkout = MercadoPagoClient::new(&config.mercadopago, config.provider_timeout_secs)
        .context("failed to build Mercado Pago client")?;

    let payment_service = Arc::new(PaymentService::new(
        Arc::new(PgPurchaseStore::new(db_pool.clone())),
        Arc::new(pix),
        Arc::new(checkout),
        config.payment_provider,
        config.abacatepay.charge_expires_in,
    ));
    let gift_service = Arc::new(GiftService::new(db_pool.clone()));
    let guest_service = Arc::new(GuestService::new(db_pool.clone()));
    let auth_service = Arc::new(AuthService::new(
        db_pool.clone(),
        config.jwt_secret.clone(),
        config.jwt_access_token_ttl_seconds,
        !config.environment.is_production(),
    ));

    let login_limiter = LoginRateLimiter::new(
        config.login_max_attempts,
        Duration::from_secs(config.login_window_secs),
    );
    login_limiter.spawn_eviction(RATE_LIMIT_EVICTION_INTERVAL);

    let app_state = AppState::new(
        db_pool,
        payment_service,
        gift_service,
        guest_service,
        auth_service,
        login_limiter,
        config.abacatepay.webhook_secret.clone(),
    );

    let app = routes::app_router(app_state, config.cors_allowed_origins.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
