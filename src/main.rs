//! Application entry point.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use farmeely_api::api::{RateLimitConfig, create_router, create_router_with_rate_limit};
use farmeely_api::app::{AppState, PaymentSettings};
use farmeely_api::infra::{PaystackGateway, PostgresClient, PostgresConfig};

const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Application configuration
struct Config {
    database_url: String,
    frontend_base_url: String,
    host: String,
    port: u16,
    enable_rate_limiting: bool,
    rate_limit_config: RateLimitConfig,
    /// Emit JSON log lines instead of human-readable ones
    json_logs: bool,
}

impl Config {
    fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;
        let frontend_base_url = env::var("FRONTEND_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let enable_rate_limiting = env::var("ENABLE_RATE_LIMITING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let json_logs = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            frontend_base_url,
            host,
            port,
            enable_rate_limiting,
            rate_limit_config: RateLimitConfig::from_env(),
            json_logs,
        })
    }
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(config.json_logs);

    info!("🐑 Farmeely API v{}", env!("CARGO_PKG_VERSION"));

    info!("📦 Initializing infrastructure...");

    let postgres_client = PostgresClient::new(&config.database_url, PostgresConfig::default())
        .await
        .context("Failed to connect to PostgreSQL")?;
    postgres_client
        .run_migrations()
        .await
        .context("Failed to apply migrations")?;
    info!("   ✓ Database connected and migrations applied");

    let gateway = PaystackGateway::from_env().context("Failed to configure Paystack")?;
    info!("   ✓ Paystack gateway configured");

    let settings = PaymentSettings::new(&config.frontend_base_url);
    info!("   ✓ Payment callback: {}", settings.callback_url);

    let app_state = Arc::new(AppState::with_settings(
        Arc::new(postgres_client),
        Arc::new(gateway),
        settings,
    ));

    let cache = Arc::clone(&app_state.verification_cache);
    let purge_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!(purged, "Purged expired verification results");
            }
        }
    });

    let router = if config.enable_rate_limiting {
        info!(
            "   ✓ Rate limiting enabled ({} rps, burst {})",
            config.rate_limit_config.requests_per_second, config.rate_limit_config.burst_size
        );
        create_router_with_rate_limit(app_state, config.rate_limit_config)
    } else {
        info!("   ○ Rate limiting disabled");
        create_router(app_state)
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Server starting on http://{}", addr);
    info!("📖 Swagger UI available at http://{}/swagger-ui", addr);
    info!("📄 OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge_task.abort();
    info!("Server shutdown complete");
    Ok(())
}
