//! Router construction with middleware.

use std::env;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use governor::{
    DefaultDirectRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;
use crate::domain::{ErrorDetail, RateLimitResponse};

use super::admin::{close_group_handler, list_all_transactions_handler, list_users_handler};
use super::groups::{
    create_group_handler, create_livestock_handler, get_group_handler, get_livestock_handler,
    join_group_handler, list_groups_handler, list_livestock_handler,
};
use super::handlers::{
    ApiDoc, health_check_handler, initialize_payment_handler, liveness_handler,
    paystack_webhook_handler, readiness_handler, verify_payment_handler,
};
use super::wallet::{
    complete_funding_handler, get_wallet_handler, list_wallet_transactions_handler,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Rate limiting configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 20,
        }
    }
}

impl RateLimitConfig {
    /// Read `RATE_LIMIT_RPS` and `RATE_LIMIT_BURST`, falling back to defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let requests_per_second = env::var("RATE_LIMIT_RPS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.requests_per_second);
        let burst_size = env::var("RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.burst_size);
        Self {
            requests_per_second,
            burst_size,
        }
    }

    fn limiter(&self) -> DefaultDirectRateLimiter {
        let rps = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(rps);
        RateLimiter::direct(Quota::per_second(rps).allow_burst(burst))
    }
}

async fn rate_limit_middleware(
    State(limiter): State<Arc<DefaultDirectRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let retry_after = not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
                .max(1);
            warn!(path = %request.uri().path(), retry_after, "Rate limit exceeded");
            let body = RateLimitResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded".to_string(),
                    details: None,
                },
                retry_after,
            };
            (
                StatusCode::TOO_MANY_REQUESTS,
                [("retry-after", retry_after.to_string())],
                Json(body),
            )
                .into_response()
        }
    }
}

/// Routes under `/api` that are subject to rate limiting
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/paystack/initialize", post(initialize_payment_handler))
        .route("/api/paystack/verify", post(verify_payment_handler))
        .route("/api/wallet", get(get_wallet_handler))
        .route(
            "/api/wallet/transactions",
            get(list_wallet_transactions_handler),
        )
        .route("/api/wallet/fund/complete", post(complete_funding_handler))
        .route(
            "/api/livestock",
            get(list_livestock_handler).post(create_livestock_handler),
        )
        .route("/api/livestock/{id}", get(get_livestock_handler))
        .route(
            "/api/groups",
            get(list_groups_handler).post(create_group_handler),
        )
        .route("/api/groups/{id}", get(get_group_handler))
        .route("/api/groups/{id}/join", post(join_group_handler))
        .route("/api/admin/users", get(list_users_handler))
        .route("/api/admin/transactions", get(list_all_transactions_handler))
        .route("/api/admin/groups/{id}/close", post(close_group_handler))
}

fn build_router(app_state: Arc<AppState>, rate_limit: Option<RateLimitConfig>) -> Router {
    let api = match rate_limit {
        Some(config) => {
            let limiter = Arc::new(config.limiter());
            api_routes().layer(middleware::from_fn_with_state(
                limiter,
                rate_limit_middleware,
            ))
        }
        None => api_routes(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        // Gateway callbacks are never throttled
        .route("/api/paystack/webhook", post(paystack_webhook_handler))
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(app_state)
}

/// Create the application router without rate limiting
pub fn create_router(app_state: Arc<AppState>) -> Router {
    build_router(app_state, None)
}

/// Create the application router with rate limiting on `/api` routes
pub fn create_router_with_rate_limit(app_state: Arc<AppState>, config: RateLimitConfig) -> Router {
    build_router(app_state, Some(config))
}
