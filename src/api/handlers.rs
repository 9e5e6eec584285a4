//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::app::AppState;
use crate::domain::validation::{initialize_payment_validation, verify_payment_validation};
use crate::domain::{
    AppError, DatabaseError, ErrorDetail, ErrorResponse, FieldViolation, GatewayError,
    GroupError, HealthResponse, HealthStatus, InitializePaymentRequest, InitializePaymentResponse,
    PaymentCustomer, PaymentFailureResponse, RateLimitResponse, ValidationError,
    VerificationResult, VerifyPaymentRequest, VerifyPaymentResponse, WalletError,
};

/// Header carrying the gateway's HMAC-SHA512 webhook signature
pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Farmeely API",
        version = "0.1.0",
        description = "Group livestock investment backend: wallet funding through Paystack, investment groups and administration",
        license(
            name = "MIT"
        )
    ),
    paths(
        initialize_payment_handler,
        verify_payment_handler,
        paystack_webhook_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
        super::wallet::get_wallet_handler,
        super::wallet::list_wallet_transactions_handler,
        super::wallet::complete_funding_handler,
        super::groups::list_livestock_handler,
        super::groups::get_livestock_handler,
        super::groups::create_livestock_handler,
        super::groups::list_groups_handler,
        super::groups::get_group_handler,
        super::groups::create_group_handler,
        super::groups::join_group_handler,
        super::admin::list_users_handler,
        super::admin::list_all_transactions_handler,
        super::admin::close_group_handler,
    ),
    components(
        schemas(
            InitializePaymentRequest,
            InitializePaymentResponse,
            crate::domain::InitializePaymentData,
            VerifyPaymentRequest,
            VerifyPaymentResponse,
            VerificationResult,
            PaymentCustomer,
            PaymentFailureResponse,
            crate::domain::CompleteFundingRequest,
            crate::domain::FundingReceipt,
            crate::domain::Wallet,
            crate::domain::WalletTransaction,
            crate::domain::WalletTransactionKind,
            crate::domain::PaginatedResponse<crate::domain::WalletTransaction>,
            crate::domain::Livestock,
            crate::domain::CreateLivestockRequest,
            crate::domain::Group,
            crate::domain::GroupStatus,
            crate::domain::GroupDetails,
            crate::domain::GroupMembership,
            crate::domain::CreateGroupRequest,
            crate::domain::JoinGroupRequest,
            crate::domain::JoinGroupReceipt,
            crate::domain::PaginatedResponse<crate::domain::Group>,
            crate::domain::User,
            crate::domain::UserRole,
            crate::domain::PaginatedResponse<crate::domain::User>,
            crate::domain::PaginationParams,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
            ErrorDetail,
            FieldViolation,
            RateLimitResponse,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "payments", description = "Paystack payment initialization, verification and webhooks"),
        (name = "wallet", description = "Wallet balance, ledger and funding completion"),
        (name = "groups", description = "Livestock listings and investment groups"),
        (name = "admin", description = "Administrator endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` session-token scheme referenced by protected paths
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// Which payment route produced a failure; each has its own envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRoute {
    Initialize,
    Verify,
}

/// Error returned by the payment routes, rendered as `{status, message, data}`
#[derive(Debug)]
pub struct PaymentRouteError {
    pub route: PaymentRoute,
    pub error: AppError,
}

impl PaymentRouteError {
    fn initialize(error: impl Into<AppError>) -> Self {
        Self {
            route: PaymentRoute::Initialize,
            error: error.into(),
        }
    }

    fn verify(error: impl Into<AppError>) -> Self {
        Self {
            route: PaymentRoute::Verify,
            error: error.into(),
        }
    }
}

impl IntoResponse for PaymentRouteError {
    fn into_response(self) -> Response {
        let (status, body) = match (self.route, self.error) {
            (_, AppError::Validation(e)) => (
                StatusCode::BAD_REQUEST,
                PaymentFailureResponse::error(e.to_string()),
            ),
            (_, AppError::Deserialization(message)) => (
                StatusCode::BAD_REQUEST,
                PaymentFailureResponse::error(message),
            ),
            (PaymentRoute::Initialize, AppError::Gateway(GatewayError::Declined(message))) => {
                warn!(message = %message, "Payment initialization declined");
                (StatusCode::BAD_REQUEST, PaymentFailureResponse::error(message))
            }
            (
                PaymentRoute::Verify,
                AppError::Gateway(GatewayError::NotSuccessful { message, data, .. }),
            ) => (
                StatusCode::BAD_REQUEST,
                PaymentFailureResponse::failed(message, data),
            ),
            (PaymentRoute::Verify, AppError::Gateway(GatewayError::Declined(message))) => (
                StatusCode::BAD_REQUEST,
                PaymentFailureResponse::failed(message, None),
            ),
            (PaymentRoute::Initialize, e) => {
                error!(error = %e, "Payment initialization failed");
                (
                    StatusCode::BAD_GATEWAY,
                    PaymentFailureResponse::error("Failed to initialize payment"),
                )
            }
            (PaymentRoute::Verify, e) => {
                error!(error = %e, "Payment verification failed");
                (
                    StatusCode::BAD_GATEWAY,
                    PaymentFailureResponse::error("Failed to verify payment"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Initialize a wallet funding payment
///
/// Converts the naira amount to kobo and opens a Paystack transaction whose
/// callback returns the customer to `/dashboard/wallet/verify`.
#[utoipa::path(
    post,
    path = "/api/paystack/initialize",
    tag = "payments",
    request_body = InitializePaymentRequest,
    responses(
        (status = 200, description = "Transaction opened", body = InitializePaymentResponse),
        (status = 400, description = "Invalid input or declined by the gateway", body = PaymentFailureResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse),
        (status = 502, description = "Gateway unreachable or returned an unexpected response", body = PaymentFailureResponse)
    )
)]
pub async fn initialize_payment_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<InitializePaymentResponse>, PaymentRouteError> {
    let Json(payload) = payload
        .map_err(|e| PaymentRouteError::initialize(AppError::Deserialization(e.body_text())))?;
    let request = initialize_payment_validation(&payload)
        .into_result()
        .map_err(PaymentRouteError::initialize)?;

    let data = state
        .service
        .initialize_payment(&request)
        .await
        .map_err(PaymentRouteError::initialize)?;
    Ok(Json(InitializePaymentResponse::success(data)))
}

/// Verify a payment by reference
///
/// Succeeds only when Paystack reports the transaction as `success`; the
/// amount is returned in naira.
#[utoipa::path(
    post,
    path = "/api/paystack/verify",
    tag = "payments",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment confirmed", body = VerifyPaymentResponse),
        (status = 400, description = "Payment not successful or invalid input", body = PaymentFailureResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse),
        (status = 502, description = "Gateway unreachable or returned an unexpected response", body = PaymentFailureResponse)
    )
)]
pub async fn verify_payment_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<VerifyPaymentResponse>, PaymentRouteError> {
    let Json(payload) = payload
        .map_err(|e| PaymentRouteError::verify(AppError::Deserialization(e.body_text())))?;
    let request = verify_payment_validation(&payload)
        .into_result()
        .map_err(PaymentRouteError::verify)?;

    let result = state
        .service
        .verify_payment(&request.reference)
        .await
        .map_err(PaymentRouteError::verify)?;
    Ok(Json(VerifyPaymentResponse::success(result)))
}

/// Paystack webhook
///
/// Authenticated by the `x-paystack-signature` header. `charge.success`
/// events are re-verified and credited at most once per reference.
#[utoipa::path(
    post,
    path = "/api/paystack/webhook",
    tag = "payments",
    request_body(content = String, description = "Raw Paystack event JSON", content_type = "application/json"),
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Malformed event", body = ErrorResponse),
        (status = 401, description = "Missing or invalid signature", body = ErrorResponse)
    )
)]
pub async fn paystack_webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(PAYSTACK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let receipt = state
        .service
        .process_paystack_webhook(&body, signature)
        .await?;

    match receipt {
        Some(receipt) => info!(
            reference = %receipt.reference,
            already_credited = receipt.already_credited,
            "Paystack webhook processed"
        ),
        None => info!("Paystack webhook acknowledged"),
    }

    Ok(StatusCode::OK)
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Application is not ready")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.service.health_check().await;
    match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            AppError::Database(db_err) => match db_err {
                DatabaseError::Connection(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "database_error")
                }
                DatabaseError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                DatabaseError::Duplicate(_) => (StatusCode::CONFLICT, "duplicate"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
            AppError::Gateway(gw_err) => match gw_err {
                GatewayError::Declined(_) => (StatusCode::BAD_REQUEST, "payment_declined"),
                GatewayError::NotSuccessful { .. } => {
                    (StatusCode::BAD_REQUEST, "payment_not_successful")
                }
                GatewayError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                _ => (StatusCode::BAD_GATEWAY, "payment_gateway_error"),
            },
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Wallet(wallet_err) => match wallet_err {
                WalletError::InsufficientBalance { .. } => {
                    (StatusCode::PAYMENT_REQUIRED, "insufficient_balance")
                }
                WalletError::ReferenceConflict(_) => (StatusCode::CONFLICT, "reference_conflict"),
                WalletError::ForeignReference(_) => (StatusCode::FORBIDDEN, "foreign_reference"),
            },
            AppError::Group(group_err) => match group_err {
                GroupError::NotOpen(_) => (StatusCode::CONFLICT, "group_not_open"),
                GroupError::SlotsUnavailable { .. } => (StatusCode::CONFLICT, "slots_unavailable"),
            },
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "authentication_error"),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, "authorization_error"),
            AppError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error")
            }
            AppError::Deserialization(_) => (StatusCode::BAD_REQUEST, "deserialization_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::NotSupported(_) => (StatusCode::NOT_IMPLEMENTED, "not_supported"),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        };

        let message = match &self {
            AppError::RateLimited => "Rate limit exceeded".to_string(),
            // Upstream details stay in the logs
            AppError::Gateway(e) if !e.is_business_failure() => {
                "Payment gateway request failed".to_string()
            }
            _ => self.to_string(),
        };

        if status.is_server_error() {
            error!(error_type = %error_type, error = %self, "Server error");
        }

        let details = match self {
            AppError::Validation(ValidationError::Schema(report)) => Some(report.details),
            _ => None,
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
                details,
            },
        });

        (status, body).into_response()
    }
}
