//! Wallet endpoints: balance, ledger and funding completion.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};

use crate::app::AppState;
use crate::domain::{
    AppError, CompleteFundingRequest, ErrorResponse, FundingReceipt, PaginatedResponse,
    PaginationParams, Wallet, WalletTransaction,
};

use super::extract::{AuthUser, ValidatedJson};

/// Current wallet balance of the authenticated user
#[utoipa::path(
    get,
    path = "/api/wallet",
    tag = "wallet",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Wallet balance", body = Wallet),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    )
)]
pub async fn get_wallet_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Wallet>, AppError> {
    let wallet = state.service.get_wallet(&user.id).await?;
    Ok(Json(wallet))
}

/// Ledger entries of the authenticated user, newest first
#[utoipa::path(
    get,
    path = "/api/wallet/transactions",
    tag = "wallet",
    security(("bearer" = [])),
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of items (1-100)"),
        ("cursor" = Option<String>, Query, description = "Pagination cursor")
    ),
    responses(
        (status = 200, description = "Ledger page", body = PaginatedResponse<WalletTransaction>),
        (status = 400, description = "Invalid pagination parameters", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    )
)]
pub async fn list_wallet_transactions_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<WalletTransaction>>, AppError> {
    let page = state
        .service
        .list_wallet_transactions(Some(&user.id), &params)
        .await?;
    Ok(Json(page))
}

/// Credit a verified payment to the authenticated user's wallet
///
/// Safe to call repeatedly with the same reference: the wallet is credited
/// once and later calls report `already_credited`.
#[utoipa::path(
    post,
    path = "/api/wallet/fund/complete",
    tag = "wallet",
    security(("bearer" = [])),
    request_body = CompleteFundingRequest,
    responses(
        (status = 200, description = "Wallet credited", body = FundingReceipt),
        (status = 400, description = "Payment not successful or invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Payment belongs to another user", body = ErrorResponse),
        (status = 409, description = "Reference already credited to another wallet", body = ErrorResponse),
        (status = 502, description = "Payment gateway unavailable", body = ErrorResponse)
    )
)]
pub async fn complete_funding_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<CompleteFundingRequest>,
) -> Result<Json<FundingReceipt>, AppError> {
    let receipt = state
        .service
        .complete_wallet_funding(&user, &payload.reference)
        .await?;
    Ok(Json(receipt))
}
