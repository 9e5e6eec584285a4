//! Admin API handlers.
//!
//! Every endpoint here requires a session whose user holds the admin role.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::info;

use crate::app::AppState;
use crate::domain::{
    AppError, ErrorResponse, Group, PaginatedResponse, PaginationParams, User, WalletTransaction,
};

use super::extract::AdminUser;

/// List registered users
///
/// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of items (1-100)"),
        ("cursor" = Option<String>, Query, description = "Pagination cursor")
    ),
    responses(
        (status = 200, description = "User page", body = PaginatedResponse<User>),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse)
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<User>>, AppError> {
    let page = state.service.list_users(&params).await?;
    Ok(Json(page))
}

/// Ledger entries across every wallet
///
/// GET /api/admin/transactions
#[utoipa::path(
    get,
    path = "/api/admin/transactions",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of items (1-100)"),
        ("cursor" = Option<String>, Query, description = "Pagination cursor")
    ),
    responses(
        (status = 200, description = "Ledger page", body = PaginatedResponse<WalletTransaction>),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse)
    )
)]
pub async fn list_all_transactions_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<WalletTransaction>>, AppError> {
    let page = state.service.list_wallet_transactions(None, &params).await?;
    Ok(Json(page))
}

/// Stop a group from accepting members
///
/// POST /api/admin/groups/{id}/close
#[utoipa::path(
    post,
    path = "/api/admin/groups/{id}/close",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group closed", body = Group),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn close_group_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Group>, AppError> {
    let group = state.service.close_group(&id).await?;
    info!(group_id = %group.id, admin_id = %admin.id, "Group closed by admin");
    Ok(Json(group))
}
