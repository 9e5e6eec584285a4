//! Livestock listings and investment group endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::app::AppState;
use crate::domain::{
    AppError, CreateGroupRequest, CreateLivestockRequest, DatabaseError, ErrorResponse, Group,
    GroupDetails, GroupStatus, JoinGroupReceipt, JoinGroupRequest, Livestock, PaginatedResponse,
    PaginationParams,
};

use super::extract::{AdminUser, AuthUser, ValidatedJson};

/// Query parameters for listing groups
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct GroupListParams {
    /// Only return groups in this status
    pub status: Option<GroupStatus>,
    /// Maximum number of items to return (1-100, default: 20)
    pub limit: Option<i64>,
    /// Cursor for pagination
    pub cursor: Option<String>,
}

impl GroupListParams {
    fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            limit: self.limit.unwrap_or(defaults.limit),
            cursor: self.cursor.clone(),
        }
    }
}

/// All livestock available for group purchases
#[utoipa::path(
    get,
    path = "/api/livestock",
    tag = "groups",
    responses(
        (status = 200, description = "Livestock listings", body = Vec<Livestock>)
    )
)]
pub async fn list_livestock_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Livestock>>, AppError> {
    let livestock = state.service.list_livestock().await?;
    Ok(Json(livestock))
}

#[utoipa::path(
    get,
    path = "/api/livestock/{id}",
    tag = "groups",
    params(("id" = String, Path, description = "Livestock ID")),
    responses(
        (status = 200, description = "Livestock found", body = Livestock),
        (status = 404, description = "Livestock not found", body = ErrorResponse)
    )
)]
pub async fn get_livestock_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Livestock>, AppError> {
    match state.service.get_livestock(&id).await? {
        Some(livestock) => Ok(Json(livestock)),
        None => Err(AppError::Database(DatabaseError::NotFound(format!(
            "Livestock {} not found",
            id
        )))),
    }
}

/// Add a livestock listing (admin)
#[utoipa::path(
    post,
    path = "/api/livestock",
    tag = "groups",
    security(("bearer" = [])),
    request_body = CreateLivestockRequest,
    responses(
        (status = 200, description = "Livestock created", body = Livestock),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse)
    )
)]
pub async fn create_livestock_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    ValidatedJson(payload): ValidatedJson<CreateLivestockRequest>,
) -> Result<Json<Livestock>, AppError> {
    let livestock = state.service.create_livestock(&payload).await?;
    Ok(Json(livestock))
}

/// Investment groups, newest first
#[utoipa::path(
    get,
    path = "/api/groups",
    tag = "groups",
    params(GroupListParams),
    responses(
        (status = 200, description = "Group page", body = PaginatedResponse<Group>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    )
)]
pub async fn list_groups_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GroupListParams>,
) -> Result<Json<PaginatedResponse<Group>>, AppError> {
    let page = state
        .service
        .list_groups(params.status, &params.pagination())
        .await?;
    Ok(Json(page))
}

/// A group with its livestock listing and members
#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    tag = "groups",
    params(("id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group found", body = GroupDetails),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_group_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GroupDetails>, AppError> {
    match state.service.get_group_details(&id).await? {
        Some(details) => Ok(Json(details)),
        None => Err(AppError::Database(DatabaseError::NotFound(format!(
            "Group {} not found",
            id
        )))),
    }
}

/// Open a new investment group (admin)
#[utoipa::path(
    post,
    path = "/api/groups",
    tag = "groups",
    security(("bearer" = [])),
    request_body = CreateGroupRequest,
    responses(
        (status = 200, description = "Group created", body = Group),
        (status = 400, description = "Invalid request or unknown livestock", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse)
    )
)]
pub async fn create_group_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidatedJson(payload): ValidatedJson<CreateGroupRequest>,
) -> Result<Json<Group>, AppError> {
    let group = state.service.create_group(&payload, &admin).await?;
    Ok(Json(group))
}

/// Buy slots in a group with the wallet balance
#[utoipa::path(
    post,
    path = "/api/groups/{id}/join",
    tag = "groups",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Group ID")),
    request_body = JoinGroupRequest,
    responses(
        (status = 200, description = "Slots purchased", body = JoinGroupReceipt),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 402, description = "Wallet balance too low", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Group not open or not enough slots left", body = ErrorResponse)
    )
)]
pub async fn join_group_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<JoinGroupRequest>,
) -> Result<Json<JoinGroupReceipt>, AppError> {
    let receipt = state.service.join_group(&id, &user, payload.slots).await?;
    Ok(Json(receipt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_list_params_default_limit() {
        let params: GroupListParams = serde_json::from_str(r#"{"status":"open"}"#).unwrap();
        assert_eq!(params.status, Some(GroupStatus::Open));
        let pagination = params.pagination();
        assert_eq!(pagination.limit, 20);
        assert!(pagination.cursor.is_none());
    }
}
