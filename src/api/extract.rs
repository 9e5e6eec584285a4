//! Request extractors: bearer-session users and schema-validated JSON bodies.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::app::AppState;
use crate::domain::validation::validate_payload;
use crate::domain::{AppError, User};

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The user behind the request's session token
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Authentication("Missing bearer token".to_string()))?;
        let user = state.service.authenticate(token).await?;
        debug!(user_id = %user.id, "Request authenticated");
        Ok(Self(user))
    }
}

/// An authenticated user holding the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Authorization(
                "Administrator access required".to_string(),
            ));
        }
        Ok(Self(user))
    }
}

/// JSON body decoded and checked against its request schema.
///
/// Any violation is rejected with HTTP 400 and the full list of field
/// violations.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|e| AppError::Deserialization(e.body_text()))?;

        let value = validate_payload::<T>(&payload).into_result()?;
        Ok(Self(value))
    }
}
