//! Shared handler helpers plus the health and auth endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::auth::CurrentUser;
use super::types::{Credentials, LoginResponse, UserResponse};
use super::AppState;
use crate::error::{Result, ServerError};

/// JSON response helper
pub(crate) fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_string(body) {
        Ok(json) => (status, [(header::CONTENT_TYPE, "application/json")], Body::from(json))
            .into_response(),
        Err(e) => ServerError::Internal(format!("JSON serialization error: {}", e)).into_response(),
    }
}

/// Turn a JSON body rejection into a 400 with the standard error body
pub(crate) fn parse_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ServerError::InvalidRequest(rejection.body_text()))
}

pub(crate) fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Health check endpoint
pub async fn health() -> Response {
    let json = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    });
    json_response(StatusCode::OK, &json)
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Response> {
    let req = parse_body(payload)?;
    let user = state.auth.register_user(&req.username, &req.password).await?;
    Ok(json_response(StatusCode::CREATED, &UserResponse::from(user)))
}

/// POST /api/auth/login - Login and get token
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Response> {
    let req = parse_body(payload)?;
    let issued = state.auth.authenticate(&req.username, &req.password).await?;
    let body = LoginResponse {
        token: issued.token,
        token_type: "bearer",
        expires_at: issued.expires_at,
        user: issued.user.into(),
    };
    Ok(json_response(StatusCode::OK, &body))
}

/// GET /api/auth/me
pub async fn me(current: CurrentUser) -> Response {
    json_response(StatusCode::OK, &UserResponse::from(current.user))
}

/// POST /api/auth/logout - Revoke the presented bearer token
pub async fn logout(State(state): State<Arc<AppState>>, current: CurrentUser) -> Result<Response> {
    if let Some(token) = current.token {
        state.auth.revoke_token(&token).await?;
        tracing::info!("User {} logged out", current.user.username);
    }
    Ok(no_content())
}
