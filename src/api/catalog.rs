//! Block template and base element catalog endpoints. Reads need any
//! authenticated user, writes need an admin.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};

use super::auth::{AdminUser, CurrentUser};
use super::handlers::{json_response, parse_body};
use super::AppState;
use crate::error::Result;
use crate::services::catalog::{NewElement, NewTemplate};

/// POST /api/block-templates
pub async fn create_template(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    payload: std::result::Result<Json<NewTemplate>, JsonRejection>,
) -> Result<Response> {
    let input = parse_body(payload)?;
    let template = state.catalog.create_template(input).await?;
    tracing::debug!("Template {} created by {}", template.id, admin.username);
    Ok(json_response(StatusCode::CREATED, &template))
}

/// GET /api/block-templates
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
) -> Result<Response> {
    let templates = state.catalog.list_templates().await?;
    Ok(json_response(StatusCode::OK, &templates))
}

/// GET /api/block-templates/:template_id
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(template_id): Path<i32>,
) -> Result<Response> {
    let template = state.catalog.get_template(template_id).await?;
    Ok(json_response(StatusCode::OK, &template))
}

/// POST /api/zero-base-elements
pub async fn create_element(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    payload: std::result::Result<Json<NewElement>, JsonRejection>,
) -> Result<Response> {
    let input = parse_body(payload)?;
    let element = state.catalog.create_element(input).await?;
    tracing::debug!("Base element {} created by {}", element.id, admin.username);
    Ok(json_response(StatusCode::CREATED, &element))
}

/// GET /api/zero-base-elements
pub async fn list_elements(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
) -> Result<Response> {
    let elements = state.catalog.list_elements().await?;
    Ok(json_response(StatusCode::OK, &elements))
}

/// GET /api/zero-base-elements/:element_id
pub async fn get_element(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(element_id): Path<i32>,
) -> Result<Response> {
    let element = state.catalog.get_element(element_id).await?;
    Ok(json_response(StatusCode::OK, &element))
}
