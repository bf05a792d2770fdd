//! Project and page endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};

use super::auth::CurrentUser;
use super::handlers::{json_response, no_content, parse_body};
use super::AppState;
use crate::error::Result;
use crate::services::projects::{NewPage, NewProject};

/// POST /api/projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    payload: std::result::Result<Json<NewProject>, JsonRejection>,
) -> Result<Response> {
    let input = parse_body(payload)?;
    let project = state.projects.create_project(current.user.id, input).await?;
    Ok(json_response(StatusCode::CREATED, &project))
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Response> {
    let projects = state.projects.list_projects(current.user.id).await?;
    Ok(json_response(StatusCode::OK, &projects))
}

/// GET /api/projects/:project_id
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(project_id): Path<i32>,
) -> Result<Response> {
    let project = state.projects.get_project(current.user.id, project_id).await?;
    Ok(json_response(StatusCode::OK, &project))
}

/// POST /api/projects/:project_id/pages
pub async fn create_page(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(project_id): Path<i32>,
    payload: std::result::Result<Json<NewPage>, JsonRejection>,
) -> Result<Response> {
    let input = parse_body(payload)?;
    let page = state
        .projects
        .create_page(current.user.id, project_id, input)
        .await?;
    Ok(json_response(StatusCode::CREATED, &page))
}

/// GET /api/projects/:project_id/pages
pub async fn list_pages(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(project_id): Path<i32>,
) -> Result<Response> {
    let pages = state.projects.list_pages(current.user.id, project_id).await?;
    Ok(json_response(StatusCode::OK, &pages))
}

/// GET /api/pages/:page_id
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(page_id): Path<i32>,
) -> Result<Response> {
    let page = state.projects.get_page(current.user.id, page_id).await?;
    Ok(json_response(StatusCode::OK, &page))
}

/// DELETE /api/pages/:page_id
pub async fn delete_page(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(page_id): Path<i32>,
) -> Result<Response> {
    state.projects.delete_page(current.user.id, page_id).await?;
    Ok(no_content())
}
