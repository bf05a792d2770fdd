//! Page block endpoints.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    Json,
};

use super::auth::CurrentUser;
use super::handlers::{json_response, no_content, parse_body};
use super::types::{CountResponse, ListQuery, PositionUpdate, ReorderRequest, SettingsUpdate};
use super::AppState;
use crate::error::{Result, ServerError};
use crate::services::blocks::NewBlock;

/// GET /api/pages/:page_id/blocks?skip=&limit=
pub async fn list_blocks(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(page_id): Path<i32>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    let blocks = state
        .blocks
        .list_blocks(current.user.id, page_id, query.skip, query.limit)
        .await?;
    Ok(json_response(StatusCode::OK, &blocks))
}

/// POST /api/pages/:page_id/blocks
pub async fn create_block(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(page_id): Path<i32>,
    payload: std::result::Result<Json<NewBlock>, JsonRejection>,
) -> Result<Response> {
    let input = parse_body(payload)?;
    let block = state.blocks.create_block(current.user.id, page_id, input).await?;
    Ok(json_response(StatusCode::CREATED, &block))
}

/// GET /api/pages/:page_id/blocks/count
pub async fn count_blocks(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(page_id): Path<i32>,
) -> Result<Response> {
    let count = state.blocks.count_blocks(current.user.id, page_id).await?;
    Ok(json_response(StatusCode::OK, &CountResponse { count }))
}

/// PUT /api/pages/:page_id/blocks/order
pub async fn reorder_blocks(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(page_id): Path<i32>,
    payload: std::result::Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Response> {
    let req = parse_body(payload)?;
    let blocks = state
        .blocks
        .reorder_blocks(current.user.id, page_id, req.blocks)
        .await?;
    Ok(json_response(StatusCode::OK, &blocks))
}

/// GET /api/blocks/:block_id
pub async fn get_block(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(block_id): Path<i32>,
) -> Result<Response> {
    let block = state.blocks.get_block(current.user.id, block_id).await?;
    Ok(json_response(StatusCode::OK, &block))
}

/// PATCH /api/blocks/:block_id - Replace settings
pub async fn update_block(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(block_id): Path<i32>,
    payload: std::result::Result<Json<SettingsUpdate>, JsonRejection>,
) -> Result<Response> {
    let req = parse_body(payload)?;
    let block = state
        .blocks
        .update_settings(current.user.id, block_id, req.settings)
        .await?;
    Ok(json_response(StatusCode::OK, &block))
}

/// DELETE /api/blocks/:block_id
pub async fn delete_block(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(block_id): Path<i32>,
) -> Result<Response> {
    state.blocks.delete_block(current.user.id, block_id).await?;
    Ok(no_content())
}

/// PATCH /api/blocks/:block_id/position
pub async fn update_block_position(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(block_id): Path<i32>,
    payload: std::result::Result<Json<PositionUpdate>, JsonRejection>,
) -> Result<Response> {
    let req = parse_body(payload)?;
    let block = state
        .blocks
        .update_position(current.user.id, block_id, req.position)
        .await?;
    Ok(json_response(StatusCode::OK, &block))
}
