//! Zero-block endpoints: the zero-block itself, its layers, its breakpoints
//! and the per-layer overrides.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};

use super::auth::CurrentUser;
use super::handlers::{json_response, no_content, parse_body};
use super::types::PositionUpdate;
use super::AppState;
use crate::error::Result;
use crate::services::zero_blocks::{
    BlockResponsivePatch, LayerPatch, LayerResponsivePatch, NewBlockResponsive, NewLayer,
    NewLayerResponsive,
};

type Payload<T> = std::result::Result<Json<T>, JsonRejection>;

// ---- zero-blocks ------------------------------------------------------------

/// POST /api/blocks/:block_id/zero-block
pub async fn create_zero_block(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(block_id): Path<i32>,
) -> Result<Response> {
    let zero_block = state
        .zero_blocks
        .create_zero_block(current.user.id, block_id)
        .await?;
    Ok(json_response(StatusCode::CREATED, &zero_block))
}

/// GET /api/blocks/:block_id/zero-block
pub async fn get_zero_block_for_block(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(block_id): Path<i32>,
) -> Result<Response> {
    let detail = state
        .zero_blocks
        .get_zero_block_for_block(current.user.id, block_id)
        .await?;
    Ok(json_response(StatusCode::OK, &detail))
}

pub async fn get_zero_block(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(zero_block_id): Path<i32>,
) -> Result<Response> {
    let detail = state
        .zero_blocks
        .get_zero_block(current.user.id, zero_block_id)
        .await?;
    Ok(json_response(StatusCode::OK, &detail))
}

pub async fn delete_zero_block(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(zero_block_id): Path<i32>,
) -> Result<Response> {
    state
        .zero_blocks
        .delete_zero_block(current.user.id, zero_block_id)
        .await?;
    Ok(no_content())
}

// ---- layers -----------------------------------------------------------------

pub async fn list_layers(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(zero_block_id): Path<i32>,
) -> Result<Response> {
    let layers = state
        .zero_blocks
        .list_layers(current.user.id, zero_block_id)
        .await?;
    Ok(json_response(StatusCode::OK, &layers))
}

pub async fn create_layer(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(zero_block_id): Path<i32>,
    payload: Payload<NewLayer>,
) -> Result<Response> {
    let input = parse_body(payload)?;
    let layer = state
        .zero_blocks
        .create_layer(current.user.id, zero_block_id, input)
        .await?;
    Ok(json_response(StatusCode::CREATED, &layer))
}

/// GET /api/zero-layers/:layer_id - Layer with its overrides
pub async fn get_layer(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(layer_id): Path<i32>,
) -> Result<Response> {
    let layer = state.zero_blocks.get_layer(current.user.id, layer_id).await?;
    Ok(json_response(StatusCode::OK, &layer))
}

pub async fn update_layer(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(layer_id): Path<i32>,
    payload: Payload<LayerPatch>,
) -> Result<Response> {
    let patch = parse_body(payload)?;
    let layer = state
        .zero_blocks
        .update_layer(current.user.id, layer_id, patch)
        .await?;
    Ok(json_response(StatusCode::OK, &layer))
}

pub async fn delete_layer(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(layer_id): Path<i32>,
) -> Result<Response> {
    state.zero_blocks.delete_layer(current.user.id, layer_id).await?;
    Ok(no_content())
}

/// PATCH /api/zero-layers/:layer_id/position - Swap with the occupant, if any
pub async fn move_layer(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(layer_id): Path<i32>,
    payload: Payload<PositionUpdate>,
) -> Result<Response> {
    let req = parse_body(payload)?;
    let layer = state
        .zero_blocks
        .move_layer(current.user.id, layer_id, req.position)
        .await?;
    Ok(json_response(StatusCode::OK, &layer))
}

// ---- block breakpoints ------------------------------------------------------

pub async fn list_block_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(zero_block_id): Path<i32>,
) -> Result<Response> {
    let settings = state
        .zero_blocks
        .list_block_responsive(current.user.id, zero_block_id)
        .await?;
    Ok(json_response(StatusCode::OK, &settings))
}

pub async fn create_block_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(zero_block_id): Path<i32>,
    payload: Payload<NewBlockResponsive>,
) -> Result<Response> {
    let input = parse_body(payload)?;
    let setting = state
        .zero_blocks
        .create_block_responsive(current.user.id, zero_block_id, input)
        .await?;
    Ok(json_response(StatusCode::CREATED, &setting))
}

pub async fn get_block_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(responsive_id): Path<i32>,
) -> Result<Response> {
    let setting = state
        .zero_blocks
        .get_block_responsive(current.user.id, responsive_id)
        .await?;
    Ok(json_response(StatusCode::OK, &setting))
}

pub async fn update_block_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(responsive_id): Path<i32>,
    payload: Payload<BlockResponsivePatch>,
) -> Result<Response> {
    let patch = parse_body(payload)?;
    let setting = state
        .zero_blocks
        .update_block_responsive(current.user.id, responsive_id, patch)
        .await?;
    Ok(json_response(StatusCode::OK, &setting))
}

/// PUT /api/zero-block-responsive/:responsive_id - Full replacement
pub async fn replace_block_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(responsive_id): Path<i32>,
    payload: Payload<NewBlockResponsive>,
) -> Result<Response> {
    let input = parse_body(payload)?;
    let setting = state
        .zero_blocks
        .replace_block_responsive(current.user.id, responsive_id, input)
        .await?;
    Ok(json_response(StatusCode::OK, &setting))
}

pub async fn delete_block_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(responsive_id): Path<i32>,
) -> Result<Response> {
    state
        .zero_blocks
        .delete_block_responsive(current.user.id, responsive_id)
        .await?;
    Ok(no_content())
}

// ---- layer overrides --------------------------------------------------------

pub async fn list_layer_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(layer_id): Path<i32>,
) -> Result<Response> {
    let settings = state
        .zero_blocks
        .list_layer_responsive(current.user.id, layer_id)
        .await?;
    Ok(json_response(StatusCode::OK, &settings))
}

pub async fn create_layer_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(layer_id): Path<i32>,
    payload: Payload<NewLayerResponsive>,
) -> Result<Response> {
    let input = parse_body(payload)?;
    let setting = state
        .zero_blocks
        .create_layer_responsive(current.user.id, layer_id, input)
        .await?;
    Ok(json_response(StatusCode::CREATED, &setting))
}

pub async fn get_layer_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(responsive_id): Path<i32>,
) -> Result<Response> {
    let setting = state
        .zero_blocks
        .get_layer_responsive(current.user.id, responsive_id)
        .await?;
    Ok(json_response(StatusCode::OK, &setting))
}

pub async fn update_layer_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(responsive_id): Path<i32>,
    payload: Payload<LayerResponsivePatch>,
) -> Result<Response> {
    let patch = parse_body(payload)?;
    let setting = state
        .zero_blocks
        .update_layer_responsive(current.user.id, responsive_id, patch)
        .await?;
    Ok(json_response(StatusCode::OK, &setting))
}

pub async fn delete_layer_responsive(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(responsive_id): Path<i32>,
) -> Result<Response> {
    state
        .zero_blocks
        .delete_layer_responsive(current.user.id, responsive_id)
        .await?;
    Ok(no_content())
}
