//! Zero-block hierarchy: zero-blocks, their layers, breakpoints and per-layer
//! breakpoint overrides.
//!
//! ```text
//! block (type = zeroblock)
//!   └── zero_block                      1:1
//!         ├── zero_layer                ordered by position
//!         │     └── zero_layer_responsive ──┐
//!         └── zero_block_responsive  <──────┘ same zero-block
//! ```
//!
//! Access to anything below a block is decided by the owning block.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use super::catalog::element_exists;
use super::{double_option, empty_object, require_non_negative, require_positive};
use crate::access::AccessGate;
use crate::db::entities::block::BlockType;
use crate::db::entities::zero_layer_responsive::Direction;
use crate::db::entities::{
    zero_block, zero_block_responsive, zero_layer, zero_layer_responsive, Block, ZeroBlock,
    ZeroBlockResponsive, ZeroLayer, ZeroLayerResponsive,
};
use crate::db::unix_now;
use crate::error::{Result, ServerError};
use crate::ordering::{self, MoveStrategy};

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct NewLayer {
    pub zero_base_element_id: i32,
    #[serde(default = "empty_object")]
    pub data: serde_json::Value,
    #[serde(default)]
    pub position: i32,
}

impl NewLayer {
    pub fn validate(&self) -> Result<()> {
        require_non_negative("position", self.position)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerPatch {
    #[serde(default)]
    pub zero_base_element_id: Option<i32>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Strict position change: rejected if another layer holds it
    #[serde(default)]
    pub position: Option<i32>,
}

impl LayerPatch {
    pub fn validate(&self) -> Result<()> {
        match self.position {
            Some(position) => require_non_negative("position", position),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBlockResponsive {
    /// Ignored when the zero-block comes from the request path
    #[serde(default)]
    pub zero_block_id: Option<i32>,
    pub width: i32,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default = "empty_object")]
    pub props: serde_json::Value,
}

impl NewBlockResponsive {
    pub fn validate(&self) -> Result<()> {
        require_positive("width", self.width)?;
        if let Some(height) = self.height {
            require_non_negative("height", height)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockResponsivePatch {
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub height: Option<Option<i32>>,
    #[serde(default)]
    pub props: Option<serde_json::Value>,
}

impl BlockResponsivePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(width) = self.width {
            require_positive("width", width)?;
        }
        if let Some(Some(height)) = self.height {
            require_non_negative("height", height)?;
        }
        Ok(())
    }
}

impl From<NewBlockResponsive> for BlockResponsivePatch {
    fn from(input: NewBlockResponsive) -> Self {
        Self {
            width: Some(input.width),
            height: Some(input.height),
            props: Some(input.props),
        }
    }
}

fn origin() -> Option<i32> {
    Some(0)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLayerResponsive {
    pub zero_block_responsive_id: i32,
    #[serde(default = "origin")]
    pub x: Option<i32>,
    #[serde(default = "origin")]
    pub y: Option<i32>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "empty_object")]
    pub data: serde_json::Value,
}

impl NewLayerResponsive {
    pub fn validate(&self) -> Result<()> {
        if let Some(width) = self.width {
            require_non_negative("width", width)?;
        }
        if let Some(height) = self.height {
            require_non_negative("height", height)?;
        }
        Ok(())
    }
}

/// PATCH body for a layer override. Absent fields are kept, `null` clears.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerResponsivePatch {
    #[serde(default, deserialize_with = "double_option")]
    pub x: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub y: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub width: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub height: Option<Option<i32>>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl LayerResponsivePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(Some(width)) = self.width {
            require_non_negative("width", width)?;
        }
        if let Some(Some(height)) = self.height {
            require_non_negative("height", height)?;
        }
        Ok(())
    }
}

// ============================================================================
// Views
// ============================================================================

/// Zero-block with layers (ascending position) and breakpoints (widest first)
#[derive(Debug, Clone, Serialize)]
pub struct ZeroBlockDetail {
    #[serde(flatten)]
    pub zero_block: zero_block::Model,
    pub layers: Vec<zero_layer::Model>,
    pub responsive_settings: Vec<zero_block_responsive::Model>,
}

/// Layer with its breakpoint overrides
#[derive(Debug, Clone, Serialize)]
pub struct LayerDetail {
    #[serde(flatten)]
    pub layer: zero_layer::Model,
    pub responsive_settings: Vec<zero_layer_responsive::Model>,
}

// ============================================================================
// Cascades
// ============================================================================

/// Delete a zero-block and everything under it
pub(crate) async fn purge_zero_block<C: ConnectionTrait>(
    db: &C,
    zero_block_id: i32,
) -> std::result::Result<(), DbErr> {
    let layers = ZeroLayer::find()
        .select_only()
        .column(zero_layer::Column::Id)
        .filter(zero_layer::Column::ZeroBlockId.eq(zero_block_id))
        .into_query();
    let breakpoints = ZeroBlockResponsive::find()
        .select_only()
        .column(zero_block_responsive::Column::Id)
        .filter(zero_block_responsive::Column::ZeroBlockId.eq(zero_block_id))
        .into_query();

    ZeroLayerResponsive::delete_many()
        .filter(
            zero_layer_responsive::Column::ZeroLayerId
                .in_subquery(layers)
                .or(zero_layer_responsive::Column::ZeroBlockResponsiveId.in_subquery(breakpoints)),
        )
        .exec(db)
        .await?;
    ZeroLayer::delete_many()
        .filter(zero_layer::Column::ZeroBlockId.eq(zero_block_id))
        .exec(db)
        .await?;
    ZeroBlockResponsive::delete_many()
        .filter(zero_block_responsive::Column::ZeroBlockId.eq(zero_block_id))
        .exec(db)
        .await?;
    ZeroBlock::delete_by_id(zero_block_id).exec(db).await?;

    tracing::debug!("Purged zero-block {}", zero_block_id);
    Ok(())
}

/// Delete the zero-block attached to `block_id`, if any
pub(crate) async fn purge_for_block<C: ConnectionTrait>(
    db: &C,
    block_id: i32,
) -> std::result::Result<(), DbErr> {
    let zero_block = ZeroBlock::find()
        .filter(zero_block::Column::BlockId.eq(block_id))
        .one(db)
        .await?;
    if let Some(zero_block) = zero_block {
        purge_zero_block(db, zero_block.id).await?;
    }
    Ok(())
}

// ============================================================================
// Service
// ============================================================================

pub struct ZeroBlockService {
    db: Arc<DatabaseConnection>,
    gate: Arc<dyn AccessGate>,
}

impl ZeroBlockService {
    pub fn new(db: Arc<DatabaseConnection>, gate: Arc<dyn AccessGate>) -> Self {
        Self { db, gate }
    }

    async fn accessible_zero_block(
        &self,
        user_id: i32,
        zero_block: Option<zero_block::Model>,
    ) -> Result<Option<zero_block::Model>> {
        let Some(zb) = zero_block else {
            return Ok(None);
        };
        if self.gate.can_access_block(user_id, zb.block_id).await? {
            Ok(Some(zb))
        } else {
            Ok(None)
        }
    }

    async fn zero_block_for(&self, user_id: i32, zero_block_id: i32) -> Result<zero_block::Model> {
        let found = ZeroBlock::find_by_id(zero_block_id).one(self.db.as_ref()).await?;
        self.accessible_zero_block(user_id, found)
            .await?
            .ok_or(ServerError::NotFound("Zero-block"))
    }

    async fn layer_for(&self, user_id: i32, layer_id: i32) -> Result<zero_layer::Model> {
        let found = ZeroLayer::find_by_id(layer_id)
            .find_also_related(ZeroBlock)
            .one(self.db.as_ref())
            .await?;
        let Some((layer, zb)) = found else {
            return Err(ServerError::NotFound("Layer"));
        };
        match self.accessible_zero_block(user_id, zb).await? {
            Some(_) => Ok(layer),
            None => Err(ServerError::NotFound("Layer")),
        }
    }

    async fn block_responsive_for(
        &self,
        user_id: i32,
        responsive_id: i32,
    ) -> Result<zero_block_responsive::Model> {
        let found = ZeroBlockResponsive::find_by_id(responsive_id)
            .find_also_related(ZeroBlock)
            .one(self.db.as_ref())
            .await?;
        let Some((responsive, zb)) = found else {
            return Err(ServerError::NotFound("Zero-block responsive"));
        };
        match self.accessible_zero_block(user_id, zb).await? {
            Some(_) => Ok(responsive),
            None => Err(ServerError::NotFound("Zero-block responsive")),
        }
    }

    async fn layer_responsive_for(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<zero_layer_responsive::Model> {
        let found = ZeroLayerResponsive::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(ServerError::NotFound("Layer responsive"))?;
        match self.layer_for(user_id, found.zero_layer_id).await {
            Ok(_) => Ok(found),
            Err(ServerError::NotFound(_)) => Err(ServerError::NotFound("Layer responsive")),
            Err(e) => Err(e),
        }
    }

    async fn detail(&self, zero_block: zero_block::Model) -> Result<ZeroBlockDetail> {
        let layers = zero_block
            .find_related(ZeroLayer)
            .order_by_asc(zero_layer::Column::Position)
            .all(self.db.as_ref())
            .await?;
        let responsive_settings = zero_block
            .find_related(ZeroBlockResponsive)
            .order_by_desc(zero_block_responsive::Column::Width)
            .all(self.db.as_ref())
            .await?;
        Ok(ZeroBlockDetail {
            zero_block,
            layers,
            responsive_settings,
        })
    }

    // ---- zero-blocks ------------------------------------------------------

    pub async fn create_zero_block(&self, user_id: i32, block_id: i32) -> Result<zero_block::Model> {
        if !self.gate.can_access_block(user_id, block_id).await? {
            return Err(ServerError::NotFound("Block"));
        }

        let txn = self.db.begin().await?;
        let block = Block::find_by_id(block_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Block"))?;
        if block.block_type != BlockType::Zeroblock {
            return Err(ServerError::NotZeroBlockType(block_id));
        }

        let existing = ZeroBlock::find()
            .filter(zero_block::Column::BlockId.eq(block_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(ServerError::ZeroBlockExists(block_id));
        }

        let now = unix_now();
        let zero_block = zero_block::ActiveModel {
            block_id: Set(block_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::info!("Created zero-block {} for block {}", zero_block.id, block_id);
        Ok(zero_block)
    }

    pub async fn get_zero_block_for_block(
        &self,
        user_id: i32,
        block_id: i32,
    ) -> Result<ZeroBlockDetail> {
        if !self.gate.can_access_block(user_id, block_id).await? {
            return Err(ServerError::NotFound("Block"));
        }
        let zero_block = ZeroBlock::find()
            .filter(zero_block::Column::BlockId.eq(block_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(ServerError::NotFound("Zero-block"))?;
        self.detail(zero_block).await
    }

    pub async fn get_zero_block(&self, user_id: i32, zero_block_id: i32) -> Result<ZeroBlockDetail> {
        let zero_block = self.zero_block_for(user_id, zero_block_id).await?;
        self.detail(zero_block).await
    }

    pub async fn delete_zero_block(&self, user_id: i32, zero_block_id: i32) -> Result<()> {
        self.zero_block_for(user_id, zero_block_id).await?;

        let txn = self.db.begin().await?;
        purge_zero_block(&txn, zero_block_id).await?;
        txn.commit().await?;

        tracing::info!("Deleted zero-block {}", zero_block_id);
        Ok(())
    }

    // ---- layers -----------------------------------------------------------

    pub async fn list_layers(&self, user_id: i32, zero_block_id: i32) -> Result<Vec<zero_layer::Model>> {
        let zero_block = self.zero_block_for(user_id, zero_block_id).await?;
        let layers = zero_block
            .find_related(ZeroLayer)
            .order_by_asc(zero_layer::Column::Position)
            .all(self.db.as_ref())
            .await?;
        Ok(layers)
    }

    pub async fn create_layer(
        &self,
        user_id: i32,
        zero_block_id: i32,
        input: NewLayer,
    ) -> Result<zero_layer::Model> {
        input.validate()?;
        self.zero_block_for(user_id, zero_block_id).await?;

        let txn = self.db.begin().await?;
        if !element_exists(&txn, input.zero_base_element_id).await? {
            return Err(ServerError::ElementNotFound(input.zero_base_element_id));
        }
        ordering::ensure_free::<ZeroLayer, _>(&txn, zero_block_id, input.position, None).await?;

        let now = unix_now();
        let layer = zero_layer::ActiveModel {
            zero_block_id: Set(zero_block_id),
            zero_base_element_id: Set(input.zero_base_element_id),
            data: Set(input.data),
            position: Set(input.position),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::debug!(
            "Created layer {} at position {} in zero-block {}",
            layer.id,
            layer.position,
            zero_block_id
        );
        Ok(layer)
    }

    pub async fn get_layer(&self, user_id: i32, layer_id: i32) -> Result<LayerDetail> {
        let layer = self.layer_for(user_id, layer_id).await?;
        let responsive_settings = layer
            .find_related(ZeroLayerResponsive)
            .order_by_asc(zero_layer_responsive::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(LayerDetail {
            layer,
            responsive_settings,
        })
    }

    pub async fn update_layer(
        &self,
        user_id: i32,
        layer_id: i32,
        patch: LayerPatch,
    ) -> Result<zero_layer::Model> {
        patch.validate()?;
        self.layer_for(user_id, layer_id).await?;

        let txn = self.db.begin().await?;
        let layer = ZeroLayer::find_by_id(layer_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Layer"))?;

        if let Some(element_id) = patch.zero_base_element_id {
            if element_id != layer.zero_base_element_id && !element_exists(&txn, element_id).await? {
                return Err(ServerError::ElementNotFound(element_id));
            }
        }
        if let Some(position) = patch.position {
            if position != layer.position {
                ordering::ensure_free::<ZeroLayer, _>(
                    &txn,
                    layer.zero_block_id,
                    position,
                    Some(layer.id),
                )
                .await?;
            }
        }

        let mut active: zero_layer::ActiveModel = layer.into();
        if let Some(element_id) = patch.zero_base_element_id {
            active.zero_base_element_id = Set(element_id);
        }
        if let Some(data) = patch.data {
            active.data = Set(data);
        }
        if let Some(position) = patch.position {
            active.position = Set(position);
        }
        active.updated_at = Set(unix_now());
        let layer = active.update(&txn).await?;

        txn.commit().await?;
        Ok(layer)
    }

    /// Move a layer, swapping with the layer already at `position` if any
    pub async fn move_layer(
        &self,
        user_id: i32,
        layer_id: i32,
        position: i32,
    ) -> Result<zero_layer::Model> {
        require_non_negative("position", position)?;
        self.layer_for(user_id, layer_id).await?;

        let txn = self.db.begin().await?;
        let layer = ZeroLayer::find_by_id(layer_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Layer"))?;

        let outcome = ordering::move_to::<ZeroLayer, _>(&txn, MoveStrategy::Swap, &layer, position).await?;
        let layer = ZeroLayer::find_by_id(layer_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Layer"))?;

        txn.commit().await?;
        tracing::debug!("Layer {} move to {}: {:?}", layer_id, position, outcome);
        Ok(layer)
    }

    pub async fn delete_layer(&self, user_id: i32, layer_id: i32) -> Result<()> {
        self.layer_for(user_id, layer_id).await?;

        let txn = self.db.begin().await?;
        let layer = ZeroLayer::find_by_id(layer_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Layer"))?;

        ZeroLayerResponsive::delete_many()
            .filter(zero_layer_responsive::Column::ZeroLayerId.eq(layer.id))
            .exec(&txn)
            .await?;
        ZeroLayer::delete_by_id(layer.id).exec(&txn).await?;
        ordering::compact_shift::<ZeroLayer, _>(&txn, layer.zero_block_id, layer.position).await?;

        txn.commit().await?;
        tracing::info!("Deleted layer {} from zero-block {}", layer.id, layer.zero_block_id);
        Ok(())
    }

    // ---- breakpoints ------------------------------------------------------

    pub async fn list_block_responsive(
        &self,
        user_id: i32,
        zero_block_id: i32,
    ) -> Result<Vec<zero_block_responsive::Model>> {
        let zero_block = self.zero_block_for(user_id, zero_block_id).await?;
        let settings = zero_block
            .find_related(ZeroBlockResponsive)
            .order_by_desc(zero_block_responsive::Column::Width)
            .all(self.db.as_ref())
            .await?;
        Ok(settings)
    }

    pub async fn create_block_responsive(
        &self,
        user_id: i32,
        zero_block_id: i32,
        input: NewBlockResponsive,
    ) -> Result<zero_block_responsive::Model> {
        input.validate()?;
        if let Some(body_id) = input.zero_block_id.filter(|id| *id != zero_block_id) {
            tracing::debug!(
                "Ignoring body zero_block_id {} in favour of path id {}",
                body_id,
                zero_block_id
            );
        }

        let found = ZeroBlock::find_by_id(zero_block_id).one(self.db.as_ref()).await?;
        if self.accessible_zero_block(user_id, found).await?.is_none() {
            return Err(ServerError::ZeroBlockNotFound(zero_block_id));
        }

        let txn = self.db.begin().await?;
        let taken = ZeroBlockResponsive::find()
            .filter(zero_block_responsive::Column::ZeroBlockId.eq(zero_block_id))
            .filter(zero_block_responsive::Column::Width.eq(input.width))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(ServerError::BreakpointConflict {
                zero_block_id,
                width: input.width,
            });
        }

        let now = unix_now();
        let responsive = zero_block_responsive::ActiveModel {
            zero_block_id: Set(zero_block_id),
            width: Set(input.width),
            height: Set(input.height),
            props: Set(input.props),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::debug!(
            "Created breakpoint {} (width {}) for zero-block {}",
            responsive.id,
            responsive.width,
            zero_block_id
        );
        Ok(responsive)
    }

    pub async fn get_block_responsive(
        &self,
        user_id: i32,
        responsive_id: i32,
    ) -> Result<zero_block_responsive::Model> {
        self.block_responsive_for(user_id, responsive_id).await
    }

    pub async fn update_block_responsive(
        &self,
        user_id: i32,
        responsive_id: i32,
        patch: BlockResponsivePatch,
    ) -> Result<zero_block_responsive::Model> {
        patch.validate()?;
        self.block_responsive_for(user_id, responsive_id).await?;

        let txn = self.db.begin().await?;
        let responsive = ZeroBlockResponsive::find_by_id(responsive_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Zero-block responsive"))?;

        if let Some(width) = patch.width.filter(|w| *w != responsive.width) {
            let taken = ZeroBlockResponsive::find()
                .filter(zero_block_responsive::Column::ZeroBlockId.eq(responsive.zero_block_id))
                .filter(zero_block_responsive::Column::Width.eq(width))
                .filter(zero_block_responsive::Column::Id.ne(responsive.id))
                .one(&txn)
                .await?;
            if taken.is_some() {
                return Err(ServerError::BreakpointConflict {
                    zero_block_id: responsive.zero_block_id,
                    width,
                });
            }
        }

        let mut active: zero_block_responsive::ActiveModel = responsive.into();
        if let Some(width) = patch.width {
            active.width = Set(width);
        }
        if let Some(height) = patch.height {
            active.height = Set(height);
        }
        if let Some(props) = patch.props {
            active.props = Set(props);
        }
        active.updated_at = Set(unix_now());
        let responsive = active.update(&txn).await?;

        txn.commit().await?;
        Ok(responsive)
    }

    /// Replace every mutable field of a breakpoint
    pub async fn replace_block_responsive(
        &self,
        user_id: i32,
        responsive_id: i32,
        input: NewBlockResponsive,
    ) -> Result<zero_block_responsive::Model> {
        input.validate()?;
        self.update_block_responsive(user_id, responsive_id, input.into())
            .await
    }

    pub async fn delete_block_responsive(&self, user_id: i32, responsive_id: i32) -> Result<()> {
        self.block_responsive_for(user_id, responsive_id).await?;

        let txn = self.db.begin().await?;
        ZeroLayerResponsive::delete_many()
            .filter(zero_layer_responsive::Column::ZeroBlockResponsiveId.eq(responsive_id))
            .exec(&txn)
            .await?;
        ZeroBlockResponsive::delete_by_id(responsive_id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!("Deleted zero-block responsive {}", responsive_id);
        Ok(())
    }

    // ---- layer overrides --------------------------------------------------

    pub async fn list_layer_responsive(
        &self,
        user_id: i32,
        layer_id: i32,
    ) -> Result<Vec<zero_layer_responsive::Model>> {
        let layer = self.layer_for(user_id, layer_id).await?;
        let settings = layer
            .find_related(ZeroLayerResponsive)
            .order_by_asc(zero_layer_responsive::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(settings)
    }

    pub async fn create_layer_responsive(
        &self,
        user_id: i32,
        layer_id: i32,
        input: NewLayerResponsive,
    ) -> Result<zero_layer_responsive::Model> {
        input.validate()?;
        let layer = self.layer_for(user_id, layer_id).await?;
        let responsive_id = input.zero_block_responsive_id;

        let txn = self.db.begin().await?;
        let responsive = ZeroBlockResponsive::find_by_id(responsive_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::ResponsiveNotFound(responsive_id))?;
        if responsive.zero_block_id != layer.zero_block_id {
            return Err(ServerError::OwnershipMismatch {
                responsive_id,
                zero_block_id: layer.zero_block_id,
            });
        }

        let existing = ZeroLayerResponsive::find()
            .filter(zero_layer_responsive::Column::ZeroLayerId.eq(layer_id))
            .filter(zero_layer_responsive::Column::ZeroBlockResponsiveId.eq(responsive_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(ServerError::DuplicateOverride {
                layer_id,
                responsive_id,
            });
        }

        let now = unix_now();
        let settings = zero_layer_responsive::ActiveModel {
            zero_layer_id: Set(layer_id),
            zero_block_responsive_id: Set(responsive_id),
            x: Set(input.x),
            y: Set(input.y),
            width: Set(input.width),
            height: Set(input.height),
            direction: Set(input.direction),
            data: Set(input.data),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(settings)
    }

    pub async fn get_layer_responsive(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<zero_layer_responsive::Model> {
        self.layer_responsive_for(user_id, id).await
    }

    pub async fn update_layer_responsive(
        &self,
        user_id: i32,
        id: i32,
        patch: LayerResponsivePatch,
    ) -> Result<zero_layer_responsive::Model> {
        patch.validate()?;
        self.layer_responsive_for(user_id, id).await?;

        let txn = self.db.begin().await?;
        let settings = ZeroLayerResponsive::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Layer responsive"))?;

        let mut active: zero_layer_responsive::ActiveModel = settings.into();
        if let Some(x) = patch.x {
            active.x = Set(x);
        }
        if let Some(y) = patch.y {
            active.y = Set(y);
        }
        if let Some(width) = patch.width {
            active.width = Set(width);
        }
        if let Some(height) = patch.height {
            active.height = Set(height);
        }
        if let Some(direction) = patch.direction {
            active.direction = Set(direction);
        }
        if let Some(data) = patch.data {
            active.data = Set(data);
        }
        active.updated_at = Set(unix_now());
        let settings = active.update(&txn).await?;

        txn.commit().await?;
        Ok(settings)
    }

    pub async fn delete_layer_responsive(&self, user_id: i32, id: i32) -> Result<()> {
        self.layer_responsive_for(user_id, id).await?;

        let txn = self.db.begin().await?;
        ZeroLayerResponsive::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DbAccessGate;
    use crate::db::entities::block;
    use crate::db::test_support::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        service: ZeroBlockService,
        db: Arc<DatabaseConnection>,
        owner: i32,
        stranger: i32,
        page: i32,
        element: i32,
    }

    async fn fixture() -> Fixture {
        let (dir, db) = test_database().await;
        let owner = insert_user(&db, "owner", false).await.id;
        let stranger = insert_user(&db, "stranger", false).await.id;
        let project = insert_project(&db, owner).await;
        let page = insert_page(&db, project.id, "home").await.id;
        let element = insert_element(&db, "text").await.id;

        let db = Arc::new(db);
        let gate: Arc<dyn AccessGate> = Arc::new(DbAccessGate::new(db.clone()));
        Fixture {
            _dir: dir,
            service: ZeroBlockService::new(db.clone(), gate),
            db,
            owner,
            stranger,
            page,
            element,
        }
    }

    async fn insert_block(f: &Fixture, block_type: BlockType, position: i32) -> block::Model {
        let now = unix_now();
        let template_id = match block_type {
            BlockType::Template => Some(insert_template(&f.db, &format!("t{}", position)).await.id),
            BlockType::Zeroblock => None,
        };
        block::ActiveModel {
            page_id: Set(f.page),
            block_template_id: Set(template_id),
            block_type: Set(block_type),
            position: Set(position),
            settings: Set(serde_json::json!({})),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(f.db.as_ref())
        .await
        .unwrap()
    }

    async fn new_zero_block(f: &Fixture) -> zero_block::Model {
        let block = insert_block(f, BlockType::Zeroblock, 0).await;
        f.service.create_zero_block(f.owner, block.id).await.unwrap()
    }

    fn layer_at(element: i32, position: i32) -> NewLayer {
        NewLayer {
            zero_base_element_id: element,
            data: serde_json::json!({"text": format!("layer {}", position)}),
            position,
        }
    }

    fn breakpoint(width: i32) -> NewBlockResponsive {
        NewBlockResponsive {
            zero_block_id: None,
            width,
            height: Some(600),
            props: serde_json::json!({}),
        }
    }

    fn override_for(responsive_id: i32) -> NewLayerResponsive {
        NewLayerResponsive {
            zero_block_responsive_id: responsive_id,
            x: Some(0),
            y: Some(0),
            width: None,
            height: None,
            direction: Direction::Left,
            data: serde_json::json!({}),
        }
    }

    async fn layer_positions(f: &Fixture, zero_block_id: i32) -> Vec<(i32, i32)> {
        let mut layers: Vec<_> = f
            .service
            .list_layers(f.owner, zero_block_id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| (l.id, l.position))
            .collect();
        layers.sort();
        layers
    }

    #[tokio::test]
    async fn test_zero_block_requires_zeroblock_type_and_is_unique() {
        let f = fixture().await;
        let template_block = insert_block(&f, BlockType::Template, 1).await;
        let err = f
            .service
            .create_zero_block(f.owner, template_block.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::NotZeroBlockType(_)));

        let block = insert_block(&f, BlockType::Zeroblock, 0).await;
        f.service.create_zero_block(f.owner, block.id).await.unwrap();
        let err = f.service.create_zero_block(f.owner, block.id).await.unwrap_err();
        assert!(matches!(err, ServerError::ZeroBlockExists(id) if id == block.id));
    }

    #[tokio::test]
    async fn test_stranger_sees_not_found() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;

        let err = f.service.get_zero_block(f.stranger, zb.id).await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
        let err = f
            .service
            .create_layer(f.stranger, zb.id, layer_at(f.element, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_layer_checks_element_and_position() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;

        let err = f
            .service
            .create_layer(f.owner, zb.id, layer_at(9999, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::ElementNotFound(9999)));

        f.service
            .create_layer(f.owner, zb.id, layer_at(f.element, 0))
            .await
            .unwrap();
        let err = f
            .service
            .create_layer(f.owner, zb.id, layer_at(f.element, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::PositionConflict { position: 0, .. }));
    }

    #[tokio::test]
    async fn test_move_layer_swaps_with_occupant() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let l1 = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 0)).await.unwrap();
        let l2 = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 1)).await.unwrap();
        let l3 = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 2)).await.unwrap();

        let moved = f.service.move_layer(f.owner, l1.id, 2).await.unwrap();
        assert_eq!(moved.position, 2);
        assert_eq!(
            layer_positions(&f, zb.id).await,
            vec![(l1.id, 2), (l2.id, 1), (l3.id, 0)]
        );
    }

    #[tokio::test]
    async fn test_move_layer_to_free_position() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let l1 = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 0)).await.unwrap();
        let l2 = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 1)).await.unwrap();

        f.service.move_layer(f.owner, l1.id, 7).await.unwrap();
        assert_eq!(layer_positions(&f, zb.id).await, vec![(l1.id, 7), (l2.id, 1)]);

        // Same position is a no-op
        let same = f.service.move_layer(f.owner, l2.id, 1).await.unwrap();
        assert_eq!(same.position, 1);
    }

    #[tokio::test]
    async fn test_update_layer_position_is_strict() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let l1 = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 0)).await.unwrap();
        f.service.create_layer(f.owner, zb.id, layer_at(f.element, 1)).await.unwrap();

        let patch = LayerPatch {
            position: Some(1),
            ..Default::default()
        };
        let err = f.service.update_layer(f.owner, l1.id, patch).await.unwrap_err();
        assert!(matches!(err, ServerError::PositionConflict { .. }));

        // Unchanged position and a new payload are fine
        let patch = LayerPatch {
            position: Some(0),
            data: Some(serde_json::json!({"text": "hi"})),
            ..Default::default()
        };
        let updated = f.service.update_layer(f.owner, l1.id, patch).await.unwrap();
        assert_eq!(updated.data, serde_json::json!({"text": "hi"}));

        let patch = LayerPatch {
            zero_base_element_id: Some(4242),
            ..Default::default()
        };
        let err = f.service.update_layer(f.owner, l1.id, patch).await.unwrap_err();
        assert!(matches!(err, ServerError::ElementNotFound(4242)));
    }

    #[tokio::test]
    async fn test_delete_layer_compacts_siblings() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let l0 = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 0)).await.unwrap();
        let l1 = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 1)).await.unwrap();
        let l2 = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 2)).await.unwrap();

        f.service.delete_layer(f.owner, l1.id).await.unwrap();
        assert_eq!(layer_positions(&f, zb.id).await, vec![(l0.id, 0), (l2.id, 1)]);
    }

    #[tokio::test]
    async fn test_breakpoint_width_unique_per_zero_block() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;

        f.service.create_block_responsive(f.owner, zb.id, breakpoint(1200)).await.unwrap();
        let small = f.service.create_block_responsive(f.owner, zb.id, breakpoint(480)).await.unwrap();
        let err = f
            .service
            .create_block_responsive(f.owner, zb.id, breakpoint(1200))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::BreakpointConflict { width: 1200, .. }));

        let patch = BlockResponsivePatch {
            width: Some(1200),
            ..Default::default()
        };
        let err = f
            .service
            .update_block_responsive(f.owner, small.id, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::BreakpointConflict { .. }));

        let widths: Vec<_> = f
            .service
            .list_block_responsive(f.owner, zb.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.width)
            .collect();
        assert_eq!(widths, vec![1200, 480]);
    }

    #[tokio::test]
    async fn test_breakpoint_for_missing_zero_block() {
        let f = fixture().await;
        let err = f
            .service
            .create_block_responsive(f.owner, 777, breakpoint(320))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::ZeroBlockNotFound(777)));
    }

    #[tokio::test]
    async fn test_patch_null_clears_height() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let bp = f.service.create_block_responsive(f.owner, zb.id, breakpoint(1200)).await.unwrap();
        assert_eq!(bp.height, Some(600));

        let patch: BlockResponsivePatch = serde_json::from_str(r#"{"height": null}"#).unwrap();
        let bp = f.service.update_block_responsive(f.owner, bp.id, patch).await.unwrap();
        assert_eq!(bp.height, None);
        assert_eq!(bp.width, 1200);
    }

    #[tokio::test]
    async fn test_layer_override_must_use_own_zero_block_breakpoint() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let other_block = insert_block(&f, BlockType::Zeroblock, 5).await;
        let other = f.service.create_zero_block(f.owner, other_block.id).await.unwrap();

        let layer = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 0)).await.unwrap();
        let foreign = f.service.create_block_responsive(f.owner, other.id, breakpoint(768)).await.unwrap();
        let own = f.service.create_block_responsive(f.owner, zb.id, breakpoint(768)).await.unwrap();

        let err = f
            .service
            .create_layer_responsive(f.owner, layer.id, override_for(foreign.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::OwnershipMismatch { .. }));

        let err = f
            .service
            .create_layer_responsive(f.owner, layer.id, override_for(9999))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::ResponsiveNotFound(9999)));

        f.service
            .create_layer_responsive(f.owner, layer.id, override_for(own.id))
            .await
            .unwrap();
        let err = f
            .service
            .create_layer_responsive(f.owner, layer.id, override_for(own.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::DuplicateOverride { .. }));
    }

    #[tokio::test]
    async fn test_layer_override_patch_and_listing() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let layer = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 0)).await.unwrap();
        let wide = f.service.create_block_responsive(f.owner, zb.id, breakpoint(1200)).await.unwrap();
        let narrow = f.service.create_block_responsive(f.owner, zb.id, breakpoint(320)).await.unwrap();

        let first = f
            .service
            .create_layer_responsive(f.owner, layer.id, override_for(wide.id))
            .await
            .unwrap();
        let second = f
            .service
            .create_layer_responsive(f.owner, layer.id, override_for(narrow.id))
            .await
            .unwrap();
        assert_eq!(first.x, Some(0));

        let patch: LayerResponsivePatch =
            serde_json::from_str(r#"{"x": null, "width": 150, "direction": "right"}"#).unwrap();
        let updated = f
            .service
            .update_layer_responsive(f.owner, first.id, patch)
            .await
            .unwrap();
        assert_eq!(updated.x, None);
        assert_eq!(updated.y, Some(0));
        assert_eq!(updated.width, Some(150));
        assert_eq!(updated.direction, Direction::Right);

        let ids: Vec<_> = f
            .service
            .list_layer_responsive(f.owner, layer.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);

        let detail = f.service.get_layer(f.owner, layer.id).await.unwrap();
        assert_eq!(detail.responsive_settings.len(), 2);
    }

    #[tokio::test]
    async fn test_deleting_breakpoint_removes_overrides() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let layer = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 0)).await.unwrap();
        let bp = f.service.create_block_responsive(f.owner, zb.id, breakpoint(1024)).await.unwrap();
        let ov = f
            .service
            .create_layer_responsive(f.owner, layer.id, override_for(bp.id))
            .await
            .unwrap();

        f.service.delete_block_responsive(f.owner, bp.id).await.unwrap();
        let err = f.service.get_layer_responsive(f.owner, ov.id).await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_zero_block_purges_tree() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let layer = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 0)).await.unwrap();
        let bp = f.service.create_block_responsive(f.owner, zb.id, breakpoint(1024)).await.unwrap();
        f.service
            .create_layer_responsive(f.owner, layer.id, override_for(bp.id))
            .await
            .unwrap();

        let detail = f.service.get_zero_block(f.owner, zb.id).await.unwrap();
        assert_eq!(detail.layers.len(), 1);
        assert_eq!(detail.responsive_settings.len(), 1);

        f.service.delete_zero_block(f.owner, zb.id).await.unwrap();
        assert!(ZeroLayer::find().all(f.db.as_ref()).await.unwrap().is_empty());
        assert!(ZeroBlockResponsive::find().all(f.db.as_ref()).await.unwrap().is_empty());
        assert!(ZeroLayerResponsive::find().all(f.db.as_ref()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_block_responsive_clears_absent_fields() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let mut input = breakpoint(640);
        input.props = serde_json::json!({"bg": "red"});
        let setting = f
            .service
            .create_block_responsive(f.owner, zb.id, input)
            .await
            .unwrap();
        assert_eq!(setting.height, Some(600));

        let replacement: NewBlockResponsive = serde_json::from_value(serde_json::json!({"width": 900})).unwrap();
        let replaced = f
            .service
            .replace_block_responsive(f.owner, setting.id, replacement)
            .await
            .unwrap();
        assert_eq!(replaced.width, 900);
        assert_eq!(replaced.height, None);
        assert_eq!(replaced.props, serde_json::json!({}));

        let stored = f.service.get_block_responsive(f.owner, setting.id).await.unwrap();
        assert_eq!(stored, replaced);
    }

    #[tokio::test]
    async fn test_delete_layer_removes_its_overrides() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let kept = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 0)).await.unwrap();
        let doomed = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 1)).await.unwrap();
        let bp = f.service.create_block_responsive(f.owner, zb.id, breakpoint(640)).await.unwrap();
        let kept_override = f
            .service
            .create_layer_responsive(f.owner, kept.id, override_for(bp.id))
            .await
            .unwrap();
        let doomed_override = f
            .service
            .create_layer_responsive(f.owner, doomed.id, override_for(bp.id))
            .await
            .unwrap();

        f.service.delete_layer(f.owner, doomed.id).await.unwrap();

        let remaining: Vec<i32> = ZeroLayerResponsive::find()
            .all(f.db.as_ref())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(remaining, vec![kept_override.id]);
        assert!(matches!(
            f.service.get_layer_responsive(f.owner, doomed_override.id).await.unwrap_err(),
            ServerError::NotFound(_)
        ));
        // The breakpoint itself survives
        f.service.get_block_responsive(f.owner, bp.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_layer_to_free_position() {
        let f = fixture().await;
        let zb = new_zero_block(&f).await;
        let a = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 0)).await.unwrap();
        let b = f.service.create_layer(f.owner, zb.id, layer_at(f.element, 1)).await.unwrap();

        let patch = LayerPatch {
            position: Some(5),
            ..Default::default()
        };
        let moved = f.service.update_layer(f.owner, a.id, patch).await.unwrap();
        assert_eq!(moved.position, 5);
        assert_eq!(moved.data, a.data);
        assert_eq!(layer_positions(&f, zb.id).await, vec![(a.id, 5), (b.id, 1)]);
    }

    #[tokio::test]
    async fn test_move_layer_ignores_other_zero_blocks() {
        let f = fixture().await;
        let first = new_zero_block(&f).await;
        let second = new_zero_block(&f).await;
        let mine = f.service.create_layer(f.owner, first.id, layer_at(f.element, 0)).await.unwrap();
        let foreign = f.service.create_layer(f.owner, second.id, layer_at(f.element, 3)).await.unwrap();

        let moved = f.service.move_layer(f.owner, mine.id, 3).await.unwrap();
        assert_eq!(moved.position, 3);
        assert_eq!(layer_positions(&f, first.id).await, vec![(mine.id, 3)]);
        assert_eq!(layer_positions(&f, second.id).await, vec![(foreign.id, 3)]);
    }
}
