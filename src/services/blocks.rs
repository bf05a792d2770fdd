//! Block ordering within a page.
//!
//! Creation rejects occupied positions but tolerates gaps. Position updates
//! and batch reorders overwrite directly without touching siblings. Deletion
//! closes the gap it leaves.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use super::catalog::template_exists;
use super::zero_blocks::purge_for_block;
use super::{empty_object, require_non_negative};
use crate::access::AccessGate;
use crate::db::entities::block::{self, BlockType};
use crate::db::entities::{block_template, Block, BlockTemplate};
use crate::db::unix_now;
use crate::error::{Result, ServerError};
use crate::ordering::{self, MoveStrategy};

/// Largest page size accepted by [`BlockService::list_blocks`]
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewBlock {
    #[serde(rename = "type", default)]
    pub block_type: BlockType,
    #[serde(default)]
    pub block_template_id: Option<i32>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "empty_object")]
    pub settings: serde_json::Value,
}

impl NewBlock {
    /// A template block names its template, a zero-block must not
    pub fn validate(&self) -> Result<()> {
        require_non_negative("position", self.position)?;
        match (self.block_type, self.block_template_id) {
            (BlockType::Template, None) => Err(ServerError::InvalidRequest(
                "block_template_id is required for blocks of type 'template'".to_string(),
            )),
            (BlockType::Zeroblock, Some(_)) => Err(ServerError::InvalidRequest(
                "block_template_id must be null for blocks of type 'zeroblock'".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// One entry of a batch reorder
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BlockPlacement {
    pub block_id: i32,
    pub position: i32,
}

/// Block with the name and category of its template, when it has one
#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    #[serde(flatten)]
    pub block: block::Model,
    pub template_name: Option<String>,
    pub template_category: Option<String>,
}

impl BlockView {
    fn new(block: block::Model, template: Option<block_template::Model>) -> Self {
        let (template_name, template_category) = match template {
            Some(t) => (Some(t.name), t.category),
            None => (None, None),
        };
        Self {
            block,
            template_name,
            template_category,
        }
    }
}

pub struct BlockService {
    db: Arc<DatabaseConnection>,
    gate: Arc<dyn AccessGate>,
}

impl BlockService {
    pub fn new(db: Arc<DatabaseConnection>, gate: Arc<dyn AccessGate>) -> Self {
        Self { db, gate }
    }

    async fn ensure_page(&self, user_id: i32, page_id: i32) -> Result<()> {
        if self.gate.can_access_page(user_id, page_id).await? {
            Ok(())
        } else {
            Err(ServerError::NotFound("Page"))
        }
    }

    async fn ensure_block(&self, user_id: i32, block_id: i32) -> Result<()> {
        if self.gate.can_access_block(user_id, block_id).await? {
            Ok(())
        } else {
            Err(ServerError::NotFound("Block"))
        }
    }

    pub async fn create_block(&self, user_id: i32, page_id: i32, input: NewBlock) -> Result<block::Model> {
        input.validate()?;
        self.ensure_page(user_id, page_id).await?;

        let txn = self.db.begin().await?;
        ordering::ensure_free::<Block, _>(&txn, page_id, input.position, None).await?;
        if let Some(template_id) = input.block_template_id {
            if !template_exists(&txn, template_id).await? {
                return Err(ServerError::TemplateNotFound(template_id));
            }
        }

        let now = unix_now();
        let block = block::ActiveModel {
            page_id: Set(page_id),
            block_template_id: Set(input.block_template_id),
            block_type: Set(input.block_type),
            position: Set(input.position),
            settings: Set(input.settings),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::info!(
            "Created {:?} block {} at position {} on page {}",
            block.block_type,
            block.id,
            block.position,
            page_id
        );
        Ok(block)
    }

    /// Blocks of a page ordered by position
    pub async fn list_blocks(
        &self,
        user_id: i32,
        page_id: i32,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<BlockView>> {
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(ServerError::InvalidRequest(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        self.ensure_page(user_id, page_id).await?;

        let rows = Block::find()
            .find_also_related(BlockTemplate)
            .filter(block::Column::PageId.eq(page_id))
            .order_by_asc(block::Column::Position)
            .order_by_asc(block::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(rows.into_iter().map(|(b, t)| BlockView::new(b, t)).collect())
    }

    pub async fn count_blocks(&self, user_id: i32, page_id: i32) -> Result<u64> {
        self.ensure_page(user_id, page_id).await?;
        let count = Block::find()
            .filter(block::Column::PageId.eq(page_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    pub async fn get_block(&self, user_id: i32, block_id: i32) -> Result<BlockView> {
        self.ensure_block(user_id, block_id).await?;
        let (block, template) = Block::find_by_id(block_id)
            .find_also_related(BlockTemplate)
            .one(self.db.as_ref())
            .await?
            .ok_or(ServerError::NotFound("Block"))?;
        Ok(BlockView::new(block, template))
    }

    /// Replace the settings payload of a block
    pub async fn update_settings(
        &self,
        user_id: i32,
        block_id: i32,
        settings: serde_json::Value,
    ) -> Result<block::Model> {
        self.ensure_block(user_id, block_id).await?;

        let txn = self.db.begin().await?;
        let block = Block::find_by_id(block_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Block"))?;

        let mut active: block::ActiveModel = block.into();
        active.settings = Set(settings);
        active.updated_at = Set(unix_now());
        let block = active.update(&txn).await?;

        txn.commit().await?;
        Ok(block)
    }

    /// Overwrite a block's position. Siblings are left alone, so the target
    /// may end up shared.
    pub async fn update_position(&self, user_id: i32, block_id: i32, position: i32) -> Result<block::Model> {
        require_non_negative("position", position)?;
        self.ensure_block(user_id, block_id).await?;

        let txn = self.db.begin().await?;
        let block = Block::find_by_id(block_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Block"))?;

        let old_position = block.position;
        let outcome =
            ordering::move_to::<Block, _>(&txn, MoveStrategy::DirectOverwrite, &block, position).await?;
        let block = Block::find_by_id(block_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Block"))?;

        txn.commit().await?;
        tracing::debug!(
            "Block {} position {} -> {} ({:?})",
            block_id,
            old_position,
            position,
            outcome
        );
        Ok(block)
    }

    /// Delete a block with its zero-block tree and close the gap on its page
    pub async fn delete_block(&self, user_id: i32, block_id: i32) -> Result<()> {
        self.ensure_block(user_id, block_id).await?;

        let txn = self.db.begin().await?;
        let block = Block::find_by_id(block_id)
            .one(&txn)
            .await?
            .ok_or(ServerError::NotFound("Block"))?;

        purge_for_block(&txn, block.id).await?;
        Block::delete_by_id(block.id).exec(&txn).await?;
        ordering::compact_shift::<Block, _>(&txn, block.page_id, block.position).await?;

        txn.commit().await?;
        tracing::info!(
            "Deleted block {} at position {} from page {}",
            block.id,
            block.position,
            block.page_id
        );
        Ok(())
    }

    /// Apply placements in the given order, ignoring blocks of other pages.
    /// No collision checks. Returns the page's blocks ordered by position.
    pub async fn reorder_blocks(
        &self,
        user_id: i32,
        page_id: i32,
        placements: Vec<BlockPlacement>,
    ) -> Result<Vec<BlockView>> {
        for placement in &placements {
            require_non_negative("position", placement.position)?;
        }
        self.ensure_page(user_id, page_id).await?;

        let txn = self.db.begin().await?;
        for placement in &placements {
            let applied = ordering::direct_overwrite::<Block, _>(
                &txn,
                placement.block_id,
                Some(page_id),
                placement.position,
            )
            .await?;
            if !applied {
                tracing::debug!(
                    "Skipping block {} in reorder: not on page {}",
                    placement.block_id,
                    page_id
                );
            }
        }
        txn.commit().await?;

        self.list_blocks(user_id, page_id, 0, MAX_PAGE_SIZE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DbAccessGate;
    use crate::db::entities::{zero_block, ZeroBlock};
    use crate::db::test_support::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        db: Arc<DatabaseConnection>,
        service: BlockService,
        owner: i32,
        stranger: i32,
        page: i32,
        template: i32,
    }

    async fn fixture() -> Fixture {
        let (dir, db) = test_database().await;
        let owner = insert_user(&db, "owner", false).await.id;
        let stranger = insert_user(&db, "stranger", false).await.id;
        let project = insert_project(&db, owner).await;
        let page = insert_page(&db, project.id, "home").await.id;
        let template = insert_template(&db, "Hero").await.id;

        let db = Arc::new(db);
        let gate: Arc<dyn AccessGate> = Arc::new(DbAccessGate::new(db.clone()));
        Fixture {
            _dir: dir,
            service: BlockService::new(db.clone(), gate),
            db,
            owner,
            stranger,
            page,
            template,
        }
    }

    fn zero_at(position: i32) -> NewBlock {
        NewBlock {
            block_type: BlockType::Zeroblock,
            block_template_id: None,
            position,
            settings: serde_json::json!({}),
        }
    }

    async fn positions(f: &Fixture) -> Vec<(i32, i32)> {
        let mut blocks: Vec<_> = f
            .service
            .list_blocks(f.owner, f.page, 0, MAX_PAGE_SIZE)
            .await
            .unwrap()
            .into_iter()
            .map(|v| (v.block.id, v.block.position))
            .collect();
        blocks.sort();
        blocks
    }

    #[tokio::test]
    async fn test_create_rejects_taken_position() {
        let f = fixture().await;
        f.service.create_block(f.owner, f.page, zero_at(0)).await.unwrap();
        f.service.create_block(f.owner, f.page, zero_at(5)).await.unwrap();

        let err = f.service.create_block(f.owner, f.page, zero_at(5)).await.unwrap_err();
        assert!(matches!(err, ServerError::PositionConflict { position: 5, .. }));
        assert_eq!(f.service.count_blocks(f.owner, f.page).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_validates_type_and_template() {
        let f = fixture().await;

        let missing_template = NewBlock {
            block_type: BlockType::Template,
            block_template_id: None,
            position: 0,
            settings: serde_json::json!({}),
        };
        let err = f.service.create_block(f.owner, f.page, missing_template).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequest(_)));

        let mut zero_with_template = zero_at(0);
        zero_with_template.block_template_id = Some(f.template);
        let err = f.service.create_block(f.owner, f.page, zero_with_template).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequest(_)));

        let unknown_template = NewBlock {
            block_type: BlockType::Template,
            block_template_id: Some(404),
            position: 0,
            settings: serde_json::json!({}),
        };
        let err = f.service.create_block(f.owner, f.page, unknown_template).await.unwrap_err();
        assert!(matches!(err, ServerError::TemplateNotFound(404)));

        let good = NewBlock {
            block_type: BlockType::Template,
            block_template_id: Some(f.template),
            position: 0,
            settings: serde_json::json!({"title": "Welcome"}),
        };
        let block = f.service.create_block(f.owner, f.page, good).await.unwrap();
        let view = f.service.get_block(f.owner, block.id).await.unwrap();
        assert_eq!(view.template_name.as_deref(), Some("Hero"));
    }

    #[tokio::test]
    async fn test_stranger_cannot_see_page_blocks() {
        let f = fixture().await;
        let block = f.service.create_block(f.owner, f.page, zero_at(0)).await.unwrap();

        let err = f.service.create_block(f.stranger, f.page, zero_at(1)).await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound("Page")));
        let err = f.service.get_block(f.stranger, block.id).await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound("Block")));
        let err = f.service.delete_block(f.stranger, block.id).await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound("Block")));
    }

    #[tokio::test]
    async fn test_delete_compacts_and_frees_position() {
        let f = fixture().await;
        let b0 = f.service.create_block(f.owner, f.page, zero_at(0)).await.unwrap();
        let b1 = f.service.create_block(f.owner, f.page, zero_at(1)).await.unwrap();
        let b2 = f.service.create_block(f.owner, f.page, zero_at(2)).await.unwrap();

        f.service.delete_block(f.owner, b1.id).await.unwrap();
        assert_eq!(positions(&f).await, vec![(b0.id, 0), (b2.id, 1)]);

        // Position 1 is now held by b2, position 2 is free again
        let err = f.service.create_block(f.owner, f.page, zero_at(1)).await.unwrap_err();
        assert!(matches!(err, ServerError::PositionConflict { .. }));
        f.service.create_block(f.owner, f.page, zero_at(2)).await.unwrap();
        let err = f.service.create_block(f.owner, f.page, zero_at(2)).await.unwrap_err();
        assert!(matches!(err, ServerError::PositionConflict { .. }));
    }

    #[tokio::test]
    async fn test_update_position_overwrites_without_shifting() {
        let f = fixture().await;
        let b0 = f.service.create_block(f.owner, f.page, zero_at(0)).await.unwrap();
        let b1 = f.service.create_block(f.owner, f.page, zero_at(1)).await.unwrap();

        let moved = f.service.update_position(f.owner, b0.id, 1).await.unwrap();
        assert_eq!(moved.position, 1);
        assert_eq!(positions(&f).await, vec![(b0.id, 1), (b1.id, 1)]);

        let err = f.service.update_position(f.owner, b0.id, -3).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_reorder_is_scoped_to_page() {
        let f = fixture().await;
        let b0 = f.service.create_block(f.owner, f.page, zero_at(0)).await.unwrap();
        let b1 = f.service.create_block(f.owner, f.page, zero_at(1)).await.unwrap();

        let project = insert_project(&f.db, f.owner).await;
        let other_page = insert_page(&f.db, project.id, "other").await.id;
        let foreign = f.service.create_block(f.owner, other_page, zero_at(0)).await.unwrap();

        let placements = vec![
            BlockPlacement { block_id: b0.id, position: 1 },
            BlockPlacement { block_id: b1.id, position: 0 },
            BlockPlacement { block_id: foreign.id, position: 9 },
        ];
        let ordered = f.service.reorder_blocks(f.owner, f.page, placements).await.unwrap();
        let ids: Vec<_> = ordered.iter().map(|v| v.block.id).collect();
        assert_eq!(ids, vec![b1.id, b0.id]);

        let foreign = f.service.get_block(f.owner, foreign.id).await.unwrap();
        assert_eq!(foreign.block.position, 0);
    }

    #[tokio::test]
    async fn test_list_pagination_bounds() {
        let f = fixture().await;
        for position in 0..5 {
            f.service.create_block(f.owner, f.page, zero_at(position)).await.unwrap();
        }

        let page = f.service.list_blocks(f.owner, f.page, 1, 2).await.unwrap();
        let got: Vec<_> = page.iter().map(|v| v.block.position).collect();
        assert_eq!(got, vec![1, 2]);

        assert!(f.service.list_blocks(f.owner, f.page, 0, 0).await.is_err());
        assert!(f.service.list_blocks(f.owner, f.page, 0, 101).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_zeroblock_cascades() {
        let f = fixture().await;
        let block = f.service.create_block(f.owner, f.page, zero_at(0)).await.unwrap();
        let now = unix_now();
        zero_block::ActiveModel {
            block_id: Set(block.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(f.db.as_ref())
        .await
        .unwrap();

        f.service.delete_block(f.owner, block.id).await.unwrap();
        assert!(ZeroBlock::find().all(f.db.as_ref()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_settings_replaces_payload() {
        let f = fixture().await;
        let block = f.service.create_block(f.owner, f.page, zero_at(0)).await.unwrap();
        f.service
            .update_settings(f.owner, block.id, serde_json::json!({"color": "red", "size": 3}))
            .await
            .unwrap();

        let updated = f
            .service
            .update_settings(f.owner, block.id, serde_json::json!({"color": "blue"}))
            .await
            .unwrap();
        assert_eq!(updated.settings, serde_json::json!({"color": "blue"}));
        assert_eq!(updated.position, 0);

        let view = f.service.get_block(f.owner, block.id).await.unwrap();
        assert_eq!(view.block.settings, serde_json::json!({"color": "blue"}));

        let err = f
            .service
            .update_settings(f.stranger, block.id, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }
}
