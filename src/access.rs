//! Ownership checks consumed by the services.
//!
//! Services only ask "may this user touch this page / block". How ownership
//! is resolved stays behind [`AccessGate`], so the services never call each
//! other to answer it.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::db::entities::{Block, Page, Project};
use crate::error::Result;

/// Capability check for page and block access
#[async_trait]
pub trait AccessGate: Send + Sync {
    /// True if the page exists and the user may access it
    async fn can_access_page(&self, user_id: i32, page_id: i32) -> Result<bool>;

    /// True if the block exists and the user may access its page
    async fn can_access_block(&self, user_id: i32, block_id: i32) -> Result<bool>;
}

/// Access gate backed by project ownership: a page is accessible to the owner
/// of its project, a block to whoever may access its page.
pub struct DbAccessGate {
    db: Arc<DatabaseConnection>,
}

impl DbAccessGate {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccessGate for DbAccessGate {
    async fn can_access_page(&self, user_id: i32, page_id: i32) -> Result<bool> {
        let found = Page::find_by_id(page_id)
            .find_also_related(Project)
            .one(self.db.as_ref())
            .await?;

        let allowed = matches!(found, Some((_, Some(project))) if project.owner_id == user_id);
        if !allowed {
            tracing::debug!("User {} denied access to page {}", user_id, page_id);
        }
        Ok(allowed)
    }

    async fn can_access_block(&self, user_id: i32, block_id: i32) -> Result<bool> {
        match Block::find_by_id(block_id).one(self.db.as_ref()).await? {
            Some(block) => self.can_access_page(user_id, block.page_id).await,
            None => Ok(false),
        }
    }
}
