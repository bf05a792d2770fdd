//! Projects and pages, the containers blocks live in.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;

use super::require_length;
use super::zero_blocks::purge_for_block;
use crate::access::AccessGate;
use crate::db::entities::{block, page, project, Block, Page, Project};
use crate::db::unix_now;
use crate::error::{Result, ServerError};

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPage {
    pub title: String,
    pub slug: String,
}

impl NewPage {
    pub fn validate(&self) -> Result<()> {
        require_length("title", &self.title, 1, 200)?;
        require_length("slug", &self.slug, 1, 100)?;
        let valid = self
            .slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(ServerError::InvalidRequest(
                "slug may only contain lowercase letters, digits and dashes".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct ProjectService {
    db: Arc<DatabaseConnection>,
    gate: Arc<dyn AccessGate>,
}

impl ProjectService {
    pub fn new(db: Arc<DatabaseConnection>, gate: Arc<dyn AccessGate>) -> Self {
        Self { db, gate }
    }

    pub async fn create_project(&self, owner_id: i32, input: NewProject) -> Result<project::Model> {
        require_length("name", &input.name, 1, 200)?;
        let project = project::ActiveModel {
            owner_id: Set(owner_id),
            name: Set(input.name),
            created_at: Set(unix_now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        tracing::info!("User {} created project {}", owner_id, project.id);
        Ok(project)
    }

    pub async fn list_projects(&self, owner_id: i32) -> Result<Vec<project::Model>> {
        let projects = Project::find()
            .filter(project::Column::OwnerId.eq(owner_id))
            .order_by_asc(project::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(projects)
    }

    /// The project, if it exists and belongs to `owner_id`
    pub async fn get_project(&self, owner_id: i32, project_id: i32) -> Result<project::Model> {
        Project::find_by_id(project_id)
            .filter(project::Column::OwnerId.eq(owner_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(ServerError::NotFound("Project"))
    }

    pub async fn create_page(&self, owner_id: i32, project_id: i32, input: NewPage) -> Result<page::Model> {
        input.validate()?;
        self.get_project(owner_id, project_id).await?;

        let txn = self.db.begin().await?;
        let taken = Page::find()
            .filter(page::Column::ProjectId.eq(project_id))
            .filter(page::Column::Slug.eq(&input.slug))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(ServerError::DuplicateSlug(input.slug));
        }

        let now = unix_now();
        let page = page::ActiveModel {
            project_id: Set(project_id),
            title: Set(input.title),
            slug: Set(input.slug),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(page)
    }

    pub async fn list_pages(&self, owner_id: i32, project_id: i32) -> Result<Vec<page::Model>> {
        let project = self.get_project(owner_id, project_id).await?;
        let pages = Page::find()
            .filter(page::Column::ProjectId.eq(project.id))
            .order_by_asc(page::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(pages)
    }

    pub async fn get_page(&self, user_id: i32, page_id: i32) -> Result<page::Model> {
        if !self.gate.can_access_page(user_id, page_id).await? {
            return Err(ServerError::NotFound("Page"));
        }
        Page::find_by_id(page_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(ServerError::NotFound("Page"))
    }

    /// Delete a page together with its blocks and their zero-block trees
    pub async fn delete_page(&self, user_id: i32, page_id: i32) -> Result<()> {
        if !self.gate.can_access_page(user_id, page_id).await? {
            return Err(ServerError::NotFound("Page"));
        }

        let txn = self.db.begin().await?;
        let blocks = Block::find()
            .filter(block::Column::PageId.eq(page_id))
            .all(&txn)
            .await?;
        for block in &blocks {
            purge_for_block(&txn, block.id).await?;
        }
        Block::delete_many()
            .filter(block::Column::PageId.eq(page_id))
            .exec(&txn)
            .await?;
        Page::delete_by_id(page_id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!("Deleted page {} with {} blocks", page_id, blocks.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DbAccessGate;
    use crate::db::test_support::*;

    async fn service() -> (tempfile::TempDir, ProjectService, i32, i32) {
        let (dir, db) = test_database().await;
        let owner = insert_user(&db, "owner", false).await.id;
        let stranger = insert_user(&db, "stranger", false).await.id;
        let db = Arc::new(db);
        let gate: Arc<dyn AccessGate> = Arc::new(DbAccessGate::new(db.clone()));
        (dir, ProjectService::new(db, gate), owner, stranger)
    }

    fn new_page(slug: &str) -> NewPage {
        NewPage {
            title: "Home".to_string(),
            slug: slug.to_string(),
        }
    }

    #[tokio::test]
    async fn test_projects_are_private_to_owner() {
        let (_dir, service, owner, stranger) = service().await;
        let project = service
            .create_project(owner, NewProject { name: "Site".to_string() })
            .await
            .unwrap();

        assert_eq!(service.list_projects(owner).await.unwrap().len(), 1);
        assert!(service.list_projects(stranger).await.unwrap().is_empty());
        assert!(matches!(
            service.get_project(stranger, project.id).await.unwrap_err(),
            ServerError::NotFound("Project")
        ));

        let page = service.create_page(owner, project.id, new_page("home")).await.unwrap();
        assert!(service.get_page(owner, page.id).await.is_ok());
        assert!(matches!(
            service.get_page(stranger, page.id).await.unwrap_err(),
            ServerError::NotFound("Page")
        ));
    }

    #[tokio::test]
    async fn test_slug_rules() {
        let (_dir, service, owner, _) = service().await;
        let project = service
            .create_project(owner, NewProject { name: "Site".to_string() })
            .await
            .unwrap();

        service.create_page(owner, project.id, new_page("about-us")).await.unwrap();
        let err = service
            .create_page(owner, project.id, new_page("about-us"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::DuplicateSlug(_)));

        let err = service
            .create_page(owner, project.id, new_page("About Us"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_delete_page() {
        let (_dir, service, owner, stranger) = service().await;
        let project = service
            .create_project(owner, NewProject { name: "Site".to_string() })
            .await
            .unwrap();
        let page = service.create_page(owner, project.id, new_page("home")).await.unwrap();

        assert!(service.delete_page(stranger, page.id).await.is_err());
        service.delete_page(owner, page.id).await.unwrap();
        assert!(service.list_pages(owner, project.id).await.unwrap().is_empty());
    }
}
