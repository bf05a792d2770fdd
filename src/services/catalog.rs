//! Block template and zero base element catalogs.
//!
//! Both catalogs are global. Writes are admin-only; the caller resolves that
//! before reaching this service.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;

use super::{empty_object, require_length};
use crate::db::entities::{block_template, zero_base_element, BlockTemplate, ZeroBaseElement};
use crate::db::unix_now;
use crate::error::{Result, ServerError};

/// Body of `POST /api/block-templates`
#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "empty_object")]
    pub default_settings: serde_json::Value,
}

impl NewTemplate {
    pub fn validate(&self) -> Result<()> {
        require_length("name", &self.name, 1, 100)?;
        if let Some(category) = &self.category {
            require_length("category", category, 1, 50)?;
        }
        Ok(())
    }
}

/// Body of `POST /api/zero-base-elements`
#[derive(Debug, Clone, Deserialize)]
pub struct NewElement {
    pub type_name: String,
    pub display_name: String,
    pub icon: String,
    pub schema: serde_json::Value,
}

impl NewElement {
    pub fn validate(&self) -> Result<()> {
        require_length("type_name", &self.type_name, 1, 50)?;
        require_length("display_name", &self.display_name, 1, 50)?;
        require_length("icon", &self.icon, 1, 50)
    }
}

pub async fn template_exists<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    let count = BlockTemplate::find_by_id(id).count(db).await?;
    Ok(count > 0)
}

pub async fn element_exists<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    let count = ZeroBaseElement::find_by_id(id).count(db).await?;
    Ok(count > 0)
}

pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create_template(&self, input: NewTemplate) -> Result<block_template::Model> {
        input.validate()?;
        let txn = self.db.begin().await?;

        let taken = BlockTemplate::find()
            .filter(block_template::Column::Name.eq(&input.name))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(ServerError::DuplicateTemplateName(input.name));
        }

        let template = block_template::ActiveModel {
            name: Set(input.name),
            category: Set(input.category),
            default_settings: Set(input.default_settings),
            created_at: Set(unix_now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::info!("Created block template {} ({})", template.id, template.name);
        Ok(template)
    }

    pub async fn list_templates(&self) -> Result<Vec<block_template::Model>> {
        let templates = BlockTemplate::find()
            .order_by_asc(block_template::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(templates)
    }

    pub async fn get_template(&self, id: i32) -> Result<block_template::Model> {
        BlockTemplate::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(ServerError::NotFound("Block template"))
    }

    pub async fn create_element(&self, input: NewElement) -> Result<zero_base_element::Model> {
        input.validate()?;
        let txn = self.db.begin().await?;

        let taken = ZeroBaseElement::find()
            .filter(zero_base_element::Column::TypeName.eq(&input.type_name))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(ServerError::DuplicateTypeName(input.type_name));
        }

        let element = zero_base_element::ActiveModel {
            type_name: Set(input.type_name),
            display_name: Set(input.display_name),
            icon: Set(input.icon),
            schema: Set(input.schema),
            created_at: Set(unix_now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::info!("Created base element {} ({})", element.id, element.type_name);
        Ok(element)
    }

    /// All base elements, ordered by `type_name`
    pub async fn list_elements(&self) -> Result<Vec<zero_base_element::Model>> {
        let elements = ZeroBaseElement::find()
            .order_by_asc(zero_base_element::Column::TypeName)
            .all(self.db.as_ref())
            .await?;
        Ok(elements)
    }

    pub async fn get_element(&self, id: i32) -> Result<zero_base_element::Model> {
        ZeroBaseElement::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(ServerError::NotFound("Base element"))
    }
}
