//! Block entity
//!
//! A block is a positioned unit of page content. Template blocks reference a
//! `block_templates` row; zero-blocks own a `zero_blocks` row instead.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[sea_orm(string_value = "template")]
    Template,
    #[sea_orm(string_value = "zeroblock")]
    Zeroblock,
}

impl Default for BlockType {
    fn default() -> Self {
        BlockType::Template
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "blocks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub page_id: i32,
    pub block_template_id: Option<i32>,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub position: i32,
    pub settings: Json,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::page::Entity",
        from = "Column::PageId",
        to = "super::page::Column::Id"
    )]
    Page,
    #[sea_orm(
        belongs_to = "super::block_template::Entity",
        from = "Column::BlockTemplateId",
        to = "super::block_template::Column::Id"
    )]
    Template,
    #[sea_orm(has_one = "super::zero_block::Entity")]
    ZeroBlock,
}

impl Related<super::page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Page.def()
    }
}

impl Related<super::block_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl Related<super::zero_block::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ZeroBlock.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
