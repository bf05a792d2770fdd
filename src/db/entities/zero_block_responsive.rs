//! Zero-block responsive entity: a breakpoint of a zero-block.

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "zero_block_responsive")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub zero_block_id: i32,
    /// Screen width this breakpoint applies to, unique per zero-block
    pub width: i32,
    pub height: Option<i32>,
    pub props: Json,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::zero_block::Entity",
        from = "Column::ZeroBlockId",
        to = "super::zero_block::Column::Id"
    )]
    ZeroBlock,
    #[sea_orm(has_many = "super::zero_layer_responsive::Entity")]
    LayerOverrides,
}

impl Related<super::zero_block::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ZeroBlock.def()
    }
}

impl Related<super::zero_layer_responsive::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LayerOverrides.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
