//! Zero-block entity: the freeform canvas behind a `zeroblock` block.

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "zero_blocks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// At most one zero-block per block (UNIQUE in the schema)
    #[sea_orm(unique)]
    pub block_id: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::block::Entity",
        from = "Column::BlockId",
        to = "super::block::Column::Id"
    )]
    Block,
    #[sea_orm(has_many = "super::zero_layer::Entity")]
    Layers,
    #[sea_orm(has_many = "super::zero_block_responsive::Entity")]
    ResponsiveSettings,
}

impl Related<super::block::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Block.def()
    }
}

impl Related<super::zero_layer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Layers.def()
    }
}

impl Related<super::zero_block_responsive::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResponsiveSettings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
