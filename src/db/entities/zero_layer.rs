//! Zero layer entity: one positioned element inside a zero-block.

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "zero_layers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub zero_block_id: i32,
    pub zero_base_element_id: i32,
    pub data: Json,
    /// Stacking order, unique within the zero-block
    pub position: i32,
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
    #[sea_orm(
        belongs_to = "super::zero_base_element::Entity",
        from = "Column::ZeroBaseElementId",
        to = "super::zero_base_element::Column::Id"
    )]
    BaseElement,
    #[sea_orm(has_many = "super::zero_layer_responsive::Entity")]
    ResponsiveSettings,
}

impl Related<super::zero_block::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ZeroBlock.def()
    }
}

impl Related<super::zero_base_element::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BaseElement.def()
    }
}

impl Related<super::zero_layer_responsive::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResponsiveSettings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
