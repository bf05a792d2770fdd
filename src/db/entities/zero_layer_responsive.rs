//! Zero layer responsive entity
//!
//! Per-breakpoint geometry override of a layer. Each row pairs a layer with a
//! breakpoint of the same zero-block; the pair is unique.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Horizontal anchoring of a layer at a breakpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[sea_orm(string_value = "left")]
    Left,
    #[sea_orm(string_value = "right")]
    Right,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Left
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "zero_layer_responsive")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub zero_layer_id: i32,
    pub zero_block_responsive_id: i32,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub direction: Direction,
    pub data: Json,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::zero_layer::Entity",
        from = "Column::ZeroLayerId",
        to = "super::zero_layer::Column::Id"
    )]
    Layer,
    #[sea_orm(
        belongs_to = "super::zero_block_responsive::Entity",
        from = "Column::ZeroBlockResponsiveId",
        to = "super::zero_block_responsive::Column::Id"
    )]
    BlockResponsive,
}

impl Related<super::zero_layer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Layer.def()
    }
}

impl Related<super::zero_block_responsive::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BlockResponsive.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
