//! Zero base element entity
//!
//! Catalog of element kinds a zero-block layer can instantiate (text, image,
//! button, ...). `schema` describes the element's editable properties and is
//! passed through untouched.

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "zero_base_elements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub type_name: String,
    pub display_name: String,
    pub icon: String,
    pub schema: Json,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::zero_layer::Entity")]
    Layers,
}

impl Related<super::zero_layer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Layers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
