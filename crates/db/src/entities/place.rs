//! Place entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of tourist place.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum PlaceCategory {
    #[sea_orm(string_value = "mirador")]
    Mirador,
    #[sea_orm(string_value = "cascada")]
    Cascada,
    #[sea_orm(string_value = "ruta")]
    Ruta,
    #[sea_orm(string_value = "gastronomia")]
    Gastronomia,
    #[sea_orm(string_value = "hospedaje")]
    Hospedaje,
    #[sea_orm(string_value = "otro")]
    #[default]
    Otro,
}

/// Place entity - a point of interest with media and reviews.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "place")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,

    /// URL key (unique).
    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(indexed)]
    pub category: PlaceCategory,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub address: String,

    /// Latitude, six decimal places.
    #[sea_orm(column_type = "Decimal(Some((9, 6)))", nullable)]
    pub lat: Option<Decimal>,

    /// Longitude, six decimal places.
    #[sea_orm(column_type = "Decimal(Some((9, 6)))", nullable)]
    pub lng: Option<Decimal>,

    /// Inactive places are hidden from public reads.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    #[sea_orm(nullable)]
    pub created_by: Option<i64>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Creator,
    #[sea_orm(has_many = "super::media::Entity")]
    Media,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::event::Entity")]
    Events,
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Media.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
