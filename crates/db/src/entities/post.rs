//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// News or blog post, optionally tied to a place.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    #[sea_orm(nullable, indexed)]
    pub place_id: Option<i64>,

    /// Stored location of the cover image.
    #[sea_orm(nullable)]
    pub cover: Option<String>,

    /// Unpublished posts are hidden from public reads.
    #[sea_orm(default_value = true)]
    pub is_published: bool,

    #[sea_orm(default_value = false)]
    pub is_featured: bool,

    /// Call-to-action link.
    #[sea_orm(nullable)]
    pub cta_url: Option<String>,

    pub cta_label: String,

    /// Author; stamped from the authenticated caller.
    #[sea_orm(nullable)]
    pub created_by: Option<i64>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::place::Entity",
        from = "Column::PlaceId",
        to = "super::place::Column::Id",
        on_delete = "SetNull"
    )]
    Place,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Author,
}

impl Related<super::place::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Place.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
