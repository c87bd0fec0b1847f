//! Gallery item entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of gallery media, detected from the uploaded content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum MediaType {
    #[sea_orm(string_value = "IMAGE")]
    #[default]
    Image,
    #[sea_orm(string_value = "VIDEO")]
    Video,
}

/// Gallery item entity - an image or video in the site gallery.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gallery_item")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub title: String,

    pub media_type: MediaType,

    /// Storage key of the uploaded file.
    #[sea_orm(nullable)]
    pub media_file: Option<String>,

    /// URL returned by the media host.
    #[sea_orm(nullable)]
    pub media_file_url: Option<String>,

    /// Display position, ascending.
    #[sea_orm(default_value = 0)]
    pub order: i32,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
