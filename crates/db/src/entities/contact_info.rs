//! Contact directory entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Section of the contact directory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum ContactCategory {
    #[sea_orm(string_value = "ASOCIACION")]
    Asociacion,
    #[sea_orm(string_value = "GASTRONOMIA")]
    Gastronomia,
    #[sea_orm(string_value = "TRANSPORTE")]
    Transporte,
    #[sea_orm(string_value = "OPERADORES")]
    Operadores,
    #[sea_orm(string_value = "GENERAL")]
    #[default]
    General,
}

impl ContactCategory {
    /// Human-readable label shown by the directory.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Asociacion => "Asociación y Guías",
            Self::Gastronomia => "Gastronomía",
            Self::Transporte => "Transporte",
            Self::Operadores => "Operadores Turísticos",
            Self::General => "Redes Sociales y General",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contact_info")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,

    pub category: ContactCategory,

    pub phone: String,

    pub whatsapp: String,

    pub email: String,

    pub address: String,

    /// Facebook page URL (may be blank).
    pub facebook: String,

    /// Instagram profile URL (may be blank).
    pub instagram: String,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
