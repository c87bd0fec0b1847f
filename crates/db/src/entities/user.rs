//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Site account. Staff and superusers pass every permission gate.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Login name (unique).
    #[sea_orm(unique)]
    pub username: String,

    /// Email address (may be blank).
    pub email: String,

    /// Password hash (Argon2).
    #[serde(skip_serializing)]
    pub password: String,

    /// Given name.
    pub first_name: String,

    /// Family name.
    pub last_name: String,

    /// Staff accounts satisfy every role requirement.
    #[sea_orm(default_value = false)]
    pub is_staff: bool,

    #[sea_orm(default_value = false)]
    pub is_superuser: bool,

    /// Inactive accounts cannot authenticate.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub date_joined: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::user_profile::Entity")]
    Profile,
    #[sea_orm(has_one = "super::auth_token::Entity")]
    Token,
}

impl Related<super::user_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::auth_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Token.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
