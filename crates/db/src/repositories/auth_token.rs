//! API token repository.

use std::sync::Arc;

use crate::entities::{AuthToken, auth_token};
use jardin_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Token repository for database operations.
#[derive(Clone)]
pub struct AuthTokenRepository {
    db: Arc<DatabaseConnection>,
}

impl AuthTokenRepository {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the token belonging to a user.
    pub async fn find_by_user_id(&self, user_id: i64) -> AppResult<Option<auth_token::Model>> {
        AuthToken::find()
            .filter(auth_token::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new token.
    pub async fn create(&self, model: auth_token::ActiveModel) -> AppResult<auth_token::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(super::conflict_or_database)
    }
}
