//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use crate::repositories::Visibility;
use jardin_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Select,
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn scoped(visibility: Visibility) -> Select<Post> {
        match visibility {
            Visibility::All => Post::find(),
            Visibility::PublicOnly => Post::find().filter(post::Column::IsPublished.eq(true)),
        }
    }

    /// Find a post by ID within the caller's visibility.
    pub async fn find_by_id(
        &self,
        id: i64,
        visibility: Visibility,
    ) -> AppResult<Option<post::Model>> {
        Self::scoped(visibility)
            .filter(post::Column::Id.eq(id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, returning an error if not found or hidden.
    pub async fn get_by_id(&self, id: i64, visibility: Visibility) -> AppResult<post::Model> {
        self.find_by_id(id, visibility)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post: {id}")))
    }

    /// List posts, newest first.
    pub async fn list(
        &self,
        visibility: Visibility,
        featured_only: bool,
    ) -> AppResult<Vec<post::Model>> {
        let mut query = Self::scoped(visibility);
        if featured_only {
            query = query.filter(post::Column::IsFeatured.eq(true));
        }

        query
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
