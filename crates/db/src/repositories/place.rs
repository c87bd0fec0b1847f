//! Place repository.

use std::sync::Arc;

use crate::entities::{Place, place, place::PlaceCategory};
use crate::repositories::Visibility;
use jardin_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};

/// Place repository for database operations.
#[derive(Clone)]
pub struct PlaceRepository {
    db: Arc<DatabaseConnection>,
}

impl PlaceRepository {
    /// Create a new place repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn scoped(visibility: Visibility) -> Select<Place> {
        match visibility {
            Visibility::All => Place::find(),
            Visibility::PublicOnly => Place::find().filter(place::Column::IsActive.eq(true)),
        }
    }

    /// Find a place by ID regardless of visibility.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<place::Model>> {
        Place::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a place by slug within the caller's visibility.
    pub async fn find_by_slug(
        &self,
        slug: &str,
        visibility: Visibility,
    ) -> AppResult<Option<place::Model>> {
        Self::scoped(visibility)
            .filter(place::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a place by slug, returning an error if not found or hidden.
    pub async fn get_by_slug(&self, slug: &str, visibility: Visibility) -> AppResult<place::Model> {
        self.find_by_slug(slug, visibility)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Place: {slug}")))
    }

    /// Find places by IDs regardless of visibility.
    pub async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<place::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Place::find()
            .filter(place::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List places, newest first, optionally limited to one category.
    pub async fn list(
        &self,
        visibility: Visibility,
        category: Option<PlaceCategory>,
    ) -> AppResult<Vec<place::Model>> {
        let mut query = Self::scoped(visibility);
        if let Some(category) = category {
            query = query.filter(place::Column::Category.eq(category));
        }

        query
            .order_by_desc(place::Column::CreatedAt)
            .order_by_desc(place::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a slug is taken by a place other than `except_id`.
    pub async fn slug_taken(&self, slug: &str, except_id: Option<i64>) -> AppResult<bool> {
        let mut query = Place::find().filter(place::Column::Slug.eq(slug));
        if let Some(id) = except_id {
            query = query.filter(place::Column::Id.ne(id));
        }

        let count = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Create a new place.
    pub async fn create(&self, model: place::ActiveModel) -> AppResult<place::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(super::conflict_or_database)
    }

    /// Update a place.
    pub async fn update(&self, model: place::ActiveModel) -> AppResult<place::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(super::conflict_or_database)
    }

    /// Delete a place. Media and reviews go with it.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Place::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
