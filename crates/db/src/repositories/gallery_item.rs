//! Gallery repository.

use std::sync::Arc;

use crate::entities::{GalleryItem, gallery_item};
use crate::repositories::Visibility;
use jardin_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Select,
};

/// Gallery repository for database operations.
#[derive(Clone)]
pub struct GalleryItemRepository {
    db: Arc<DatabaseConnection>,
}

impl GalleryItemRepository {
    /// Create a new gallery repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn scoped(visibility: Visibility) -> Select<GalleryItem> {
        match visibility {
            Visibility::All => GalleryItem::find(),
            Visibility::PublicOnly => {
                GalleryItem::find().filter(gallery_item::Column::IsActive.eq(true))
            }
        }
    }

    /// Find a gallery item by ID within the caller's visibility.
    pub async fn find_by_id(
        &self,
        id: i64,
        visibility: Visibility,
    ) -> AppResult<Option<gallery_item::Model>> {
        Self::scoped(visibility)
            .filter(gallery_item::Column::Id.eq(id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a gallery item by ID, returning an error if not found or hidden.
    pub async fn get_by_id(
        &self,
        id: i64,
        visibility: Visibility,
    ) -> AppResult<gallery_item::Model> {
        self.find_by_id(id, visibility)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Gallery item: {id}")))
    }

    /// List gallery items by display order, newest first within a position.
    pub async fn list(&self, visibility: Visibility) -> AppResult<Vec<gallery_item::Model>> {
        Self::scoped(visibility)
            .order_by_asc(gallery_item::Column::Order)
            .order_by_desc(gallery_item::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new gallery item.
    pub async fn create(&self, model: gallery_item::ActiveModel) -> AppResult<gallery_item::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a gallery item.
    pub async fn update(&self, model: gallery_item::ActiveModel) -> AppResult<gallery_item::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a gallery item.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        GalleryItem::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
