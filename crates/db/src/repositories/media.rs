//! Place media repository.

use std::sync::Arc;

use crate::entities::{Media, media};
use jardin_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Media repository for database operations.
#[derive(Clone)]
pub struct MediaRepository {
    db: Arc<DatabaseConnection>,
}

impl MediaRepository {
    /// Create a new media repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Media of the given places, highest id first.
    pub async fn find_by_place_ids(&self, place_ids: &[i64]) -> AppResult<Vec<media::Model>> {
        if place_ids.is_empty() {
            return Ok(vec![]);
        }

        Media::find()
            .filter(media::Column::PlaceId.is_in(place_ids.to_vec()))
            .order_by_desc(media::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new media row.
    pub async fn create(&self, model: media::ActiveModel) -> AppResult<media::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
