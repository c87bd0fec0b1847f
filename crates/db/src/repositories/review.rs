//! Review repository.

use std::sync::Arc;

use crate::entities::{Review, review};
use jardin_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Review repository for database operations.
#[derive(Clone)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepository {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a review by ID, approved or not.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<review::Model>> {
        Review::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a review by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<review::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review: {id}")))
    }

    /// List reviews with the given approval state, newest first.
    pub async fn list_by_approval(&self, approved: bool) -> AppResult<Vec<review::Model>> {
        Review::find()
            .filter(review::Column::IsApproved.eq(approved))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved reviews of the given places, newest first.
    pub async fn find_approved_by_place_ids(
        &self,
        place_ids: &[i64],
    ) -> AppResult<Vec<review::Model>> {
        if place_ids.is_empty() {
            return Ok(vec![]);
        }

        Review::find()
            .filter(review::Column::PlaceId.is_in(place_ids.to_vec()))
            .filter(review::Column::IsApproved.eq(true))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new review.
    pub async fn create(&self, model: review::ActiveModel) -> AppResult<review::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a review.
    pub async fn update(&self, model: review::ActiveModel) -> AppResult<review::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a review.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Review::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{logged_statements, where_clause};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_by_id_has_no_approval_filter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<review::Model>::new()])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db.clone());
        assert!(repo.find_by_id(3).await.unwrap().is_none());
        drop(repo);

        let log = logged_statements(db);
        assert!(!where_clause(&log[0]).contains("is_approved"));
    }

    #[tokio::test]
    async fn test_empty_place_ids_skip_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = ReviewRepository::new(db.clone());
        assert!(repo.find_approved_by_place_ids(&[]).await.unwrap().is_empty());
        drop(repo);

        assert!(logged_statements(db).is_empty());
    }
}
