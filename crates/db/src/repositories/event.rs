//! Event repository.

use std::sync::Arc;

use crate::entities::{Event, event};
use crate::repositories::Visibility;
use jardin_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Select,
};

/// Event repository for database operations.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn scoped(visibility: Visibility) -> Select<Event> {
        match visibility {
            Visibility::All => Event::find(),
            Visibility::PublicOnly => Event::find().filter(event::Column::IsActive.eq(true)),
        }
    }

    /// Find an event by ID within the caller's visibility.
    pub async fn find_by_id(
        &self,
        id: i64,
        visibility: Visibility,
    ) -> AppResult<Option<event::Model>> {
        Self::scoped(visibility)
            .filter(event::Column::Id.eq(id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an event by ID, returning an error if not found or hidden.
    pub async fn get_by_id(&self, id: i64, visibility: Visibility) -> AppResult<event::Model> {
        self.find_by_id(id, visibility)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event: {id}")))
    }

    /// List events, latest start first.
    pub async fn list(&self, visibility: Visibility) -> AppResult<Vec<event::Model>> {
        Self::scoped(visibility)
            .order_by_desc(event::Column::StartDate)
            .order_by_desc(event::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new event.
    pub async fn create(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an event.
    pub async fn update(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an event.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Event::delete_by_id(id)
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
    async fn test_public_detail_excludes_inactive() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<event::Model>::new()])
                .into_connection(),
        );

        let repo = EventRepository::new(db.clone());
        let result = repo.get_by_id(4, Visibility::PublicOnly).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        drop(repo);

        let log = logged_statements(db);
        assert!(where_clause(&log[0]).contains("is_active"));
    }
}
