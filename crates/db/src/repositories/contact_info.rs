//! Contact directory repository.

use std::sync::Arc;

use crate::entities::{ContactInfo, contact_info};
use crate::repositories::Visibility;
use jardin_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Select,
};

/// Contact repository for database operations.
#[derive(Clone)]
pub struct ContactInfoRepository {
    db: Arc<DatabaseConnection>,
}

impl ContactInfoRepository {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn scoped(visibility: Visibility) -> Select<ContactInfo> {
        match visibility {
            Visibility::All => ContactInfo::find(),
            Visibility::PublicOnly => {
                ContactInfo::find().filter(contact_info::Column::IsActive.eq(true))
            }
        }
    }

    /// Find a contact by ID within the caller's visibility.
    pub async fn find_by_id(
        &self,
        id: i64,
        visibility: Visibility,
    ) -> AppResult<Option<contact_info::Model>> {
        Self::scoped(visibility)
            .filter(contact_info::Column::Id.eq(id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a contact by ID, returning an error if not found or hidden.
    pub async fn get_by_id(
        &self,
        id: i64,
        visibility: Visibility,
    ) -> AppResult<contact_info::Model> {
        self.find_by_id(id, visibility)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contact: {id}")))
    }

    /// List contacts by category, then name.
    pub async fn list(&self, visibility: Visibility) -> AppResult<Vec<contact_info::Model>> {
        Self::scoped(visibility)
            .order_by_asc(contact_info::Column::Category)
            .order_by_asc(contact_info::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new contact.
    pub async fn create(&self, model: contact_info::ActiveModel) -> AppResult<contact_info::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a contact.
    pub async fn update(&self, model: contact_info::ActiveModel) -> AppResult<contact_info::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a contact.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        ContactInfo::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
