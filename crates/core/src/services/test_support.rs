//! Shared fixtures for service tests.

use std::sync::Mutex;

use chrono::Utc;
use jardin_common::{AppError, AppResult, MediaStore, StoredMedia};
use jardin_db::entities::{place, place::PlaceCategory};

use crate::policy::{Caller, Role};

/// Accepts every upload and remembers the folders it was sent to.
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub(crate) folders: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl MediaStore for RecordingStore {
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        data: &[u8],
        _content_type: &str,
    ) -> AppResult<StoredMedia> {
        if let Ok(mut folders) = self.folders.lock() {
            folders.push(folder.to_string());
        }
        Ok(StoredMedia {
            key: format!("{folder}/{file_name}"),
            secure_url: format!("https://res.cloudinary.com/demo/{folder}/{file_name}"),
            size: data.len() as u64,
        })
    }
}

/// Rejects every upload the way the media host does for a corrupt file.
pub(crate) struct FailingStore;

#[async_trait::async_trait]
impl MediaStore for FailingStore {
    async fn upload(&self, _: &str, _: &str, _: &[u8], _: &str) -> AppResult<StoredMedia> {
        Err(AppError::Upload("Invalid image file".to_string()))
    }
}

pub(crate) fn editor(role: Role) -> Caller {
    Caller {
        user_id: Some(42),
        is_staff: false,
        role: Some(role),
    }
}

pub(crate) fn test_place(id: i64, slug: &str) -> place::Model {
    place::Model {
        id,
        name: format!("Lugar {id}"),
        slug: slug.to_string(),
        category: PlaceCategory::Mirador,
        description: String::new(),
        address: String::new(),
        lat: None,
        lng: None,
        is_active: true,
        created_by: None,
        created_at: Utc::now().into(),
    }
}
