//! Gallery service.
//!
//! Uploads go to the media host before anything is written; the stored
//! media type is always the one detected from the upload.

use std::sync::Arc;

use chrono::Utc;
use jardin_common::{AppError, AppResult, MediaStore, StoredMedia, form};
use jardin_db::{
    entities::{gallery_item, gallery_item::MediaType},
    repositories::GalleryItemRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{FieldCheck, WriteMode, timestamp};
use crate::{
    policy::{Access, Caller, Resource, authorize, visibility},
    representation::{Origin, absolute_media_url},
    upload::FileUpload,
};

/// Name of the file part carrying the gallery media.
pub const UPLOAD_FIELD: &str = "media_file_upload";

const GALLERY_FOLDER: &str = "gallery";

/// Gallery item fields for create and update.
///
/// `media_type` and `media_file_url` are derived from the upload and not
/// accepted here.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct GalleryInput {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "form::opt_value")]
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub order: Option<i32>,
    #[serde(default, deserialize_with = "form::opt_bool")]
    pub is_active: Option<bool>,
}

impl GalleryInput {
    fn check(&self, mode: WriteMode, has_upload: bool) -> AppResult<()> {
        let mut check = FieldCheck::new();
        check.require(mode, "title", self.title.is_some());
        check.require(mode, UPLOAD_FIELD, has_upload);
        check.finish()
    }

    fn apply(self, active: &mut gallery_item::ActiveModel) {
        if let Some(title) = self.title {
            active.title = Set(title);
        }
        if let Some(order) = self.order {
            active.order = Set(order);
        }
        if let Some(is_active) = self.is_active {
            active.is_active = Set(is_active);
        }
    }
}

/// Gallery item with absolute media URLs.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryItemResponse {
    pub id: i64,
    pub title: String,
    pub media_type: MediaType,
    pub media_file: Option<String>,
    pub media_file_url: Option<String>,
    pub order: i32,
    pub is_active: bool,
    pub uploaded_at: String,
}

impl GalleryItemResponse {
    fn render(g: gallery_item::Model, origin: &Origin) -> Self {
        Self {
            id: g.id,
            title: g.title,
            media_type: g.media_type,
            media_file: absolute_media_url(origin, g.media_file.as_deref()),
            media_file_url: absolute_media_url(origin, g.media_file_url.as_deref()),
            order: g.order,
            is_active: g.is_active,
            uploaded_at: timestamp(&g.uploaded_at),
        }
    }
}

/// Service for the media gallery.
#[derive(Clone)]
pub struct GalleryService {
    gallery_repo: GalleryItemRepository,
    store: Arc<dyn MediaStore>,
}

impl GalleryService {
    /// Create a new gallery service.
    #[must_use]
    pub fn new(gallery_repo: GalleryItemRepository, store: Arc<dyn MediaStore>) -> Self {
        Self {
            gallery_repo,
            store,
        }
    }

    /// List items by display order.
    pub async fn list(&self, caller: &Caller, origin: &Origin) -> AppResult<Vec<GalleryItemResponse>> {
        authorize(caller, Resource::GalleryItem, Access::Read)?;

        let items = self
            .gallery_repo
            .list(visibility(caller, Resource::GalleryItem))
            .await?;
        Ok(items
            .into_iter()
            .map(|g| GalleryItemResponse::render(g, origin))
            .collect())
    }

    /// Get an item by ID.
    pub async fn get(
        &self,
        caller: &Caller,
        id: i64,
        origin: &Origin,
    ) -> AppResult<GalleryItemResponse> {
        authorize(caller, Resource::GalleryItem, Access::Read)?;

        let item = self
            .gallery_repo
            .get_by_id(id, visibility(caller, Resource::GalleryItem))
            .await?;
        Ok(GalleryItemResponse::render(item, origin))
    }

    /// Upload a file and create an item for it.
    pub async fn create(
        &self,
        caller: &Caller,
        input: GalleryInput,
        upload: Option<FileUpload>,
        origin: &Origin,
    ) -> AppResult<GalleryItemResponse> {
        authorize(caller, Resource::GalleryItem, Access::Write)?;
        input.validate()?;
        input.check(WriteMode::Full, upload.is_some())?;

        let Some(upload) = upload else {
            return Err(AppError::field(UPLOAD_FIELD, "No file was submitted."));
        };
        let (media_type, stored) = self.ingest(&upload).await?;

        let mut model = gallery_item::ActiveModel {
            media_type: Set(media_type),
            media_file: Set(Some(stored.secure_url.clone())),
            media_file_url: Set(Some(stored.secure_url)),
            order: Set(0),
            is_active: Set(true),
            uploaded_at: Set(Utc::now().into()),
            ..Default::default()
        };
        input.apply(&mut model);

        let item = self.gallery_repo.create(model).await?;
        tracing::info!(
            gallery_item_id = item.id,
            media_type = ?item.media_type,
            "Gallery item created"
        );

        Ok(GalleryItemResponse::render(item, origin))
    }

    /// Replace or patch an item; a new upload replaces the media.
    pub async fn update(
        &self,
        caller: &Caller,
        id: i64,
        input: GalleryInput,
        upload: Option<FileUpload>,
        mode: WriteMode,
        origin: &Origin,
    ) -> AppResult<GalleryItemResponse> {
        authorize(caller, Resource::GalleryItem, Access::Write)?;
        input.validate()?;
        input.check(mode, upload.is_some())?;

        let item = self
            .gallery_repo
            .get_by_id(id, visibility(caller, Resource::GalleryItem))
            .await?;

        let ingested = match upload {
            Some(upload) => Some(self.ingest(&upload).await?),
            None => None,
        };

        let mut active: gallery_item::ActiveModel = item.into();
        input.apply(&mut active);
        if let Some((media_type, stored)) = ingested {
            active.media_type = Set(media_type);
            active.media_file = Set(Some(stored.secure_url.clone()));
            active.media_file_url = Set(Some(stored.secure_url));
            active.uploaded_at = Set(Utc::now().into());
        }

        let item = self.gallery_repo.update(active).await?;
        Ok(GalleryItemResponse::render(item, origin))
    }

    /// Delete an item. The hosted file is left in place.
    pub async fn delete(&self, caller: &Caller, id: i64) -> AppResult<()> {
        authorize(caller, Resource::GalleryItem, Access::Write)?;

        let item = self
            .gallery_repo
            .get_by_id(id, visibility(caller, Resource::GalleryItem))
            .await?;
        self.gallery_repo.delete(item.id).await
    }

    async fn ingest(&self, upload: &FileUpload) -> AppResult<(MediaType, StoredMedia)> {
        let (media_type, content_type) = upload.inspect(UPLOAD_FIELD)?;
        let stored = upload
            .store(self.store.as_ref(), GALLERY_FOLDER, &content_type)
            .await?;
        Ok((media_type, stored))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use crate::services::test_support::{FailingStore, RecordingStore, editor};
    use jardin_db::test_utils::logged_statements;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    fn test_item(id: i64, media_type: MediaType, url: &str) -> gallery_item::Model {
        gallery_item::Model {
            id,
            title: "Salto del Río".to_string(),
            media_type,
            media_file: Some(url.to_string()),
            media_file_url: Some(url.to_string()),
            order: 0,
            is_active: true,
            uploaded_at: Utc::now().into(),
        }
    }

    fn empty() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn origin() -> Origin {
        Origin::new("https", "jardin.example")
    }

    fn clip() -> FileUpload {
        FileUpload {
            file_name: "salto.mp4".to_string(),
            content_type: Some("video/mp4".to_string()),
            data: bytes::Bytes::from_static(b"mp4"),
        }
    }

    #[tokio::test]
    async fn test_detected_type_overrides_caller() {
        let url = "https://res.cloudinary.com/demo/gallery/salto.mp4";
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_item(1, MediaType::Video, url)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 1,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let svc = GalleryService::new(
            GalleryItemRepository::new(db.clone()),
            Arc::new(RecordingStore::default()),
        );

        let input: GalleryInput = serde_json::from_value(serde_json::json!({
            "title": "Salto del Río",
            "media_type": "IMAGE",
            "order": "2"
        }))
        .unwrap();
        let item = svc
            .create(&editor(Role::Admin), input, Some(clip()), &origin())
            .await
            .unwrap();
        drop(svc);

        assert_eq!(item.media_type, MediaType::Video);
        assert_eq!(item.media_file_url.as_deref(), Some(url));

        let log = logged_statements(db);
        assert!(log[0].contains("VIDEO"));
        assert!(!log[0].contains("IMAGE"));
    }

    #[tokio::test]
    async fn test_upload_failure_is_bad_request_without_insert() {
        let db = empty();
        let svc = GalleryService::new(GalleryItemRepository::new(db.clone()), Arc::new(FailingStore));

        let input = GalleryInput {
            title: Some("Salto".to_string()),
            ..Default::default()
        };
        let result = svc
            .create(&editor(Role::Admin), input, Some(clip()), &origin())
            .await;
        drop(svc);

        let err = result.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
        assert!(err.to_string().contains("Invalid image file"));
        assert!(logged_statements(db).is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_upload() {
        let svc = GalleryService::new(
            GalleryItemRepository::new(empty()),
            Arc::new(RecordingStore::default()),
        );
        let input = GalleryInput {
            title: Some("Salto".to_string()),
            ..Default::default()
        };

        let result = svc.create(&editor(Role::Admin), input, None, &origin()).await;
        match result {
            Err(AppError::InvalidFields(fields)) => assert!(fields.contains_key(UPLOAD_FIELD)),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejects_non_media_upload() {
        let store = Arc::new(RecordingStore::default());
        let svc = GalleryService::new(GalleryItemRepository::new(empty()), store.clone());
        let input = GalleryInput {
            title: Some("Folleto".to_string()),
            ..Default::default()
        };
        let pdf = FileUpload {
            file_name: "folleto.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            data: bytes::Bytes::from_static(b"%PDF"),
        };

        let result = svc
            .create(&editor(Role::Admin), input, Some(pdf), &origin())
            .await;

        assert!(matches!(result, Err(AppError::InvalidFields(_))));
        assert!(store.folders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_editor_cannot_upload() {
        let svc = GalleryService::new(
            GalleryItemRepository::new(empty()),
            Arc::new(RecordingStore::default()),
        );

        let result = svc
            .create(&editor(Role::Editor), GalleryInput::default(), Some(clip()), &origin())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_patch_without_upload_keeps_media() {
        let url = "https://res.cloudinary.com/demo/gallery/a.jpg";
        let mut reordered = test_item(4, MediaType::Image, url);
        reordered.order = 3;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_item(4, MediaType::Image, url)]])
                .append_query_results([[reordered]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let svc = GalleryService::new(
            GalleryItemRepository::new(db),
            Arc::new(RecordingStore::default()),
        );
        let input = GalleryInput {
            order: Some(3),
            ..Default::default()
        };

        let item = svc
            .update(&editor(Role::Admin), 4, input, None, WriteMode::Partial, &origin())
            .await
            .unwrap();
        assert_eq!(item.order, 3);
        assert_eq!(item.media_file.as_deref(), Some(url));
    }
}
