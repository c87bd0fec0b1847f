//! Post service.

use std::sync::Arc;

use chrono::Utc;
use jardin_common::{AppError, AppResult, MediaStore, form};
use jardin_db::{
    entities::post,
    repositories::{PlaceRepository, PostRepository},
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

/// Post fields for create and update.
///
/// `created_by` is never read from input; the author is the caller.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PostInput {
    #[validate(length(min = 1, max = 180))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "form::nullable_value")]
    pub place: Option<Option<i64>>,
    #[serde(default, deserialize_with = "form::opt_bool")]
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "form::opt_bool")]
    pub is_featured: Option<bool>,
    #[serde(default, deserialize_with = "form::nullable_text")]
    pub cta_url: Option<Option<String>>,
    #[serde(default)]
    #[validate(length(max = 60))]
    pub cta_label: Option<String>,
}

/// Post representation with an absolute cover URL.
#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub place: Option<i64>,
    pub cover: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
    pub cta_url: Option<String>,
    pub cta_label: String,
    pub created_by: Option<i64>,
    pub created_at: String,
}

impl PostResponse {
    fn render(p: post::Model, origin: &Origin) -> Self {
        Self {
            id: p.id,
            title: p.title,
            body: p.body,
            place: p.place_id,
            cover: absolute_media_url(origin, p.cover.as_deref()),
            is_published: p.is_published,
            is_featured: p.is_featured,
            cta_url: p.cta_url,
            cta_label: p.cta_label,
            created_by: p.created_by,
            created_at: timestamp(&p.created_at),
        }
    }
}

/// Service for posts.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    place_repo: PlaceRepository,
    store: Arc<dyn MediaStore>,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        place_repo: PlaceRepository,
        store: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            post_repo,
            place_repo,
            store,
        }
    }

    /// List posts, newest first; `featured_only` keeps featured posts.
    pub async fn list(
        &self,
        caller: &Caller,
        featured_only: bool,
        origin: &Origin,
    ) -> AppResult<Vec<PostResponse>> {
        authorize(caller, Resource::Post, Access::Read)?;

        let posts = self
            .post_repo
            .list(visibility(caller, Resource::Post), featured_only)
            .await?;
        Ok(posts
            .into_iter()
            .map(|p| PostResponse::render(p, origin))
            .collect())
    }

    /// Get a post by ID.
    pub async fn get(&self, caller: &Caller, id: i64, origin: &Origin) -> AppResult<PostResponse> {
        authorize(caller, Resource::Post, Access::Read)?;

        let post = self
            .post_repo
            .get_by_id(id, visibility(caller, Resource::Post))
            .await?;
        Ok(PostResponse::render(post, origin))
    }

    /// Create a post authored by the caller.
    pub async fn create(
        &self,
        caller: &Caller,
        input: PostInput,
        cover: Option<FileUpload>,
        origin: &Origin,
    ) -> AppResult<PostResponse> {
        authorize(caller, Resource::Post, Access::Write)?;
        self.check(&input, WriteMode::Full).await?;
        let cover_url = self.upload_cover(cover.as_ref()).await?;

        let mut model = post::ActiveModel {
            place_id: Set(None),
            cover: Set(cover_url),
            is_published: Set(true),
            is_featured: Set(false),
            cta_url: Set(None),
            cta_label: Set(String::new()),
            created_by: Set(caller.user_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        apply(input, &mut model);

        let post = self.post_repo.create(model).await?;
        tracing::info!(post_id = post.id, author = ?post.created_by, "Post created");

        Ok(PostResponse::render(post, origin))
    }

    /// Replace or patch a post. A new cover replaces the old one.
    pub async fn update(
        &self,
        caller: &Caller,
        id: i64,
        input: PostInput,
        cover: Option<FileUpload>,
        mode: WriteMode,
        origin: &Origin,
    ) -> AppResult<PostResponse> {
        authorize(caller, Resource::Post, Access::Write)?;
        self.check(&input, mode).await?;

        let post = self
            .post_repo
            .get_by_id(id, visibility(caller, Resource::Post))
            .await?;
        let cover_url = self.upload_cover(cover.as_ref()).await?;

        let mut active: post::ActiveModel = post.into();
        apply(input, &mut active);
        if cover_url.is_some() {
            active.cover = Set(cover_url);
        }

        let post = self.post_repo.update(active).await?;
        Ok(PostResponse::render(post, origin))
    }

    /// Delete a post.
    pub async fn delete(&self, caller: &Caller, id: i64) -> AppResult<()> {
        authorize(caller, Resource::Post, Access::Write)?;

        let post = self
            .post_repo
            .get_by_id(id, visibility(caller, Resource::Post))
            .await?;
        self.post_repo.delete(post.id).await
    }

    async fn check(&self, input: &PostInput, mode: WriteMode) -> AppResult<()> {
        input.validate()?;

        let mut check = FieldCheck::new();
        check.require(mode, "title", input.title.is_some());
        check.require(mode, "body", input.body.is_some());

        if let Some(Some(cta_url)) = &input.cta_url
            && url::Url::parse(cta_url).is_err()
        {
            check.push("cta_url", "Enter a valid URL.");
        }
        check.finish()?;

        if let Some(Some(place_id)) = input.place
            && self.place_repo.find_by_id(place_id).await?.is_none()
        {
            return Err(AppError::field(
                "place",
                format!("Invalid pk \"{place_id}\" - object does not exist."),
            ));
        }

        Ok(())
    }

    async fn upload_cover(&self, cover: Option<&FileUpload>) -> AppResult<Option<String>> {
        let Some(cover) = cover else {
            return Ok(None);
        };
        let content_type = cover.require_image("cover")?;
        let stored = cover
            .store(self.store.as_ref(), "posts", &content_type)
            .await?;
        Ok(Some(stored.secure_url))
    }
}

fn apply(input: PostInput, active: &mut post::ActiveModel) {
    if let Some(title) = input.title {
        active.title = Set(title);
    }
    if let Some(body) = input.body {
        active.body = Set(body);
    }
    if let Some(place) = input.place {
        active.place_id = Set(place);
    }
    if let Some(is_published) = input.is_published {
        active.is_published = Set(is_published);
    }
    if let Some(is_featured) = input.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(cta_url) = input.cta_url {
        active.cta_url = Set(cta_url);
    }
    if let Some(cta_label) = input.cta_label {
        active.cta_label = Set(cta_label);
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

    fn test_post(id: i64, cover: Option<&str>) -> post::Model {
        post::Model {
            id,
            title: "Temporada de cascadas".to_string(),
            body: "Texto".to_string(),
            place_id: None,
            cover: cover.map(str::to_string),
            is_published: true,
            is_featured: false,
            cta_url: None,
            cta_label: String::new(),
            created_by: Some(42),
            created_at: Utc::now().into(),
        }
    }

    fn empty() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn origin() -> Origin {
        Origin::new("http", "localhost:8000")
    }

    fn input() -> PostInput {
        PostInput {
            title: Some("Temporada de cascadas".to_string()),
            body: Some("Texto".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cover_is_absolute() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post(1, Some("posts/cover1.jpg"))]])
                .into_connection(),
        );
        let svc = PostService::new(
            PostRepository::new(post_db),
            PlaceRepository::new(empty()),
            Arc::new(RecordingStore::default()),
        );

        let post = svc.get(&Caller::anonymous(), 1, &origin()).await.unwrap();
        assert_eq!(
            post.cover.as_deref(),
            Some("http://localhost:8000/posts/cover1.jpg")
        );
    }

    #[tokio::test]
    async fn test_create_ignores_supplied_author() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post(1, None)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 1,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let svc = PostService::new(
            PostRepository::new(post_db.clone()),
            PlaceRepository::new(empty()),
            Arc::new(RecordingStore::default()),
        );

        let input: PostInput = serde_json::from_value(serde_json::json!({
            "title": "Temporada de cascadas",
            "body": "Texto",
            "created_by": 7
        }))
        .unwrap();

        let post = svc
            .create(&editor(Role::Editor), input, None, &origin())
            .await
            .unwrap();
        drop(svc);

        assert_eq!(post.created_by, Some(42));
        let log = logged_statements(post_db);
        assert!(log[0].contains("BigInt(Some(42))"));
        assert!(!log[0].contains("BigInt(Some(7))"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_cta_url() {
        let svc = PostService::new(
            PostRepository::new(empty()),
            PlaceRepository::new(empty()),
            Arc::new(RecordingStore::default()),
        );
        let mut input = input();
        input.cta_url = Some(Some("not a url".to_string()));

        let result = svc.create(&editor(Role::Editor), input, None, &origin()).await;
        match result {
            Err(AppError::InvalidFields(fields)) => assert!(fields.contains_key("cta_url")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cover_goes_to_posts_folder() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post(
                    1,
                    Some("https://res.cloudinary.com/demo/posts/cover.png"),
                )]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 1,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let store = Arc::new(RecordingStore::default());
        let svc = PostService::new(
            PostRepository::new(post_db),
            PlaceRepository::new(empty()),
            store.clone(),
        );
        let cover = FileUpload {
            file_name: "cover.png".to_string(),
            content_type: Some("image/png".to_string()),
            data: bytes::Bytes::from_static(b"png"),
        };

        let post = svc
            .create(&editor(Role::Admin), input(), Some(cover), &origin())
            .await
            .unwrap();

        assert_eq!(
            post.cover.as_deref(),
            Some("https://res.cloudinary.com/demo/posts/cover.png")
        );
        assert_eq!(*store.folders.lock().unwrap(), vec!["posts".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_cover_upload_writes_nothing() {
        let post_db = empty();
        let svc = PostService::new(
            PostRepository::new(post_db.clone()),
            PlaceRepository::new(empty()),
            Arc::new(FailingStore),
        );
        let cover = FileUpload {
            file_name: "cover.jpg".to_string(),
            content_type: None,
            data: bytes::Bytes::from_static(b"jpg"),
        };

        let result = svc
            .create(&editor(Role::Editor), input(), Some(cover), &origin())
            .await;
        drop(svc);

        match result {
            Err(AppError::Upload(message)) => assert_eq!(message, "Invalid image file"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(logged_statements(post_db).is_empty());
    }
}
