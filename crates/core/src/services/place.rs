//! Place service.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use jardin_common::{AppError, AppResult, MediaStore, form};
use jardin_db::{
    entities::{media, place, place::PlaceCategory, review},
    repositories::{MediaRepository, PlaceRepository, ReviewRepository},
};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{FieldCheck, WriteMode, review::ReviewResponse, timestamp};
use crate::{
    policy::{Access, Caller, Resource, authorize, visibility},
    representation::{Origin, absolute_media_url, average_rating},
    upload::FileUpload,
};

#[allow(clippy::unwrap_used)]
static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());

/// Coordinates are stored as decimal(9, 6).
const COORDINATE_SCALE: u32 = 6;
const COORDINATE_LIMIT: i64 = 1000;

/// Place fields for create and update.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PlaceInput {
    #[validate(length(min = 1, max = 180))]
    pub name: Option<String>,
    #[validate(
        length(min = 1, max = 200),
        regex(
            path = *SLUG_PATTERN,
            message = "Enter a valid slug consisting of letters, numbers, underscores or hyphens."
        )
    )]
    pub slug: Option<String>,
    #[serde(default)]
    pub category: Option<PlaceCategory>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "form::nullable_value")]
    pub lat: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "form::nullable_value")]
    pub lng: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "form::opt_bool")]
    pub is_active: Option<bool>,
}

impl PlaceInput {
    fn check(&self, mode: WriteMode) -> AppResult<()> {
        let mut check = FieldCheck::new();
        check.require(mode, "name", self.name.is_some());
        check.require(mode, "slug", self.slug.is_some());

        for (field, value) in [("lat", &self.lat), ("lng", &self.lng)] {
            if let Some(Some(coordinate)) = value {
                if coordinate.scale() > COORDINATE_SCALE {
                    check.push(field, "Ensure that there are no more than 6 decimal places.");
                }
                if coordinate.abs() >= Decimal::from(COORDINATE_LIMIT) {
                    check.push(
                        field,
                        "Ensure that there are no more than 3 digits before the decimal point.",
                    );
                }
            }
        }

        check.finish()
    }

    fn apply(self, active: &mut place::ActiveModel) {
        if let Some(name) = self.name {
            active.name = Set(name);
        }
        if let Some(slug) = self.slug {
            active.slug = Set(slug);
        }
        if let Some(category) = self.category {
            active.category = Set(category);
        }
        if let Some(description) = self.description {
            active.description = Set(description);
        }
        if let Some(address) = self.address {
            active.address = Set(address);
        }
        if let Some(lat) = self.lat {
            active.lat = Set(lat);
        }
        if let Some(lng) = self.lng {
            active.lng = Set(lng);
        }
        if let Some(is_active) = self.is_active {
            active.is_active = Set(is_active);
        }
    }
}

/// Caption sent alongside a place image.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct MediaInput {
    #[serde(default)]
    #[validate(length(max = 150))]
    pub caption: Option<String>,
}

/// Image attached to a place.
#[derive(Debug, Clone, Serialize)]
pub struct MediaResponse {
    pub id: i64,
    pub image: Option<String>,
    pub caption: String,
    pub created_at: String,
}

impl MediaResponse {
    fn render(m: media::Model, origin: &Origin) -> Self {
        Self {
            id: m.id,
            image: absolute_media_url(origin, Some(&m.image)),
            caption: m.caption,
            created_at: timestamp(&m.created_at),
        }
    }
}

/// Place with its images, approved reviews and their average rating.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category: PlaceCategory,
    pub description: String,
    pub address: String,
    pub lat: Option<Decimal>,
    pub lng: Option<Decimal>,
    pub is_active: bool,
    pub media: Vec<MediaResponse>,
    pub avg_rating: Option<f64>,
    pub reviews: Vec<ReviewResponse>,
    pub created_at: String,
}

impl PlaceResponse {
    fn render(
        p: place::Model,
        media: Vec<media::Model>,
        reviews: Vec<review::Model>,
        origin: &Origin,
    ) -> Self {
        let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
        let reviews = reviews
            .into_iter()
            .map(|r| ReviewResponse::render(r, Some(&p), origin))
            .collect();

        Self {
            id: p.id,
            name: p.name,
            slug: p.slug,
            category: p.category,
            description: p.description,
            address: p.address,
            lat: p.lat,
            lng: p.lng,
            is_active: p.is_active,
            media: media
                .into_iter()
                .map(|m| MediaResponse::render(m, origin))
                .collect(),
            avg_rating: average_rating(&ratings),
            reviews,
            created_at: timestamp(&p.created_at),
        }
    }
}

/// Service for places and their images.
#[derive(Clone)]
pub struct PlaceService {
    place_repo: PlaceRepository,
    media_repo: MediaRepository,
    review_repo: ReviewRepository,
    store: Arc<dyn MediaStore>,
}

impl PlaceService {
    /// Create a new place service.
    #[must_use]
    pub fn new(
        place_repo: PlaceRepository,
        media_repo: MediaRepository,
        review_repo: ReviewRepository,
        store: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            place_repo,
            media_repo,
            review_repo,
            store,
        }
    }

    /// List places visible to the caller.
    pub async fn list(
        &self,
        caller: &Caller,
        category: Option<PlaceCategory>,
        origin: &Origin,
    ) -> AppResult<Vec<PlaceResponse>> {
        authorize(caller, Resource::Place, Access::Read)?;

        let places = self
            .place_repo
            .list(visibility(caller, Resource::Place), category)
            .await?;
        self.render_all(places, origin).await
    }

    /// Get a place by slug.
    pub async fn get(&self, caller: &Caller, slug: &str, origin: &Origin) -> AppResult<PlaceResponse> {
        authorize(caller, Resource::Place, Access::Read)?;

        let place = self
            .place_repo
            .get_by_slug(slug, visibility(caller, Resource::Place))
            .await?;
        self.render_one(place, origin).await
    }

    /// Create a place owned by the caller.
    pub async fn create(
        &self,
        caller: &Caller,
        input: PlaceInput,
        origin: &Origin,
    ) -> AppResult<PlaceResponse> {
        authorize(caller, Resource::Place, Access::Write)?;
        input.validate()?;
        input.check(WriteMode::Full)?;

        let slug = input.slug.clone().unwrap_or_default();
        if self.place_repo.slug_taken(&slug, None).await? {
            return Err(AppError::Conflict(format!("Place slug already exists: {slug}")));
        }

        let mut model = place::ActiveModel {
            category: Set(PlaceCategory::default()),
            description: Set(String::new()),
            address: Set(String::new()),
            lat: Set(None),
            lng: Set(None),
            is_active: Set(true),
            created_by: Set(caller.user_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        input.apply(&mut model);

        let place = self.place_repo.create(model).await?;
        tracing::info!(place_id = place.id, slug = %place.slug, "Place created");

        Ok(PlaceResponse::render(place, vec![], vec![], origin))
    }

    /// Replace (`WriteMode::Full`) or patch a place.
    pub async fn update(
        &self,
        caller: &Caller,
        slug: &str,
        input: PlaceInput,
        mode: WriteMode,
        origin: &Origin,
    ) -> AppResult<PlaceResponse> {
        authorize(caller, Resource::Place, Access::Write)?;
        input.validate()?;
        input.check(mode)?;

        let place = self
            .place_repo
            .get_by_slug(slug, visibility(caller, Resource::Place))
            .await?;

        if let Some(new_slug) = input.slug.as_deref()
            && new_slug != place.slug
            && self.place_repo.slug_taken(new_slug, Some(place.id)).await?
        {
            return Err(AppError::Conflict(format!(
                "Place slug already exists: {new_slug}"
            )));
        }

        let mut active: place::ActiveModel = place.into();
        input.apply(&mut active);
        let place = self.place_repo.update(active).await?;

        tracing::info!(place_id = place.id, "Place updated");
        self.render_one(place, origin).await
    }

    /// Delete a place with its images and reviews.
    pub async fn delete(&self, caller: &Caller, slug: &str) -> AppResult<()> {
        authorize(caller, Resource::Place, Access::Write)?;

        let place = self
            .place_repo
            .get_by_slug(slug, visibility(caller, Resource::Place))
            .await?;
        self.place_repo.delete(place.id).await?;

        tracing::info!(place_id = place.id, "Place deleted");
        Ok(())
    }

    /// Upload an image and attach it to a place.
    pub async fn add_media(
        &self,
        caller: &Caller,
        slug: &str,
        input: MediaInput,
        image: Option<FileUpload>,
        origin: &Origin,
    ) -> AppResult<MediaResponse> {
        authorize(caller, Resource::PlaceMedia, Access::Write)?;
        input.validate()?;

        let image = image.ok_or_else(|| AppError::field("image", "No file was submitted."))?;
        let content_type = image.require_image("image")?;

        let place = self
            .place_repo
            .get_by_slug(slug, visibility(caller, Resource::PlaceMedia))
            .await?;

        let stored = image
            .store(self.store.as_ref(), "places", &content_type)
            .await?;

        let media = self
            .media_repo
            .create(media::ActiveModel {
                place_id: Set(place.id),
                image: Set(stored.secure_url),
                caption: Set(input.caption.unwrap_or_default()),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .await?;

        Ok(MediaResponse::render(media, origin))
    }

    async fn render_one(&self, place: place::Model, origin: &Origin) -> AppResult<PlaceResponse> {
        let mut rendered = self.render_all(vec![place], origin).await?;
        rendered
            .pop()
            .ok_or_else(|| AppError::Internal("Place rendering produced nothing".to_string()))
    }

    async fn render_all(
        &self,
        places: Vec<place::Model>,
        origin: &Origin,
    ) -> AppResult<Vec<PlaceResponse>> {
        if places.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i64> = places.iter().map(|p| p.id).collect();

        let mut media_by_place: HashMap<i64, Vec<media::Model>> = HashMap::new();
        for m in self.media_repo.find_by_place_ids(&ids).await? {
            media_by_place.entry(m.place_id).or_default().push(m);
        }

        let mut reviews_by_place: HashMap<i64, Vec<review::Model>> = HashMap::new();
        for r in self.review_repo.find_approved_by_place_ids(&ids).await? {
            reviews_by_place.entry(r.place_id).or_default().push(r);
        }

        Ok(places
            .into_iter()
            .map(|p| {
                let media = media_by_place.remove(&p.id).unwrap_or_default();
                let reviews = reviews_by_place.remove(&p.id).unwrap_or_default();
                PlaceResponse::render(p, media, reviews, origin)
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use crate::services::test_support::{FailingStore, RecordingStore, editor, test_place};
    use jardin_db::test_utils::logged_statements;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    struct Dbs {
        place: Arc<DatabaseConnection>,
        media: Arc<DatabaseConnection>,
        review: Arc<DatabaseConnection>,
    }

    impl Dbs {
        fn service(&self, store: Arc<dyn MediaStore>) -> PlaceService {
            PlaceService::new(
                PlaceRepository::new(self.place.clone()),
                MediaRepository::new(self.media.clone()),
                ReviewRepository::new(self.review.clone()),
                store,
            )
        }
    }

    fn empty() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn origin() -> Origin {
        Origin::new("https", "jardin.example")
    }

    fn approved(id: i64, place_id: i64, rating: i32) -> review::Model {
        review::Model {
            id,
            place_id,
            rating,
            comment: String::new(),
            author_name: String::new(),
            photo: None,
            is_approved: true,
            created_at: Utc::now().into(),
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn test_list_attaches_media_and_rating() {
        let dbs = Dbs {
            place: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[test_place(1, "mirador"), test_place(2, "cascada")]])
                    .into_connection(),
            ),
            media: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[media::Model {
                        id: 9,
                        place_id: 1,
                        image: "places/2025/01/01/a.jpg".to_string(),
                        caption: "Vista".to_string(),
                        created_at: Utc::now().into(),
                    }]])
                    .into_connection(),
            ),
            review: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[approved(1, 1, 5), approved(2, 1, 4), approved(3, 1, 4)]])
                    .into_connection(),
            ),
        };

        let places = dbs
            .service(Arc::new(RecordingStore::default()))
            .list(&Caller::anonymous(), None, &origin())
            .await
            .unwrap();

        assert_eq!(places.len(), 2);
        assert_eq!(places[0].avg_rating, Some(4.33));
        assert_eq!(places[0].reviews.len(), 3);
        assert_eq!(
            places[0].media[0].image.as_deref(),
            Some("https://jardin.example/places/2025/01/01/a.jpg")
        );
        assert_eq!(places[1].avg_rating, None);
        assert!(places[1].media.is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_create_is_unauthorized() {
        let dbs = Dbs {
            place: empty(),
            media: empty(),
            review: empty(),
        };
        let input = PlaceInput {
            name: Some("Mirador".to_string()),
            slug: Some("mirador".to_string()),
            ..Default::default()
        };

        let result = dbs
            .service(Arc::new(RecordingStore::default()))
            .create(&Caller::anonymous(), input, &origin())
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_slug_and_coordinates() {
        let dbs = Dbs {
            place: empty(),
            media: empty(),
            review: empty(),
        };
        let input = PlaceInput {
            name: Some("Mirador".to_string()),
            slug: Some("mirador alto".to_string()),
            lat: Some(Some(Decimal::new(-34_1234567, 7))),
            ..Default::default()
        };

        let svc = dbs.service(Arc::new(RecordingStore::default()));
        let result = svc.create(&editor(Role::Editor), input, &origin()).await;
        match result {
            Err(AppError::InvalidFields(fields)) => assert!(fields.contains_key("slug")),
            other => panic!("unexpected result: {other:?}"),
        }

        let input = PlaceInput {
            name: Some("Mirador".to_string()),
            slug: Some("mirador-alto".to_string()),
            lat: Some(Some(Decimal::new(-34_1234567, 7))),
            ..Default::default()
        };
        let result = svc.create(&editor(Role::Editor), input, &origin()).await;
        match result {
            Err(AppError::InvalidFields(fields)) => assert!(fields.contains_key("lat")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_duplicate_slug_is_conflict() {
        let dbs = Dbs {
            place: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[count_row(1)]])
                    .into_connection(),
            ),
            media: empty(),
            review: empty(),
        };
        let input = PlaceInput {
            name: Some("Mirador".to_string()),
            slug: Some("mirador".to_string()),
            ..Default::default()
        };

        let result = dbs
            .service(Arc::new(RecordingStore::default()))
            .create(&editor(Role::Admin), input, &origin())
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_stamps_creator() {
        let mut created = test_place(5, "mirador");
        created.created_by = Some(42);

        let place_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(0)]])
                .append_query_results([[created]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 5,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let dbs = Dbs {
            place: place_db.clone(),
            media: empty(),
            review: empty(),
        };
        let input = PlaceInput {
            name: Some("Mirador".to_string()),
            slug: Some("mirador".to_string()),
            ..Default::default()
        };

        let svc = dbs.service(Arc::new(RecordingStore::default()));
        let response = svc
            .create(&editor(Role::Editor), input, &origin())
            .await
            .unwrap();
        drop(svc);
        drop(dbs);

        assert_eq!(response.slug, "mirador");
        assert!(response.media.is_empty());
        assert_eq!(response.avg_rating, None);

        let log = logged_statements(place_db);
        assert_eq!(log.len(), 2);
        assert!(log[1].contains("INSERT"));
        assert!(log[1].contains("BigInt(Some(42))"));
    }

    #[tokio::test]
    async fn test_add_media_rejects_video() {
        let dbs = Dbs {
            place: empty(),
            media: empty(),
            review: empty(),
        };
        let upload = FileUpload {
            file_name: "clip.mp4".to_string(),
            content_type: Some("video/mp4".to_string()),
            data: bytes::Bytes::from_static(b"mp4"),
        };

        let result = dbs
            .service(Arc::new(RecordingStore::default()))
            .add_media(
                &editor(Role::Editor),
                "mirador",
                MediaInput::default(),
                Some(upload),
                &origin(),
            )
            .await;
        match result {
            Err(AppError::InvalidFields(fields)) => assert!(fields.contains_key("image")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_media_upload_failure_writes_nothing() {
        let media_db = empty();
        let dbs = Dbs {
            place: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[test_place(1, "mirador")]])
                    .into_connection(),
            ),
            media: media_db.clone(),
            review: empty(),
        };
        let upload = FileUpload {
            file_name: "foto.png".to_string(),
            content_type: Some("image/png".to_string()),
            data: bytes::Bytes::from_static(b"png"),
        };

        let svc = dbs.service(Arc::new(FailingStore));
        let result = svc
            .add_media(
                &editor(Role::Editor),
                "mirador",
                MediaInput::default(),
                Some(upload),
                &origin(),
            )
            .await;
        drop(svc);
        drop(dbs);

        assert!(matches!(result, Err(AppError::Upload(_))));
        assert!(logged_statements(media_db).is_empty());
    }
}
