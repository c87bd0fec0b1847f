//! Review service: public submission and moderation.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use jardin_common::{AppError, AppResult, MediaStore, form};
use jardin_db::{
    entities::{place, review},
    repositories::{PlaceRepository, ReviewRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{FieldCheck, WriteMode, timestamp};
use crate::{
    policy::{Access, Caller, Resource, authorize},
    representation::{Origin, absolute_media_url},
    upload::FileUpload,
};

/// Rating given when the visitor leaves it out.
const DEFAULT_RATING: i32 = 5;

/// Review submitted through the public endpoint.
///
/// Approval state and timestamps are not accepted here.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReviewInput {
    #[serde(default, deserialize_with = "form::opt_value")]
    pub place: Option<i64>,
    #[serde(default, deserialize_with = "form::opt_value")]
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5."))]
    pub rating: Option<i32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub author_name: Option<String>,
}

/// Moderation change; only the approval flag is writable.
#[derive(Debug, Default, Deserialize)]
pub struct ModerationReviewInput {
    #[serde(default, deserialize_with = "form::opt_bool")]
    pub is_approved: Option<bool>,
}

/// Which reviews the moderation queue lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
}

impl ReviewStatus {
    /// `?status=approved` lists approved reviews; anything else the pending ones.
    #[must_use]
    pub fn from_query(status: Option<&str>) -> Self {
        match status {
            Some("approved") => Self::Approved,
            _ => Self::Pending,
        }
    }
}

/// Public review representation.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub id: i64,
    pub place_name: Option<String>,
    pub place_slug: Option<String>,
    pub rating: i32,
    pub comment: String,
    pub author_name: String,
    pub photo: Option<String>,
    pub is_approved: bool,
    pub created_at: String,
}

impl ReviewResponse {
    pub(crate) fn render(r: review::Model, place: Option<&place::Model>, origin: &Origin) -> Self {
        Self {
            id: r.id,
            place_name: place.map(|p| p.name.clone()),
            place_slug: place.map(|p| p.slug.clone()),
            rating: r.rating,
            comment: r.comment,
            author_name: r.author_name,
            photo: absolute_media_url(origin, r.photo.as_deref()),
            is_approved: r.is_approved,
            created_at: timestamp(&r.created_at),
        }
    }
}

/// Place summary nested in moderation output.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewPlace {
    pub name: String,
    pub slug: String,
}

/// Review representation for moderators.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationReviewResponse {
    pub id: i64,
    pub place: Option<ReviewPlace>,
    pub rating: i32,
    pub comment: String,
    pub author_name: String,
    pub photo: Option<String>,
    pub is_approved: bool,
    pub created_at: String,
}

impl ModerationReviewResponse {
    fn render(r: review::Model, place: Option<&place::Model>, origin: &Origin) -> Self {
        Self {
            id: r.id,
            place: place.map(|p| ReviewPlace {
                name: p.name.clone(),
                slug: p.slug.clone(),
            }),
            rating: r.rating,
            comment: r.comment,
            author_name: r.author_name,
            photo: absolute_media_url(origin, r.photo.as_deref()),
            is_approved: r.is_approved,
            created_at: timestamp(&r.created_at),
        }
    }
}

/// Service for reviews.
#[derive(Clone)]
pub struct ReviewService {
    review_repo: ReviewRepository,
    place_repo: PlaceRepository,
    store: Arc<dyn MediaStore>,
}

impl ReviewService {
    /// Create a new review service.
    #[must_use]
    pub fn new(
        review_repo: ReviewRepository,
        place_repo: PlaceRepository,
        store: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            review_repo,
            place_repo,
            store,
        }
    }

    /// Approved reviews, newest first.
    pub async fn public_list(
        &self,
        caller: &Caller,
        origin: &Origin,
    ) -> AppResult<Vec<ReviewResponse>> {
        authorize(caller, Resource::PublicReview, Access::Read)?;

        let reviews = self.review_repo.list_by_approval(true).await?;
        let places = self.places_of(&reviews).await?;

        Ok(reviews
            .into_iter()
            .map(|r| {
                let place = places.get(&r.place_id);
                ReviewResponse::render(r, place, origin)
            })
            .collect())
    }

    /// Submit a review. It stays hidden until a moderator approves it.
    pub async fn public_create(
        &self,
        caller: &Caller,
        input: ReviewInput,
        photo: Option<FileUpload>,
        origin: &Origin,
    ) -> AppResult<ReviewResponse> {
        authorize(caller, Resource::PublicReview, Access::Write)?;
        input.validate()?;

        let mut check = FieldCheck::new();
        check.require(WriteMode::Full, "place", input.place.is_some());
        check.finish()?;

        let photo_type = photo
            .as_ref()
            .map(|p| p.require_image("photo"))
            .transpose()?;

        let place_id = input.place.unwrap_or_default();
        let place = self.place_repo.find_by_id(place_id).await?.ok_or_else(|| {
            AppError::field(
                "place",
                format!("Invalid pk \"{place_id}\" - object does not exist."),
            )
        })?;

        let photo_url = match (&photo, photo_type) {
            (Some(upload), Some(content_type)) => Some(
                upload
                    .store(self.store.as_ref(), "reviews", &content_type)
                    .await?
                    .secure_url,
            ),
            _ => None,
        };

        let model = review::ActiveModel {
            place_id: Set(place.id),
            rating: Set(input.rating.unwrap_or(DEFAULT_RATING)),
            comment: Set(input.comment.unwrap_or_default()),
            author_name: Set(input.author_name.unwrap_or_default()),
            photo: Set(photo_url),
            is_approved: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let review = self.review_repo.create(model).await?;
        tracing::info!(review_id = review.id, place_id = place.id, "Review submitted");

        Ok(ReviewResponse::render(review, Some(&place), origin))
    }

    /// Moderation queue.
    pub async fn moderation_list(
        &self,
        caller: &Caller,
        status: ReviewStatus,
        origin: &Origin,
    ) -> AppResult<Vec<ModerationReviewResponse>> {
        authorize(caller, Resource::ModerationReview, Access::Read)?;

        let approved = status == ReviewStatus::Approved;
        let reviews = self.review_repo.list_by_approval(approved).await?;
        let places = self.places_of(&reviews).await?;

        Ok(reviews
            .into_iter()
            .map(|r| {
                let place = places.get(&r.place_id);
                ModerationReviewResponse::render(r, place, origin)
            })
            .collect())
    }

    /// Any review, approved or not.
    pub async fn moderation_get(
        &self,
        caller: &Caller,
        id: i64,
        origin: &Origin,
    ) -> AppResult<ModerationReviewResponse> {
        authorize(caller, Resource::ModerationReview, Access::Read)?;

        let review = self.review_repo.get_by_id(id).await?;
        self.render_moderated(review, origin).await
    }

    /// Approve or withdraw a review.
    pub async fn moderation_update(
        &self,
        caller: &Caller,
        id: i64,
        input: ModerationReviewInput,
        origin: &Origin,
    ) -> AppResult<ModerationReviewResponse> {
        authorize(caller, Resource::ModerationReview, Access::Write)?;

        let review = self.review_repo.get_by_id(id).await?;
        let Some(is_approved) = input.is_approved else {
            return self.render_moderated(review, origin).await;
        };

        let mut active: review::ActiveModel = review.into();
        active.is_approved = Set(is_approved);
        let review = self.review_repo.update(active).await?;

        tracing::info!(review_id = review.id, is_approved, "Review moderated");
        self.render_moderated(review, origin).await
    }

    /// Delete a review.
    pub async fn moderation_delete(&self, caller: &Caller, id: i64) -> AppResult<()> {
        authorize(caller, Resource::ModerationReview, Access::Write)?;

        let review = self.review_repo.get_by_id(id).await?;
        self.review_repo.delete(review.id).await
    }

    async fn render_moderated(
        &self,
        review: review::Model,
        origin: &Origin,
    ) -> AppResult<ModerationReviewResponse> {
        let place = self.place_repo.find_by_id(review.place_id).await?;
        Ok(ModerationReviewResponse::render(
            review,
            place.as_ref(),
            origin,
        ))
    }

    async fn places_of(&self, reviews: &[review::Model]) -> AppResult<HashMap<i64, place::Model>> {
        let mut ids: Vec<i64> = reviews.iter().map(|r| r.place_id).collect();
        ids.sort_unstable();
        ids.dedup();

        Ok(self
            .place_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }
}
