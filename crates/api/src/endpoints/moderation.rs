//! Review moderation endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use jardin_common::AppResult;
use jardin_core::{ModerationReviewInput, ModerationReviewResponse, Resource, ReviewStatus};
use serde::Deserialize;

use crate::{
    extractors::{CurrentCaller, Payload, RequestOrigin},
    middleware::{AppState, gate_middleware},
    response::{ApiResponse, no_content},
};

/// Filters for the moderation queue.
#[derive(Debug, Deserialize)]
pub struct ModerationQuery {
    /// `approved` lists approved reviews; anything else lists pending ones.
    #[serde(default)]
    pub status: Option<String>,
}

async fn list_reviews(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Query(query): Query<ModerationQuery>,
) -> AppResult<ApiResponse<Vec<ModerationReviewResponse>>> {
    let status = ReviewStatus::from_query(query.status.as_deref());
    let reviews = state
        .review_service
        .moderation_list(&caller, status, &origin)
        .await?;
    Ok(ApiResponse::ok(reviews))
}

async fn get_review(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<ModerationReviewResponse>> {
    let review = state
        .review_service
        .moderation_get(&caller, id, &origin)
        .await?;
    Ok(ApiResponse::ok(review))
}

/// PUT and PATCH both change only `is_approved`.
async fn update_review(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Payload<ModerationReviewInput>,
) -> AppResult<ApiResponse<ModerationReviewResponse>> {
    let review = state
        .review_service
        .moderation_update(&caller, id, payload.input, &origin)
        .await?;
    Ok(ApiResponse::ok(review))
}

async fn delete_review(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    state.review_service.moderation_delete(&caller, id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews))
        .route(
            "/{id}",
            get(get_review)
                .put(update_review)
                .patch(update_review)
                .delete(delete_review),
        )
        .route_layer(from_fn_with_state(
            Resource::ModerationReview,
            gate_middleware,
        ))
}
