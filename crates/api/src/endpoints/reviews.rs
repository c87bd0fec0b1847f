//! Public review endpoints.
//!
//! Anyone may list approved reviews and submit a new one; submissions wait
//! for moderation.

use axum::{Router, extract::State, middleware::from_fn_with_state, routing::get};
use jardin_common::AppResult;
use jardin_core::{Resource, ReviewInput, ReviewResponse};

use crate::{
    extractors::{CurrentCaller, Payload, RequestOrigin},
    middleware::{AppState, gate_middleware},
    response::ApiResponse,
};

/// Multipart field carrying an optional photo.
const PHOTO_FIELD: &str = "photo";

async fn list_reviews(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ReviewResponse>>> {
    let reviews = state.review_service.public_list(&caller, &origin).await?;
    Ok(ApiResponse::ok(reviews))
}

async fn create_review(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    mut payload: Payload<ReviewInput>,
) -> AppResult<ApiResponse<ReviewResponse>> {
    let photo = payload.take_file(PHOTO_FIELD);
    let review = state
        .review_service
        .public_create(&caller, payload.input, photo, &origin)
        .await?;
    Ok(ApiResponse::created(review))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route_layer(from_fn_with_state(Resource::PublicReview, gate_middleware))
}
