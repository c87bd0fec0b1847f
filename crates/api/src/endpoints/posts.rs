//! Post endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use jardin_common::{AppResult, form};
use jardin_core::{PostInput, PostResponse, Resource, WriteMode};
use serde::Deserialize;

use crate::{
    extractors::{CurrentCaller, Payload, RequestOrigin},
    middleware::{AppState, gate_middleware},
    response::{ApiResponse, no_content},
};

/// Multipart field carrying the cover image.
const COVER_FIELD: &str = "cover";

/// Filters for the post list.
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    /// `true`, `1`, `yes` or `on` keeps featured posts only.
    #[serde(default)]
    pub featured: Option<String>,
}

async fn list_posts(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let featured_only = query
        .featured
        .as_deref()
        .and_then(form::parse_bool)
        .unwrap_or(false);
    let posts = state
        .post_service
        .list(&caller, featured_only, &origin)
        .await?;
    Ok(ApiResponse::ok(posts))
}

async fn get_post(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get(&caller, id, &origin).await?;
    Ok(ApiResponse::ok(post))
}

async fn create_post(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    mut payload: Payload<PostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let cover = payload.take_file(COVER_FIELD);
    let post = state
        .post_service
        .create(&caller, payload.input, cover, &origin)
        .await?;
    Ok(ApiResponse::created(post))
}

async fn replace_post(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut payload: Payload<PostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let cover = payload.take_file(COVER_FIELD);
    let post = state
        .post_service
        .update(&caller, id, payload.input, cover, WriteMode::Full, &origin)
        .await?;
    Ok(ApiResponse::ok(post))
}

async fn patch_post(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut payload: Payload<PostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let cover = payload.take_file(COVER_FIELD);
    let post = state
        .post_service
        .update(&caller, id, payload.input, cover, WriteMode::Partial, &origin)
        .await?;
    Ok(ApiResponse::ok(post))
}

async fn delete_post(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    state.post_service.delete(&caller, id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route(
            "/{id}",
            get(get_post)
                .put(replace_post)
                .patch(patch_post)
                .delete(delete_post),
        )
        .route_layer(from_fn_with_state(Resource::Post, gate_middleware))
}
