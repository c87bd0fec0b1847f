//! Gallery endpoints.

use axum::{
    Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use jardin_common::AppResult;
use jardin_core::{
    GalleryInput, GalleryItemResponse, Resource, WriteMode, services::gallery::UPLOAD_FIELD,
};

use crate::{
    extractors::{CurrentCaller, Payload, RequestOrigin},
    middleware::{AppState, gate_middleware},
    response::{ApiResponse, no_content},
};

async fn list_items(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<GalleryItemResponse>>> {
    let items = state.gallery_service.list(&caller, &origin).await?;
    Ok(ApiResponse::ok(items))
}

async fn get_item(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<GalleryItemResponse>> {
    let item = state.gallery_service.get(&caller, id, &origin).await?;
    Ok(ApiResponse::ok(item))
}

async fn create_item(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    mut payload: Payload<GalleryInput>,
) -> AppResult<ApiResponse<GalleryItemResponse>> {
    let upload = payload.take_file(UPLOAD_FIELD);
    let item = state
        .gallery_service
        .create(&caller, payload.input, upload, &origin)
        .await?;
    Ok(ApiResponse::created(item))
}

async fn replace_item(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut payload: Payload<GalleryInput>,
) -> AppResult<ApiResponse<GalleryItemResponse>> {
    let upload = payload.take_file(UPLOAD_FIELD);
    let item = state
        .gallery_service
        .update(&caller, id, payload.input, upload, WriteMode::Full, &origin)
        .await?;
    Ok(ApiResponse::ok(item))
}

async fn patch_item(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut payload: Payload<GalleryInput>,
) -> AppResult<ApiResponse<GalleryItemResponse>> {
    let upload = payload.take_file(UPLOAD_FIELD);
    let item = state
        .gallery_service
        .update(&caller, id, payload.input, upload, WriteMode::Partial, &origin)
        .await?;
    Ok(ApiResponse::ok(item))
}

async fn delete_item(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    state.gallery_service.delete(&caller, id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route(
            "/{id}",
            get(get_item)
                .put(replace_item)
                .patch(patch_item)
                .delete(delete_item),
        )
        .route_layer(from_fn_with_state(Resource::GalleryItem, gate_middleware))
}
