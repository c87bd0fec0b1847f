//! Place endpoints, including place media uploads.

use axum::{
    Router,
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use jardin_common::AppResult;
use jardin_core::{
    MediaInput, MediaResponse, PlaceInput, PlaceResponse, Resource, WriteMode,
};
use jardin_db::entities::place::PlaceCategory;
use serde::Deserialize;

use crate::{
    extractors::{CurrentCaller, Payload, RequestOrigin},
    middleware::{AppState, gate_middleware},
    response::{ApiResponse, no_content},
};

/// Multipart field carrying a place image.
const IMAGE_FIELD: &str = "image";

/// Filters for the place list.
#[derive(Debug, Deserialize)]
pub struct ListPlacesQuery {
    #[serde(default)]
    pub category: Option<PlaceCategory>,
}

async fn list_places(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Query(query): Query<ListPlacesQuery>,
) -> AppResult<ApiResponse<Vec<PlaceResponse>>> {
    let places = state
        .place_service
        .list(&caller, query.category, &origin)
        .await?;
    Ok(ApiResponse::ok(places))
}

async fn get_place(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<PlaceResponse>> {
    let place = state.place_service.get(&caller, &slug, &origin).await?;
    Ok(ApiResponse::ok(place))
}

async fn create_place(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    payload: Payload<PlaceInput>,
) -> AppResult<ApiResponse<PlaceResponse>> {
    let place = state
        .place_service
        .create(&caller, payload.input, &origin)
        .await?;
    Ok(ApiResponse::created(place))
}

async fn replace_place(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    payload: Payload<PlaceInput>,
) -> AppResult<ApiResponse<PlaceResponse>> {
    let place = state
        .place_service
        .update(&caller, &slug, payload.input, WriteMode::Full, &origin)
        .await?;
    Ok(ApiResponse::ok(place))
}

async fn patch_place(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    payload: Payload<PlaceInput>,
) -> AppResult<ApiResponse<PlaceResponse>> {
    let place = state
        .place_service
        .update(&caller, &slug, payload.input, WriteMode::Partial, &origin)
        .await?;
    Ok(ApiResponse::ok(place))
}

async fn delete_place(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.place_service.delete(&caller, &slug).await?;
    Ok(no_content())
}

async fn add_media(
    CurrentCaller(caller): CurrentCaller,
    RequestOrigin(origin): RequestOrigin,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    mut payload: Payload<MediaInput>,
) -> AppResult<ApiResponse<MediaResponse>> {
    let image = payload.take_file(IMAGE_FIELD);
    let media = state
        .place_service
        .add_media(&caller, &slug, payload.input, image, &origin)
        .await?;
    Ok(ApiResponse::created(media))
}

pub fn router() -> Router<AppState> {
    let media = Router::new()
        .route("/{slug}/media", post(add_media))
        .route_layer(from_fn_with_state(Resource::PlaceMedia, gate_middleware));

    Router::new()
        .route("/", get(list_places).post(create_place))
        .route(
            "/{slug}",
            get(get_place)
                .put(replace_place)
                .patch(patch_place)
                .delete(delete_place),
        )
        .route_layer(from_fn_with_state(Resource::Place, gate_middleware))
        .merge(media)
}
