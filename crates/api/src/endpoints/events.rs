//! Event endpoints.

use axum::{
    Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use jardin_common::AppResult;
use jardin_core::{EventInput, EventResponse, Resource, WriteMode};

use crate::{
    extractors::{CurrentCaller, Payload},
    middleware::{AppState, gate_middleware},
    response::{ApiResponse, no_content},
};

async fn list_events(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<EventResponse>>> {
    let events = state.event_service.list(&caller).await?;
    Ok(ApiResponse::ok(events))
}

async fn get_event(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state.event_service.get(&caller, id).await?;
    Ok(ApiResponse::ok(event))
}

async fn create_event(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    payload: Payload<EventInput>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state.event_service.create(&caller, payload.input).await?;
    Ok(ApiResponse::created(event))
}

async fn replace_event(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Payload<EventInput>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state
        .event_service
        .update(&caller, id, payload.input, WriteMode::Full)
        .await?;
    Ok(ApiResponse::ok(event))
}

async fn patch_event(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Payload<EventInput>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state
        .event_service
        .update(&caller, id, payload.input, WriteMode::Partial)
        .await?;
    Ok(ApiResponse::ok(event))
}

async fn delete_event(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    state.event_service.delete(&caller, id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route(
            "/{id}",
            get(get_event)
                .put(replace_event)
                .patch(patch_event)
                .delete(delete_event),
        )
        .route_layer(from_fn_with_state(Resource::Event, gate_middleware))
}
