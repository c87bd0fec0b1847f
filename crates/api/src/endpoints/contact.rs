//! Contact directory endpoints.

use axum::{
    Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use jardin_common::AppResult;
use jardin_core::{ContactInput, ContactResponse, Resource, WriteMode};

use crate::{
    extractors::{CurrentCaller, Payload},
    middleware::{AppState, gate_middleware},
    response::{ApiResponse, no_content},
};

async fn list_contacts(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ContactResponse>>> {
    let contacts = state.contact_service.list(&caller).await?;
    Ok(ApiResponse::ok(contacts))
}

async fn get_contact(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<ContactResponse>> {
    let contact = state.contact_service.get(&caller, id).await?;
    Ok(ApiResponse::ok(contact))
}

async fn create_contact(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    payload: Payload<ContactInput>,
) -> AppResult<ApiResponse<ContactResponse>> {
    let contact = state.contact_service.create(&caller, payload.input).await?;
    Ok(ApiResponse::created(contact))
}

async fn replace_contact(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Payload<ContactInput>,
) -> AppResult<ApiResponse<ContactResponse>> {
    let contact = state
        .contact_service
        .update(&caller, id, payload.input, WriteMode::Full)
        .await?;
    Ok(ApiResponse::ok(contact))
}

async fn patch_contact(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Payload<ContactInput>,
) -> AppResult<ApiResponse<ContactResponse>> {
    let contact = state
        .contact_service
        .update(&caller, id, payload.input, WriteMode::Partial)
        .await?;
    Ok(ApiResponse::ok(contact))
}

async fn delete_contact(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    state.contact_service.delete(&caller, id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route(
            "/{id}",
            get(get_contact)
                .put(replace_contact)
                .patch(patch_contact)
                .delete(delete_contact),
        )
        .route_layer(from_fn_with_state(Resource::ContactInfo, gate_middleware))
}
