//! Authentication endpoints.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use jardin_common::AppResult;
use jardin_core::{LoginInput, MeResponse, RegisterInput, RegisteredAccount, TokenResponse};

use crate::{
    extractors::{CurrentCaller, Payload},
    middleware::AppState,
    response::ApiResponse,
};

/// Create an account and its token.
async fn register(
    State(state): State<AppState>,
    payload: Payload<RegisterInput>,
) -> AppResult<ApiResponse<RegisteredAccount>> {
    let account = state.account_service.register(payload.input).await?;
    Ok(ApiResponse::created(account))
}

/// Exchange credentials for the account's token.
async fn login(
    State(state): State<AppState>,
    payload: Payload<LoginInput>,
) -> AppResult<ApiResponse<TokenResponse>> {
    let token = state.account_service.login(payload.input).await?;
    Ok(ApiResponse::ok(token))
}

async fn me(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MeResponse>> {
    let me = state.account_service.me(&caller).await?;
    Ok(ApiResponse::ok(me))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token/login", post(login))
        .route("/login", post(login))
        .route("/me", get(me))
}
