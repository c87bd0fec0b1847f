//! HTTP API layer for jardin.
//!
//! - **Endpoints**: places, events, posts, reviews, moderation, contacts,
//!   gallery and accounts
//! - **Extractors**: caller, request origin, JSON-or-multipart payloads
//! - **Middleware**: token authentication and per-resource access gates
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::Router;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware, gate_middleware};

/// The API mounted under `/api` with authentication applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
