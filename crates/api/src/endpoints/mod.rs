//! API endpoints.

mod auth;
mod contact;
mod events;
mod gallery;
mod health;
mod moderation;
mod places;
mod posts;
mod reviews;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/places", places::router())
        .nest("/events", events::router())
        .nest("/posts", posts::router())
        .nest("/reviews", reviews::router())
        .nest("/moderation/reviews", moderation::router())
        .nest("/contact", contact::router())
        .nest("/gallery", gallery::router())
        .nest("/health", health::router())
}
