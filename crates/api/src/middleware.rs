//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jardin_core::{
    Access, AccountService, Caller, ContactService, EventService, GalleryService, Origin,
    PlaceService, PostService, Resource, ReviewService, authorize,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub place_service: PlaceService,
    pub event_service: EventService,
    pub post_service: PostService,
    pub review_service: ReviewService,
    pub contact_service: ContactService,
    pub gallery_service: GalleryService,
    pub account_service: AccountService,
    /// Origin used when a request carries no `Host` header.
    pub site_origin: Origin,
    /// Whether `X-Forwarded-Proto` decides the scheme of media URLs.
    pub trust_forwarded_proto: bool,
}

/// Token key from an `Authorization: Token <key>` or `Bearer <key>` header.
fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        Some(key.trim()).filter(|k| !k.is_empty())
    } else {
        None
    }
}

/// Authentication middleware.
///
/// Every request leaves with a [`Caller`] in its extensions; unknown or
/// missing tokens give an anonymous caller.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let key = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(token_from_header)
        .map(str::to_string);

    let caller = match key {
        Some(key) => match state.account_service.authenticate(&key).await {
            Ok(Some(caller)) => caller,
            Ok(None) => {
                tracing::debug!("Unknown API token; continuing anonymously");
                Caller::anonymous()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token lookup failed; continuing anonymously");
                Caller::anonymous()
            }
        },
        None => Caller::anonymous(),
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

/// Access gate for one resource, applied as a route layer.
///
/// Runs before any extractor, so a caller who may not touch `resource` is
/// turned away before the request body is read. Services repeat the check.
pub async fn gate_middleware(
    State(resource): State<Resource>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let caller = req
        .extensions()
        .get::<Caller>()
        .cloned()
        .unwrap_or_else(Caller::anonymous);
    let access = Access::from_method(req.method().as_str());

    if let Err(e) = authorize(&caller, resource, access) {
        tracing::debug!(?resource, ?access, "Request stopped at the access gate");
        return e.into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_schemes() {
        assert_eq!(token_from_header("Token abc123"), Some("abc123"));
        assert_eq!(token_from_header("Bearer abc123"), Some("abc123"));
        assert_eq!(token_from_header("token  abc123 "), Some("abc123"));
        assert_eq!(token_from_header("Basic dXNlcjpwYXNz"), None);
        assert_eq!(token_from_header("Token"), None);
    }
}
