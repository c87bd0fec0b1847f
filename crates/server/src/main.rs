//! jardin server entry point.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    ServiceExt,
    extract::{DefaultBodyLimit, Request},
    http::HeaderValue,
};
use jardin_api::{AppState, app};
use jardin_common::{Config, config::CorsConfig, media_store_from_config};
use jardin_core::{
    AccountService, ContactService, EventService, GalleryService, Origin, PlaceService,
    PostService, ReviewService,
};
use jardin_db::repositories::{
    AuthTokenRepository, ContactInfoRepository, EventRepository, GalleryItemRepository,
    MediaRepository, PlaceRepository, PostRepository, ReviewRepository, UserProfileRepository,
    UserRepository,
};
use tokio::signal;
use tower::Layer;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body; gallery videos arrive in one piece.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Any origin when none are configured, otherwise exactly the listed ones.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jardin=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting jardin server...");

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Connect to database
    let db = Arc::new(jardin_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    jardin_db::migrate(&db).await?;
    info!("Migrations completed");

    let store = media_store_from_config(&config.storage);

    // Create repositories
    let place_repo = PlaceRepository::new(Arc::clone(&db));
    let media_repo = MediaRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let review_repo = ReviewRepository::new(Arc::clone(&db));
    let contact_repo = ContactInfoRepository::new(Arc::clone(&db));
    let gallery_repo = GalleryItemRepository::new(Arc::clone(&db));
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let token_repo = AuthTokenRepository::new(Arc::clone(&db));

    // Create services
    let place_service = PlaceService::new(
        place_repo.clone(),
        media_repo,
        review_repo.clone(),
        store.clone(),
    );
    let event_service = EventService::new(event_repo, place_repo.clone());
    let post_service = PostService::new(post_repo, place_repo.clone(), store.clone());
    let review_service = ReviewService::new(review_repo, place_repo, store.clone());
    let contact_service = ContactService::new(contact_repo);
    let gallery_service = GalleryService::new(gallery_repo, store);
    let account_service = AccountService::new(
        user_repo,
        profile_repo,
        token_repo,
        config.registration.clone(),
    );

    if let Some(admin) = &config.bootstrap_admin {
        account_service.ensure_superuser(admin).await?;
    }

    let state = AppState {
        place_service,
        event_service,
        post_service,
        review_service,
        contact_service,
        gallery_service,
        account_service,
        site_origin: Origin::from_site_url(&config.server.url),
        trust_forwarded_proto: config.server.trust_forwarded_proto,
    };

    let router = app(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(120)))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors));

    // Trailing slashes are trimmed before routing
    let app = NormalizePathLayer::trim_trailing_slash().layer(router);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server.host))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
