//! Database repositories.

pub mod auth_token;
pub mod contact_info;
pub mod event;
pub mod gallery_item;
pub mod media;
pub mod place;
pub mod post;
pub mod review;
pub mod user;
pub mod user_profile;

pub use auth_token::AuthTokenRepository;
pub use contact_info::ContactInfoRepository;
pub use event::EventRepository;
pub use gallery_item::GalleryItemRepository;
pub use media::MediaRepository;
pub use place::PlaceRepository;
pub use post::PostRepository;
pub use review::ReviewRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;

use jardin_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Which rows of a collection a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every row, including inactive or unpublished ones.
    All,
    /// Only rows flagged active or published.
    PublicOnly,
}

/// Map a unique-key violation to a conflict, anything else to a database error.
pub(crate) fn conflict_or_database(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
        _ => AppError::Database(err.to_string()),
    }
}
