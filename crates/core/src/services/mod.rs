//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod contact;
pub mod event;
pub mod gallery;
pub mod place;
pub mod post;
pub mod review;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::{
    AccountService, LoginInput, MeResponse, ProfileResponse, RegisterInput, RegisteredAccount,
    TokenResponse,
};
pub use contact::{ContactInput, ContactResponse, ContactService};
pub use event::{EventInput, EventResponse, EventService};
pub use gallery::{GalleryInput, GalleryItemResponse, GalleryService};
pub use place::{MediaInput, MediaResponse, PlaceInput, PlaceResponse, PlaceService};
pub use post::{PostInput, PostResponse, PostService};
pub use review::{
    ModerationReviewInput, ModerationReviewResponse, ReviewInput, ReviewResponse, ReviewService,
    ReviewStatus,
};

use jardin_common::{AppError, AppResult, FieldErrors};

/// Whether a write replaces the row (create, PUT) or patches it (PATCH).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Every required field must be present.
    Full,
    /// Only the fields present are changed.
    Partial,
}

/// Collects per-field problems found outside `validator` rules.
#[derive(Debug, Default)]
pub(crate) struct FieldCheck {
    errors: FieldErrors,
}

impl FieldCheck {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `field` as missing when a full write lacks it.
    pub(crate) fn require(&mut self, mode: WriteMode, field: &str, present: bool) {
        if mode == WriteMode::Full && !present {
            self.push(field, "This field is required.");
        }
    }

    pub(crate) fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub(crate) fn finish(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.errors))
        }
    }
}

/// Timestamps are rendered in RFC 3339.
pub(crate) fn timestamp(value: &sea_orm::prelude::DateTimeWithTimeZone) -> String {
    value.to_rfc3339()
}
