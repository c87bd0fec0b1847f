//! Event service.

use jardin_common::{AppError, AppResult, form};
use jardin_db::{
    entities::event,
    repositories::{EventRepository, PlaceRepository},
};
use sea_orm::{Set, prelude::DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{FieldCheck, WriteMode};
use crate::policy::{Access, Caller, Resource, authorize, visibility};

/// Event fields for create and update.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct EventInput {
    #[validate(length(min = 1, max = 180))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "form::nullable_value")]
    pub place: Option<Option<i64>>,
    #[serde(default, deserialize_with = "form::opt_value")]
    pub start_date: Option<DateTimeWithTimeZone>,
    #[serde(default, deserialize_with = "form::nullable_value")]
    pub end_date: Option<Option<DateTimeWithTimeZone>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "form::opt_bool")]
    pub is_active: Option<bool>,
}

/// Event representation; `place` is the venue id.
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub id: i64,
    pub title: String,
    pub place: Option<i64>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: String,
    pub is_active: bool,
}

impl From<event::Model> for EventResponse {
    fn from(e: event::Model) -> Self {
        Self {
            id: e.id,
            title: e.title,
            place: e.place_id,
            start_date: e.start_date.to_rfc3339(),
            end_date: e.end_date.map(|t| t.to_rfc3339()),
            description: e.description,
            is_active: e.is_active,
        }
    }
}

/// Service for events.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    place_repo: PlaceRepository,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub const fn new(event_repo: EventRepository, place_repo: PlaceRepository) -> Self {
        Self {
            event_repo,
            place_repo,
        }
    }

    /// List events, latest start first.
    pub async fn list(&self, caller: &Caller) -> AppResult<Vec<EventResponse>> {
        authorize(caller, Resource::Event, Access::Read)?;

        let events = self
            .event_repo
            .list(visibility(caller, Resource::Event))
            .await?;
        Ok(events.into_iter().map(EventResponse::from).collect())
    }

    /// Get an event by ID.
    pub async fn get(&self, caller: &Caller, id: i64) -> AppResult<EventResponse> {
        authorize(caller, Resource::Event, Access::Read)?;

        let event = self
            .event_repo
            .get_by_id(id, visibility(caller, Resource::Event))
            .await?;
        Ok(event.into())
    }

    /// Create an event.
    pub async fn create(&self, caller: &Caller, input: EventInput) -> AppResult<EventResponse> {
        authorize(caller, Resource::Event, Access::Write)?;
        self.check(&input, WriteMode::Full).await?;

        let mut model = event::ActiveModel {
            place_id: Set(None),
            end_date: Set(None),
            description: Set(String::new()),
            is_active: Set(true),
            ..Default::default()
        };
        apply(input, &mut model);

        let event = self.event_repo.create(model).await?;
        tracing::info!(event_id = event.id, "Event created");
        Ok(event.into())
    }

    /// Replace or patch an event.
    pub async fn update(
        &self,
        caller: &Caller,
        id: i64,
        input: EventInput,
        mode: WriteMode,
    ) -> AppResult<EventResponse> {
        authorize(caller, Resource::Event, Access::Write)?;
        self.check(&input, mode).await?;

        let event = self
            .event_repo
            .get_by_id(id, visibility(caller, Resource::Event))
            .await?;
        let mut active: event::ActiveModel = event.into();
        apply(input, &mut active);

        let event = self.event_repo.update(active).await?;
        Ok(event.into())
    }

    /// Delete an event.
    pub async fn delete(&self, caller: &Caller, id: i64) -> AppResult<()> {
        authorize(caller, Resource::Event, Access::Write)?;

        let event = self
            .event_repo
            .get_by_id(id, visibility(caller, Resource::Event))
            .await?;
        self.event_repo.delete(event.id).await
    }

    async fn check(&self, input: &EventInput, mode: WriteMode) -> AppResult<()> {
        input.validate()?;

        let mut check = FieldCheck::new();
        check.require(mode, "title", input.title.is_some());
        check.require(mode, "start_date", input.start_date.is_some());

        if let (Some(start), Some(Some(end))) = (input.start_date, input.end_date)
            && end < start
        {
            check.push("end_date", "End date cannot be before the start date.");
        }
        check.finish()?;

        if let Some(Some(place_id)) = input.place
            && self.place_repo.find_by_id(place_id).await?.is_none()
        {
            return Err(AppError::field(
                "place",
                format!("Invalid pk \"{place_id}\" - object does not exist."),
            ));
        }

        Ok(())
    }
}

fn apply(input: EventInput, active: &mut event::ActiveModel) {
    if let Some(title) = input.title {
        active.title = Set(title);
    }
    if let Some(place) = input.place {
        active.place_id = Set(place);
    }
    if let Some(start_date) = input.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = input.end_date {
        active.end_date = Set(end_date);
    }
    if let Some(description) = input.description {
        active.description = Set(description);
    }
    if let Some(is_active) = input.is_active {
        active.is_active = Set(is_active);
    }
}
