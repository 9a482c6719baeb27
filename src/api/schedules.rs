//! Scheduled fake calls and messages

use crate::api::AppState;
use crate::api::schedules::schemas::{CreateSchedule, ListQuery, ScheduleList};
use crate::core::error::AppError;
use crate::core::scheduler::NewScheduledEvent;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schedules).post(create_schedule))
        .route("/:id", delete(cancel_schedule))
}

async fn list_schedules(
    State(context): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ScheduleList>, AppError> {
    let events = context
        .scheduler
        .list(query.pending.unwrap_or(false))
        .await?;

    Ok(Json(ScheduleList {
        events: events.into_iter().map(schemas::ScheduledEvent::from).collect(),
    }))
}

async fn create_schedule(
    State(context): State<AppState>,
    Json(create): Json<CreateSchedule>,
) -> Result<(StatusCode, Json<schemas::ScheduledEvent>), AppError> {
    let fire_at = match (create.fire_at, create.delay_seconds) {
        (Some(fire_at), None) => fire_at,
        (None, Some(seconds)) => Duration::try_seconds(seconds)
            .and_then(|delay| Utc::now().checked_add_signed(delay))
            .ok_or_else(|| AppError::InvalidInput("`delay_seconds` is out of range".to_owned()))?,
        _ => {
            return Err(AppError::InvalidInput(
                "exactly one of `fire_at` and `delay_seconds` is required".to_owned(),
            ));
        }
    };

    let event = context
        .scheduler
        .schedule(NewScheduledEvent {
            kind: create.kind,
            caller_name: create.caller_name,
            caller_number: create.caller_number,
            message_text: create.message_text,
            video_call: create.video_call.unwrap_or(false),
            fire_at,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(event.into())))
}

async fn cancel_schedule(
    State(context): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    context.scheduler.cancel(event_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub mod schemas {
    use crate::infrastructure::entities;
    use crate::infrastructure::entities::EventKind;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct ListQuery {
        pub pending: Option<bool>,
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateSchedule {
        pub kind: EventKind,
        pub caller_name: String,
        pub caller_number: Option<String>,
        pub message_text: Option<String>,
        pub video_call: Option<bool>,
        pub fire_at: Option<DateTime<Utc>>,
        pub delay_seconds: Option<i64>,
    }

    #[derive(Serialize, Debug)]
    pub struct ScheduledEvent {
        pub id: Uuid,
        pub kind: EventKind,
        pub caller_name: String,
        pub caller_number: Option<String>,
        pub message_text: Option<String>,
        pub video_call: bool,
        pub fire_at: DateTime<Utc>,
        pub completed: bool,
    }

    impl From<entities::ScheduledEvent> for ScheduledEvent {
        fn from(event: entities::ScheduledEvent) -> Self {
            ScheduledEvent {
                id: event.id,
                kind: event.kind,
                caller_name: event.caller_name,
                caller_number: event.caller_number,
                message_text: event.message_text,
                video_call: event.video_call,
                fire_at: event.fire_at,
                completed: event.completed,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ScheduleList {
        pub events: Vec<ScheduledEvent>,
    }
}
