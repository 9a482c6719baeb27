//! Server-sent event stream of new messages and fired fake events

use crate::api::AppState;
use crate::api::conversations::schemas::Message;
use crate::api::schedules::schemas::ScheduledEvent;
use crate::core::events::AppEvent;
use crate::infrastructure::entities::EventKind;
use async_stream::stream;
use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use axum::Router;
use axum::routing::get;
use futures_util::Stream;
use log::warn;
use tokio::sync::broadcast::error::RecvError;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(event_stream))
}

async fn event_stream(
    State(context): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let mut receiver = context.events.subscribe();

    let stream = stream! {
        loop {
            match receiver.recv().await {
                Ok(event) => yield to_sse(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("event stream subscriber lagged, {skipped} event(s) skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_sse(event: AppEvent) -> Result<Event, axum::Error> {
    match event {
        AppEvent::MessageCreated(message) => Event::default()
            .event("new_message")
            .json_data(Message::from(message)),
        AppEvent::EventFired(event) => {
            let name = match event.kind {
                EventKind::Call => "incoming_call",
                EventKind::Message => "incoming_message",
            };
            Event::default()
                .event(name)
                .json_data(ScheduledEvent::from(event))
        }
    }
}
