//! Scheduler tests: timers firing, cancellation and restore after restart.
//!
//! These use real (short) timers.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use gotta_go::config::AppConfig;
use gotta_go::context::AppContext;
use gotta_go::core::error::AppError;
use gotta_go::core::events::EventBus;
use gotta_go::core::scheduler::NewScheduledEvent;
use gotta_go::core::traits::Presenter;
use gotta_go::infrastructure::database::DatabaseConnection;
use gotta_go::infrastructure::entities::{EventKind, MessageKind, ScheduledEvent};
use gotta_go::infrastructure::repositories::DbScheduleRepository;
use gotta_go::infrastructure::traits::ScheduleRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

#[derive(Default)]
struct RecordingPresenter {
    presented: Mutex<Vec<ScheduledEvent>>,
    notify: Notify,
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn present(&self, event: &ScheduledEvent) {
        self.presented.lock().await.push(event.clone());
        self.notify.notify_one();
    }
}

impl RecordingPresenter {
    async fn wait_for_presentation(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.notify.notified())
            .await
            .expect("nothing was presented");
    }
}

async fn setup() -> (Arc<AppContext>, Arc<RecordingPresenter>, DatabaseConnection) {
    let db = DatabaseConnection::in_memory().await.unwrap();
    let presenter = Arc::new(RecordingPresenter::default());
    let (context, _) = AppContext::assemble(
        AppConfig::default(),
        db.clone(),
        EventBus::new(),
        presenter.clone(),
    );
    (context, presenter, db)
}

fn call_in(millis: i64) -> NewScheduledEvent {
    NewScheduledEvent {
        kind: EventKind::Call,
        caller_name: "Sếp".to_owned(),
        caller_number: Some("0901234567".to_owned()),
        message_text: None,
        video_call: false,
        fire_at: Utc::now() + ChronoDuration::milliseconds(millis),
    }
}

#[tokio::test]
async fn test_scheduled_call_fires_and_completes() {
    let (context, presenter, _) = setup().await;

    let event = context.scheduler.schedule(call_in(300)).await.unwrap();
    assert!(!event.completed);

    presenter.wait_for_presentation().await;

    let presented = presenter.presented.lock().await;
    assert_eq!(presented.len(), 1);
    assert_eq!(presented[0].id, event.id);
    assert!(presented[0].completed);

    let stored = context.scheduler.list(false).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].completed);
    assert!(context.scheduler.list(true).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_before_fire_produces_nothing() {
    let (context, presenter, _) = setup().await;

    let event = context.scheduler.schedule(call_in(400)).await.unwrap();
    context.scheduler.cancel(event.id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(900)).await;

    assert!(presenter.presented.lock().await.is_empty());
    assert!(context.scheduler.list(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_unknown_or_fired_event_is_not_found() {
    let (context, presenter, _) = setup().await;

    assert!(matches!(
        context.scheduler.cancel(Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));

    let event = context.scheduler.schedule(call_in(200)).await.unwrap();
    presenter.wait_for_presentation().await;

    assert!(matches!(
        context.scheduler.cancel(event.id).await,
        Err(AppError::NotFound(_))
    ));
    // The completed record stays.
    assert_eq!(context.scheduler.list(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_scheduled_message_lands_in_conversation() {
    let (context, presenter, _) = setup().await;

    context
        .scheduler
        .schedule(NewScheduledEvent {
            kind: EventKind::Message,
            caller_name: "Anh yêu".to_owned(),
            caller_number: None,
            message_text: Some("Về nhà ngay nhé!".to_owned()),
            video_call: false,
            fire_at: Utc::now() + ChronoDuration::milliseconds(200),
        })
        .await
        .unwrap();

    presenter.wait_for_presentation().await;

    // Delivery into the chat happens right after presenting.
    let mut conversation = None;
    for _ in 0..50 {
        conversation = context
            .conversations
            .list_conversations()
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Anh yêu");
        if conversation.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let conversation = conversation.expect("conversation was not created");

    let mut messages = Vec::new();
    for _ in 0..50 {
        messages = context
            .conversations
            .list_messages(conversation.id)
            .await
            .unwrap();
        if !messages.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Contact);
    assert_eq!(messages[0].text, "Về nhà ngay nhé!");
}

#[tokio::test]
async fn test_invalid_schedule_is_rejected_and_not_stored() {
    let (context, _, _) = setup().await;

    assert!(matches!(
        context.scheduler.schedule(call_in(-1_000)).await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(context.scheduler.list(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_restore_rearms_future_events_only() {
    let (context, presenter, db) = setup().await;
    let repo = DbScheduleRepository::new(db);

    let stored_event = |fire_at| ScheduledEvent {
        id: Uuid::new_v4(),
        kind: EventKind::Call,
        caller_name: "Mẹ".to_owned(),
        caller_number: None,
        message_text: None,
        video_call: true,
        fire_at,
        completed: false,
        created_at: Utc::now(),
    };

    let upcoming = repo
        .insert_event(stored_event(Utc::now() + ChronoDuration::milliseconds(300)))
        .await
        .unwrap();
    let missed = repo
        .insert_event(stored_event(Utc::now() - ChronoDuration::minutes(10)))
        .await
        .unwrap();

    assert_eq!(context.scheduler.restore().await.unwrap(), 1);

    presenter.wait_for_presentation().await;

    let presented = presenter.presented.lock().await;
    assert_eq!(presented.len(), 1);
    assert_eq!(presented[0].id, upcoming.id);

    let still_pending = context.scheduler.list(true).await.unwrap();
    assert_eq!(still_pending.len(), 1);
    assert_eq!(still_pending[0].id, missed.id);
}

/// Rings for a long time before returning.
#[derive(Default)]
struct SlowPresenter {
    started: Notify,
}

#[async_trait]
impl Presenter for SlowPresenter {
    async fn present(&self, _event: &ScheduledEvent) {
        self.started.notify_one();
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
}

#[tokio::test]
async fn test_cancel_is_answered_while_an_event_is_presented() {
    let db = DatabaseConnection::in_memory().await.unwrap();
    let presenter = Arc::new(SlowPresenter::default());
    let (context, _) = AppContext::assemble(
        AppConfig::default(),
        db,
        EventBus::new(),
        presenter.clone(),
    );

    context.scheduler.schedule(call_in(100)).await.unwrap();
    let later = context.scheduler.schedule(call_in(600_000)).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), presenter.started.notified())
        .await
        .expect("nothing was presented");

    let cancelled = tokio::time::timeout(
        Duration::from_millis(1_000),
        context.scheduler.cancel(later.id),
    )
    .await
    .expect("cancel waited for the presentation");
    cancelled.unwrap();

    let pending = context.scheduler.list(true).await.unwrap();
    assert!(pending.is_empty());
}
