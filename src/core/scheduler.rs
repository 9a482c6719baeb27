//! Fake-event scheduling.
//!
//! A single background task owns every pending timer. Registration,
//! cancellation and timer expiry all arrive as messages and are handled in
//! order, so a cancel that races an expiring timer either wins outright (the
//! event is deleted and never presented) or loses outright (the event is
//! completed and the cancel reports not-found).

use crate::core::error::AppError;
use crate::core::traits::{ConversationService, Presenter};
use crate::infrastructure::entities::{EventKind, ScheduledEvent};
use crate::infrastructure::traits::ScheduleRepository;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

const COMMAND_QUEUE_SIZE: usize = 64;

#[derive(Debug, Clone)]
pub struct NewScheduledEvent {
    pub kind: EventKind,
    pub caller_name: String,
    pub caller_number: Option<String>,
    pub message_text: Option<String>,
    pub video_call: bool,
    pub fire_at: DateTime<Utc>,
}

impl NewScheduledEvent {
    fn validate(self, now: DateTime<Utc>) -> Result<ScheduledEvent, AppError> {
        let caller_name = self.caller_name.trim().to_owned();
        if caller_name.is_empty() {
            return Err(AppError::InvalidInput("caller name must not be empty".to_owned()));
        }
        if self.fire_at <= now {
            return Err(AppError::InvalidInput("fire time must be in the future".to_owned()));
        }

        let message_text = match self.kind {
            EventKind::Message => match self.message_text {
                Some(text) if !text.trim().is_empty() => Some(text),
                _ => {
                    return Err(AppError::InvalidInput(
                        "scheduled messages need a text".to_owned(),
                    ));
                }
            },
            EventKind::Call => None,
        };

        Ok(ScheduledEvent {
            id: Uuid::new_v4(),
            kind: self.kind,
            caller_name,
            caller_number: self.caller_number.filter(|n| !n.trim().is_empty()),
            message_text,
            video_call: self.kind == EventKind::Call && self.video_call,
            fire_at: self.fire_at,
            completed: false,
            created_at: now,
        })
    }
}

enum Command {
    Register(ScheduledEvent),
    Cancel {
        event_id: Uuid,
        reply: oneshot::Sender<Result<(), AppError>>,
    },
}

/// Handle to the scheduler task. Cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    commands: mpsc::Sender<Command>,
    repo: Arc<dyn ScheduleRepository>,
}

impl Scheduler {
    /// Spawns the scheduler task. It stops once every `Scheduler` handle is
    /// dropped, abandoning timers that have not fired yet.
    pub fn start(
        repo: Arc<dyn ScheduleRepository>,
        presenter: Arc<dyn Presenter>,
        conversations: Arc<dyn ConversationService>,
    ) -> (Scheduler, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE_SIZE);

        let task = SchedulerTask {
            repo: repo.clone(),
            presenter,
            conversations,
            timers: HashMap::new(),
        };
        let join_handle = tokio::spawn(task.run(receiver));

        (
            Scheduler {
                commands: sender,
                repo,
            },
            join_handle,
        )
    }

    /// Persists the event and arms its timer.
    ///
    /// If the timer cannot be armed the event stays stored but will not fire;
    /// this is logged and not reported as an error.
    pub async fn schedule(&self, new_event: NewScheduledEvent) -> Result<ScheduledEvent, AppError> {
        let event = new_event.validate(Utc::now())?;
        let event = self.repo.insert_event(event).await?;

        info!(
            "scheduled {:?} from {} at {}",
            event.kind, event.caller_name, event.fire_at
        );

        if self.commands.send(Command::Register(event.clone())).await.is_err() {
            warn!("scheduler is not running, event {} will not fire", event.id);
        }

        Ok(event)
    }

    /// Removes a pending event and disarms its timer.
    ///
    /// Returns `NotFound` if the event does not exist or already fired.
    pub async fn cancel(&self, event_id: Uuid) -> Result<(), AppError> {
        let (reply, response) = oneshot::channel();

        self.commands
            .send(Command::Cancel { event_id, reply })
            .await
            .map_err(|_| AppError::SchedulerUnavailable)?;

        response.await.map_err(|_| AppError::SchedulerUnavailable)?
    }

    pub async fn list(&self, pending_only: bool) -> Result<Vec<ScheduledEvent>, AppError> {
        Ok(self.repo.list_events(pending_only).await?)
    }

    /// Re-arms stored events after a restart. Events whose time passed while
    /// nothing was running are reported as missed and left as they are.
    ///
    /// Returns how many timers were armed.
    pub async fn restore(&self) -> Result<usize, AppError> {
        let now = Utc::now();
        let mut armed = 0;

        for event in self.repo.list_events(true).await? {
            if event.fire_at <= now {
                warn!(
                    "missed fake {:?} from {} due at {}",
                    event.kind, event.caller_name, event.fire_at
                );
                continue;
            }

            if self.commands.send(Command::Register(event)).await.is_err() {
                warn!("scheduler is not running, cannot restore events");
                break;
            }
            armed += 1;
        }

        info!("restored {armed} scheduled event(s)");
        Ok(armed)
    }
}

struct SchedulerTask {
    repo: Arc<dyn ScheduleRepository>,
    presenter: Arc<dyn Presenter>,
    conversations: Arc<dyn ConversationService>,
    timers: HashMap<Uuid, JoinHandle<()>>,
}

impl SchedulerTask {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let (fired_sender, mut fired) = mpsc::unbounded_channel::<Uuid>();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Register(event)) => self.arm(event, fired_sender.clone()),
                    Some(Command::Cancel { event_id, reply }) => {
                        let result = self.cancel(event_id).await;
                        // The caller may have stopped waiting.
                        let _ = reply.send(result);
                    }
                    None => break,
                },
                Some(event_id) = fired.recv() => self.fire(event_id).await,
            }
        }

        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        debug!("scheduler stopped");
    }

    fn arm(&mut self, event: ScheduledEvent, fired: mpsc::UnboundedSender<Uuid>) {
        let delay = (event.fire_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let event_id = event.id;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fired.send(event_id);
        });

        if let Some(previous) = self.timers.insert(event_id, timer) {
            previous.abort();
        }
        debug!("armed timer for {event_id} in {delay:?}");
    }

    async fn cancel(&mut self, event_id: Uuid) -> Result<(), AppError> {
        let deleted = self.repo.delete_pending_event(event_id).await?;

        if let Some(timer) = self.timers.remove(&event_id) {
            timer.abort();
        }

        if deleted {
            info!("cancelled scheduled event {event_id}");
            Ok(())
        } else {
            Err(AppError::NotFound("scheduled event"))
        }
    }

    async fn fire(&mut self, event_id: Uuid) {
        if self.timers.remove(&event_id).is_none() {
            // Cancelled after the timer had already expired.
            return;
        }

        match self.repo.mark_completed(event_id).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("event {event_id} is gone or already completed");
                return;
            }
            Err(()) => {
                error!("could not complete event {event_id}, not presenting it");
                return;
            }
        }

        let event = match self.repo.get_event(event_id).await {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(()) => {
                error!("could not load completed event {event_id}");
                return;
            }
        };

        info!("firing fake {:?} from {}", event.kind, event.caller_name);

        // The event is completed, so a later cancel already reports not-found.
        // Presenting off the loop keeps cancels answered while it rings.
        let presenter = self.presenter.clone();
        let conversations = self.conversations.clone();
        tokio::spawn(async move {
            presenter.present(&event).await;

            if let (EventKind::Message, Some(text)) = (event.kind, event.message_text.clone()) {
                if let Err(e) = deliver_message(conversations.as_ref(), &event.caller_name, text).await
                {
                    error!("could not deliver scheduled message {event_id}: {e}");
                }
            }
        });
    }
}

async fn deliver_message(
    conversations: &dyn ConversationService,
    sender: &str,
    text: String,
) -> Result<(), AppError> {
    let conversation = conversations
        .create_conversation(sender.to_owned(), None)
        .await?;
    conversations
        .create_contact_message(conversation.id, text)
        .await?;
    Ok(())
}
