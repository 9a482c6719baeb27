//! In-process observation stream. Services publish, the HTTP layer (or any
//! other front-end) subscribes.

use crate::core::traits::Presenter;
use crate::infrastructure::entities;
use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::broadcast;

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum AppEvent {
    MessageCreated(entities::Message),
    EventFired(entities::ScheduledEvent),
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        EventBus { sender }
    }

    pub fn publish(&self, event: AppEvent) {
        // No subscribers is fine: nobody is looking at the screen.
        if self.sender.send(event).is_err() {
            debug!("event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Presents fired fake events by publishing them on the bus; whatever front-end
/// is subscribed does the ringing.
pub struct BusPresenter {
    bus: EventBus,
}

impl BusPresenter {
    pub fn new(bus: EventBus) -> Self {
        BusPresenter { bus }
    }
}

#[async_trait]
impl Presenter for BusPresenter {
    async fn present(&self, event: &entities::ScheduledEvent) {
        info!(
            "presenting {:?} from {} (video: {})",
            event.kind, event.caller_name, event.video_call
        );
        self.bus.publish(AppEvent::EventFired(event.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::entities::{Message, MessageKind};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        let message = Message::new(Uuid::new_v4(), MessageKind::Me, "hello".to_owned());
        bus.publish(AppEvent::MessageCreated(message.clone()));

        match receiver.recv().await.unwrap() {
            AppEvent::MessageCreated(received) => assert_eq!(received.id, message.id),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_does_not_fail() {
        let bus = EventBus::new();
        bus.publish(AppEvent::MessageCreated(Message::new(
            Uuid::new_v4(),
            MessageKind::Contact,
            "nobody listens".to_owned(),
        )));
    }
}
