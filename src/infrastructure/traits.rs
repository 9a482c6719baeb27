//! Infrastructure traits, used as seams by the higher levels

use crate::infrastructure::entities;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn list_conversations(&self) -> Result<Vec<entities::Conversation>, ()>;

    async fn get_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<Option<entities::Conversation>, ()>;

    async fn find_conversation_by_name(
        &self,
        name: &str,
    ) -> Result<Option<entities::Conversation>, ()>;

    async fn create_conversation(
        &self,
        conversation: entities::Conversation,
    ) -> Result<entities::Conversation, ()>;

    /// Returns `Ok(false)` if there was nothing to delete.
    async fn delete_conversation(&self, conversation_id: Uuid) -> Result<bool, ()>;

    async fn mark_read(&self, conversation_id: Uuid) -> Result<(), ()>;


    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<entities::Message>, ()>;

    /// Stores the message and refreshes the preview fields of its conversation.
    async fn insert_message(&self, message: entities::Message) -> Result<entities::Message, ()>;

    /// Advances the reply cursor, stores the phrase it pointed at as a contact
    /// message and refreshes the preview, all in one transaction.
    ///
    /// Returns `Ok(None)` if the conversation does not exist.
    async fn insert_reply(
        &self,
        conversation_id: Uuid,
        phrases: &'static [&'static str],
    ) -> Result<Option<entities::Message>, ()>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn insert_event(
        &self,
        event: entities::ScheduledEvent,
    ) -> Result<entities::ScheduledEvent, ()>;

    async fn get_event(&self, event_id: Uuid) -> Result<Option<entities::ScheduledEvent>, ()>;

    /// Removes a pending event. Returns `Ok(false)` if no pending event matched.
    async fn delete_pending_event(&self, event_id: Uuid) -> Result<bool, ()>;

    /// Flips a pending event to completed. Returns `Ok(false)` if the event was
    /// already completed or no longer exists.
    async fn mark_completed(&self, event_id: Uuid) -> Result<bool, ()>;

    async fn list_events(&self, pending_only: bool) -> Result<Vec<entities::ScheduledEvent>, ()>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, ()>;

    /// Upserts every pair, all or nothing.
    async fn put_settings(&self, values: &[(&str, String)]) -> Result<(), ()>;
}
