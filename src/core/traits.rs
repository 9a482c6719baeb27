//! Service "interfaces" shared through the application context

use crate::core::auto_reply::PlannedReply;
use crate::core::error::AppError;
use crate::core::settings::{Settings, SettingsPatch};
use crate::infrastructure::entities;
use crate::infrastructure::entities::MessageKind;
use async_trait::async_trait;
use log::debug;
use uuid::Uuid;

#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Lists all conversations, most recently active first.
    async fn list_conversations(&self) -> Result<Vec<entities::Conversation>, AppError>;

    async fn get_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<entities::Conversation, AppError>;

    /// Returns the conversation with this contact name, creating it on first use.
    async fn create_conversation(
        &self,
        name: String,
        avatar: Option<String>,
    ) -> Result<entities::Conversation, AppError>;

    /// Deletes a conversation together with all of its messages.
    ///
    /// Returns `NotFound` if the conversation did not exist.
    async fn delete_conversation(&self, conversation_id: Uuid) -> Result<(), AppError>;

    /// Resets the unread counter.
    async fn mark_read(&self, conversation_id: Uuid) -> Result<(), AppError>;

    /// List all messages in a conversation, oldest first.
    async fn list_messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<entities::Message>, AppError>;

    /// Creates a new message in a conversation and publishes it.
    ///
    /// The helpers `send_message` and `create_contact_message` should be used
    /// instead for clarity.
    async fn create_raw_message(
        &self,
        message: entities::Message,
    ) -> Result<entities::Message, AppError>;

    /// Works out the next auto-reply without writing anything.
    async fn plan_auto_reply(&self, conversation_id: Uuid) -> Result<PlannedReply, AppError>;

    /// Stores the phrase at the conversation's reply cursor and advances the
    /// cursor, both in one write.
    async fn commit_auto_reply(&self, plan: PlannedReply) -> Result<entities::Message, AppError>;

    /// Sends a message as the user.
    async fn send_message(
        &self,
        conversation_id: Uuid,
        text: String,
        reply_to: Option<Uuid>,
    ) -> Result<entities::Message, AppError> {
        let mut message = entities::Message::new(conversation_id, MessageKind::Me, text);
        message.reply_to = reply_to;
        self.create_raw_message(message).await
    }

    /// Adds a message as if the contact had written it.
    async fn create_contact_message(
        &self,
        conversation_id: Uuid,
        text: String,
    ) -> Result<entities::Message, AppError> {
        self.create_raw_message(entities::Message::new(
            conversation_id,
            MessageKind::Contact,
            text,
        ))
        .await
    }

    /// Plans a reply, waits for the simulated typing time and stores it.
    ///
    /// Nothing is written if the task is dropped during the wait.
    async fn auto_reply(&self, conversation_id: Uuid) -> Result<entities::Message, AppError> {
        let plan = self.plan_auto_reply(conversation_id).await?;
        debug!(
            "replying in {conversation_id} as {:?} after {:?}",
            plan.persona, plan.delay
        );
        tokio::time::sleep(plan.delay).await;
        self.commit_auto_reply(plan).await
    }
}

#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Reads every preference, falling back to defaults for missing values.
    async fn load(&self) -> Result<Settings, AppError>;

    /// Writes the given changes and returns the resulting preferences.
    async fn update(&self, patch: SettingsPatch) -> Result<Settings, AppError>;
}

/// The platform side of a fake event: ringing screen, notification, etc.
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn present(&self, event: &entities::ScheduledEvent);
}
