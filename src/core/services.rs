//! Implementations for the services the app needs.

use crate::core::auto_reply::{self, PlannedReply};
use crate::core::error::AppError;
use crate::core::events::{AppEvent, EventBus};
use crate::core::persona::Persona;
use crate::core::traits::ConversationService;
use crate::infrastructure::entities::{Conversation, Message};
use crate::infrastructure::traits::ConversationRepository;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

pub struct LocalConversationService {
    repo: Arc<dyn ConversationRepository>,
    events: EventBus,
}

impl LocalConversationService {
    pub fn new(repo: Arc<dyn ConversationRepository>, events: EventBus) -> Self {
        LocalConversationService { repo, events }
    }
}

#[async_trait]
impl ConversationService for LocalConversationService {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, AppError> {
        Ok(self.repo.list_conversations().await?)
    }

    async fn get_conversation(&self, conversation_id: Uuid) -> Result<Conversation, AppError> {
        self.repo
            .get_conversation(conversation_id)
            .await?
            .ok_or(AppError::NotFound("conversation"))
    }

    async fn create_conversation(
        &self,
        name: String,
        avatar: Option<String>,
    ) -> Result<Conversation, AppError> {
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(AppError::InvalidInput("contact name must not be empty".to_owned()));
        }

        if let Some(existing) = self.repo.find_conversation_by_name(&name).await? {
            return Ok(existing);
        }

        let conversation = self
            .repo
            .create_conversation(Conversation::new(name, avatar))
            .await?;
        info!(
            "new conversation with {} ({:?})",
            conversation.name,
            Persona::classify(&conversation.name)
        );
        Ok(conversation)
    }

    async fn delete_conversation(&self, conversation_id: Uuid) -> Result<(), AppError> {
        if self.repo.delete_conversation(conversation_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("conversation"))
        }
    }

    async fn mark_read(&self, conversation_id: Uuid) -> Result<(), AppError> {
        self.get_conversation(conversation_id).await?;
        Ok(self.repo.mark_read(conversation_id).await?)
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, AppError> {
        self.get_conversation(conversation_id).await?;
        Ok(self.repo.list_messages(conversation_id).await?)
    }

    async fn create_raw_message(&self, message: Message) -> Result<Message, AppError> {
        if message.text.trim().is_empty() && message.image.is_none() {
            return Err(AppError::InvalidInput("message must not be empty".to_owned()));
        }
        self.get_conversation(message.conversation_id).await?;

        let message = self.repo.insert_message(message).await?;
        self.events.publish(AppEvent::MessageCreated(message.clone()));
        Ok(message)
    }

    async fn plan_auto_reply(&self, conversation_id: Uuid) -> Result<PlannedReply, AppError> {
        let conversation = self.get_conversation(conversation_id).await?;
        let persona = Persona::classify(&conversation.name);

        let (expected, _) = auto_reply::next_reply(persona, conversation.reply_cursor);

        Ok(PlannedReply {
            conversation_id,
            persona,
            delay: auto_reply::reply_delay(persona, expected),
        })
    }

    async fn commit_auto_reply(&self, plan: PlannedReply) -> Result<Message, AppError> {
        let message = self
            .repo
            .insert_reply(plan.conversation_id, plan.persona.phrases())
            .await?
            .ok_or(AppError::NotFound("conversation"))?;

        self.events.publish(AppEvent::MessageCreated(message.clone()));
        Ok(message)
    }
}
