//! Conversations endpoints

use crate::api::AppState;
use crate::api::conversations::schemas::{
    ConversationList, CreateConversation, CreateMessage, MessagesList,
};
use crate::core::error::AppError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::warn;
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_conversations).post(new_conversation))
        .route("/:id", get(get_conversation).delete(delete_conversation))
        .route("/:id/read", post(mark_read))
        .route(
            "/:id/messages",
            get(conversation_messages).post(post_message),
        )
}

async fn list_conversations(
    State(context): State<AppState>,
) -> Result<Json<ConversationList>, AppError> {
    let conversations = context.conversations.list_conversations().await?;

    Ok(Json(ConversationList {
        conversations: conversations
            .into_iter()
            .map(schemas::Conversation::from)
            .collect(),
    }))
}

async fn new_conversation(
    State(context): State<AppState>,
    Json(create_conversation): Json<CreateConversation>,
) -> Result<(StatusCode, Json<schemas::Conversation>), AppError> {
    let conversation = context
        .conversations
        .create_conversation(create_conversation.name, create_conversation.avatar)
        .await?;

    Ok((StatusCode::CREATED, Json(conversation.into())))
}

async fn get_conversation(
    State(context): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<schemas::Conversation>, AppError> {
    let conversation = context
        .conversations
        .get_conversation(conversation_id)
        .await?;

    Ok(Json(conversation.into()))
}

async fn delete_conversation(
    State(context): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    context
        .conversations
        .delete_conversation(conversation_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn mark_read(
    State(context): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    context.conversations.mark_read(conversation_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn conversation_messages(
    State(context): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<MessagesList>, AppError> {
    let messages = context.conversations.list_messages(conversation_id).await?;

    Ok(Json(MessagesList {
        messages: messages.into_iter().map(schemas::Message::from).collect(),
    }))
}

/// Stores the user's message. The simulated reply is produced in the
/// background and shows up on the event stream once "typed".
async fn post_message(
    State(context): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Json(message): Json<CreateMessage>,
) -> Result<(StatusCode, Json<schemas::Message>), AppError> {
    let stored = context
        .conversations
        .send_message(conversation_id, message.text, message.reply_to)
        .await?;

    if message.auto_reply.unwrap_or(context.config.auto_reply) {
        let conversations = context.conversations.clone();
        tokio::spawn(async move {
            if let Err(e) = conversations.auto_reply(conversation_id).await {
                warn!("auto-reply in {conversation_id} failed: {e}");
            }
        });
    }

    Ok((StatusCode::CREATED, Json(stored.into())))
}

pub mod schemas {
    use crate::core::persona::Persona;
    use crate::infrastructure::entities;
    use crate::infrastructure::entities::MessageKind;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct CreateConversation {
        pub name: String,
        pub avatar: Option<String>,
    }

    #[derive(Serialize, Debug)]
    pub struct Conversation {
        pub id: Uuid,
        pub name: String,
        pub persona: Persona,
        pub last_message: Option<String>,
        pub last_message_at: Option<DateTime<Utc>>,
        pub unread_count: i64,
        pub avatar: Option<String>,
        pub verified: bool,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::Conversation> for Conversation {
        fn from(conversation: entities::Conversation) -> Self {
            Conversation {
                persona: Persona::classify(&conversation.name),
                id: conversation.id,
                name: conversation.name,
                last_message: conversation.last_message,
                last_message_at: conversation.last_message_at,
                unread_count: conversation.unread_count,
                avatar: conversation.avatar,
                verified: conversation.verified,
                created_at: conversation.created_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ConversationList {
        pub conversations: Vec<Conversation>,
    }

    #[derive(Serialize, Debug, Default)]
    pub struct MessagesList {
        pub messages: Vec<Message>,
    }

    #[derive(Serialize, Debug)]
    pub struct Message {
        pub conversation_id: Uuid,
        pub id: Uuid,
        pub kind: MessageKind,
        pub text: String,
        pub image: Option<String>,
        pub reply_to: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::Message> for Message {
        fn from(message: entities::Message) -> Self {
            Message {
                conversation_id: message.conversation_id,
                id: message.id,
                kind: message.kind,
                text: message.text,
                image: message.image,
                reply_to: message.reply_to,
                created_at: message.created_at,
            }
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateMessage {
        pub text: String,
        pub reply_to: Option<Uuid>,
        /// Overrides the configured default.
        pub auto_reply: Option<bool>,
    }
}
