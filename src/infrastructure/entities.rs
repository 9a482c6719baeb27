//! Database entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Id of the built-in parent contact seeded by the first migration.
pub const BUILT_IN_PARENT_ID: Uuid = Uuid::from_u128(1);

#[derive(Debug, Clone, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub name: String,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub avatar: Option<String>,
    pub verified: bool,
    pub reply_cursor: i64,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(name: String, avatar: Option<String>) -> Self {
        Conversation {
            id: Uuid::new_v4(),
            name,
            last_message: None,
            last_message_at: None,
            unread_count: 0,
            avatar,
            verified: false,
            reply_cursor: 0,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Written by the user.
    Me = 1,
    /// Written by the simulated persona.
    Contact = 2,
}

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub kind: MessageKind,
    pub text: String,
    pub image: Option<String>,
    pub reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(conversation_id: Uuid, kind: MessageKind, text: String) -> Self {
        Message {
            id: Uuid::new_v4(),
            conversation_id,
            kind,
            text,
            image: None,
            reply_to: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Call = 1,
    Message = 2,
}

#[derive(Debug, Clone, FromRow)]
pub struct ScheduledEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub caller_name: String,
    pub caller_number: Option<String>,
    pub message_text: Option<String>,
    pub video_call: bool,
    pub fire_at: DateTime<Utc>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}
