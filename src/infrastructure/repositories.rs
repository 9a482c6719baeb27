//! DB Repository abstractions

use crate::core::auto_reply;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{Conversation, Message, MessageKind, ScheduledEvent};
use crate::infrastructure::traits::{
    ConversationRepository, ScheduleRepository, SettingsRepository,
};
use async_trait::async_trait;
use log::error;
use sqlx::SqliteConnection;
use uuid::Uuid;

const CONVERSATION_COLUMNS: &str = "id, name, last_message, last_message_at, unread_count, avatar, verified, reply_cursor, created_at";

pub struct DbConversationRepository {
    connection: DatabaseConnection,
}

impl DbConversationRepository {
    pub fn new(connection: DatabaseConnection) -> Self {
        DbConversationRepository { connection }
    }
}

#[async_trait]
impl ConversationRepository for DbConversationRepository {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ()> {
        sqlx::query_as(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations ORDER BY COALESCE(last_message_at, created_at) DESC, rowid DESC"
        ))
        .fetch_all(&*self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn get_conversation(&self, conversation_id: Uuid) -> Result<Option<Conversation>, ()> {
        sqlx::query_as(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?"
        ))
        .bind(conversation_id)
        .fetch_optional(&*self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn find_conversation_by_name(&self, name: &str) -> Result<Option<Conversation>, ()> {
        sqlx::query_as(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE name = ? ORDER BY datetime(created_at) ASC LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&*self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn create_conversation(&self, conversation: Conversation) -> Result<Conversation, ()> {
        sqlx::query_as(&format!(
            "INSERT INTO conversations ({CONVERSATION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {CONVERSATION_COLUMNS}"
        ))
        .bind(conversation.id)
        .bind(conversation.name)
        .bind(conversation.last_message)
        .bind(conversation.last_message_at)
        .bind(conversation.unread_count)
        .bind(conversation.avatar)
        .bind(conversation.verified)
        .bind(conversation.reply_cursor)
        .bind(conversation.created_at)
        .fetch_one(&*self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn delete_conversation(&self, conversation_id: Uuid) -> Result<bool, ()> {
        sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(conversation_id)
            .execute(&*self.connection)
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| error!("{e}"))
    }

    async fn mark_read(&self, conversation_id: Uuid) -> Result<(), ()> {
        sqlx::query("UPDATE conversations SET unread_count = 0 WHERE id = ?")
            .bind(conversation_id)
            .execute(&*self.connection)
            .await
            .map(|_| ())
            .map_err(|e| error!("{e}"))
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, ()> {
        sqlx::query_as(
            "SELECT id, conversation_id, kind, text, image, reply_to, created_at FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(conversation_id)
        .fetch_all(&*self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn insert_message(&self, message: Message) -> Result<Message, ()> {
        let mut transaction = self.connection.begin().await.map_err(|e| error!("{e}"))?;

        let conversation_id = message.conversation_id;
        let Some(stored) = store_message(&mut *transaction, message)
            .await
            .map_err(|e| error!("{e}"))?
        else {
            error!("cannot insert message into missing conversation {conversation_id}");
            return Err(());
        };

        transaction.commit().await.map_err(|e| error!("{e}"))?;

        Ok(stored)
    }

    async fn insert_reply(
        &self,
        conversation_id: Uuid,
        phrases: &'static [&'static str],
    ) -> Result<Option<Message>, ()> {
        let table_size = phrases.len() as i64;
        let mut transaction = self.connection.begin().await.map_err(|e| error!("{e}"))?;

        // Writing first takes the database write lock, so concurrent replies
        // queue up here and each one sees the cursor left by the previous one.
        let advanced: Option<i64> = sqlx::query_scalar(
            "UPDATE conversations SET reply_cursor = (reply_cursor % ? + 1) % ? WHERE id = ? RETURNING reply_cursor",
        )
        .bind(table_size)
        .bind(table_size)
        .bind(conversation_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|e| error!("{e}"))?;

        let Some(advanced) = advanced else {
            return Ok(None);
        };

        let text = phrases[auto_reply::used_index(table_size, advanced)].to_owned();
        let reply = Message::new(conversation_id, MessageKind::Contact, text);

        let stored = store_message(&mut *transaction, reply)
            .await
            .map_err(|e| error!("{e}"))?;

        transaction.commit().await.map_err(|e| error!("{e}"))?;

        Ok(stored)
    }
}

/// Inserts the message and refreshes its conversation's preview. Returns
/// `Ok(None)` without writing if the conversation does not exist.
async fn store_message(
    connection: &mut SqliteConnection,
    message: Message,
) -> Result<Option<Message>, sqlx::Error> {
    let unread_increment: i64 = match message.kind {
        MessageKind::Contact => 1,
        MessageKind::Me => 0,
    };

    let updated = sqlx::query(
        "UPDATE conversations SET last_message = ?, last_message_at = ?, unread_count = unread_count + ? WHERE id = ?",
    )
    .bind(&message.text)
    .bind(message.created_at)
    .bind(unread_increment)
    .bind(message.conversation_id)
    .execute(&mut *connection)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    sqlx::query_as(
        "INSERT INTO messages (id, conversation_id, kind, text, image, reply_to, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id, conversation_id, kind, text, image, reply_to, created_at",
    )
    .bind(message.id)
    .bind(message.conversation_id)
    .bind(message.kind)
    .bind(message.text)
    .bind(message.image)
    .bind(message.reply_to)
    .bind(message.created_at)
    .fetch_one(&mut *connection)
    .await
    .map(Some)
}

const EVENT_COLUMNS: &str = "id, kind, caller_name, caller_number, message_text, video_call, fire_at, completed, created_at";

pub struct DbScheduleRepository {
    connection: DatabaseConnection,
}

impl DbScheduleRepository {
    pub fn new(connection: DatabaseConnection) -> Self {
        DbScheduleRepository { connection }
    }
}

#[async_trait]
impl ScheduleRepository for DbScheduleRepository {
    async fn insert_event(&self, event: ScheduledEvent) -> Result<ScheduledEvent, ()> {
        sqlx::query_as(&format!(
            "INSERT INTO scheduled_events ({EVENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {EVENT_COLUMNS}"
        ))
        .bind(event.id)
        .bind(event.kind)
        .bind(event.caller_name)
        .bind(event.caller_number)
        .bind(event.message_text)
        .bind(event.video_call)
        .bind(event.fire_at)
        .bind(event.completed)
        .bind(event.created_at)
        .fetch_one(&*self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn get_event(&self, event_id: Uuid) -> Result<Option<ScheduledEvent>, ()> {
        sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM scheduled_events WHERE id = ?"
        ))
        .bind(event_id)
        .fetch_optional(&*self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn delete_pending_event(&self, event_id: Uuid) -> Result<bool, ()> {
        sqlx::query("DELETE FROM scheduled_events WHERE id = ? AND completed = 0")
            .bind(event_id)
            .execute(&*self.connection)
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| error!("{e}"))
    }

    async fn mark_completed(&self, event_id: Uuid) -> Result<bool, ()> {
        sqlx::query("UPDATE scheduled_events SET completed = 1 WHERE id = ? AND completed = 0")
            .bind(event_id)
            .execute(&*self.connection)
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| error!("{e}"))
    }

    async fn list_events(&self, pending_only: bool) -> Result<Vec<ScheduledEvent>, ()> {
        let filter = if pending_only {
            "WHERE completed = 0"
        } else {
            ""
        };

        sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM scheduled_events {filter} ORDER BY datetime(fire_at) ASC"
        ))
        .fetch_all(&*self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }
}

pub struct DbSettingsRepository {
    connection: DatabaseConnection,
}

impl DbSettingsRepository {
    pub fn new(connection: DatabaseConnection) -> Self {
        DbSettingsRepository { connection }
    }
}

#[async_trait]
impl SettingsRepository for DbSettingsRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, ()> {
        sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&*self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn put_settings(&self, values: &[(&str, String)]) -> Result<(), ()> {
        let mut transaction = self.connection.begin().await.map_err(|e| error!("{e}"))?;

        for (key, value) in values {
            sqlx::query(
                "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *transaction)
            .await
            .map_err(|e| error!("{e}"))?;
        }

        transaction.commit().await.map_err(|e| error!("{e}"))
    }
}
