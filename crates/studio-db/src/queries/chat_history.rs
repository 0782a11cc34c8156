//! Database query functions for the `chat_history` table.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::models::{ChatMessage, ChatRole};

/// Append a message to the chat history.
pub async fn insert_message<'e>(
    db: impl SqliteExecutor<'e>,
    role: ChatRole,
    content: &str,
) -> Result<ChatMessage> {
    let row = sqlx::query_as::<_, ChatMessage>(
        "INSERT INTO chat_history (id, role, content, created_at) \
         VALUES (?1, ?2, ?3, ?4) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(role)
    .bind(content)
    .bind(Utc::now())
    .fetch_one(db)
    .await
    .context("failed to insert chat message")?;

    Ok(row)
}

/// The most recent `limit` messages, returned oldest first.
pub async fn recent_messages<'e>(db: impl SqliteExecutor<'e>, limit: i64) -> Result<Vec<ChatMessage>> {
    let mut rows = sqlx::query_as::<_, ChatMessage>(
        "SELECT * FROM chat_history ORDER BY created_at DESC, rowid DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(db)
    .await
    .context("failed to list chat history")?;

    rows.reverse();
    Ok(rows)
}
