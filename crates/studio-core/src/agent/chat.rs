use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

use studio_db::models::{ChatMessage, ChatRole};
use studio_db::queries::chat_history as db;

use super::{ChatAgent, ToolCall};
use crate::error::{Result, StudioError};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// What the chat endpoint returns for one message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub response: String,
    pub tool_calls: Vec<ToolCall>,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

/// Chat front-end: validates input, records the conversation and degrades
/// to a canned reply when the agent fails.
#[derive(Clone)]
pub struct ChatService {
    pool: SqlitePool,
    agent: Arc<dyn ChatAgent>,
}

impl ChatService {
    pub fn new(pool: SqlitePool, agent: Arc<dyn ChatAgent>) -> Self {
        Self { pool, agent }
    }

    pub async fn chat(&self, message: &str) -> Result<ChatOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(StudioError::validation("No message provided"));
        }

        db::insert_message(&self.pool, ChatRole::User, message).await?;

        let outcome = match self.agent.send_message(message).await {
            Ok(reply) => ChatOutcome {
                response: reply.response,
                tool_calls: reply.tool_calls,
                fallback: false,
                error_details: None,
            },
            Err(e) => {
                warn!(agent = self.agent.name(), error = %e, "agent unavailable, using fallback reply");
                ChatOutcome {
                    response: fallback_reply(message),
                    tool_calls: Vec::new(),
                    fallback: true,
                    error_details: Some(e.to_string()),
                }
            }
        };

        db::insert_message(&self.pool, ChatRole::Assistant, &outcome.response).await?;
        Ok(outcome)
    }

    /// Most recent messages, oldest first.
    pub async fn history(&self, limit: Option<i64>) -> Result<Vec<ChatMessage>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if limit < 0 {
            return Err(StudioError::validation("limit must not be negative"));
        }
        Ok(db::recent_messages(&self.pool, limit).await?)
    }
}

fn fallback_reply(message: &str) -> String {
    format!(
        "I received your message: '{message}'. The studio assistant is not connected \
         right now, so check that the agent server is running. Supplies, projects and \
         the portfolio are still available from the dashboard."
    )
}
