//! Conversational agent façade.
//!
//! [`ChatAgent`] is the seam between the studio and whatever runtime hosts
//! the assistant. [`LettaAgent`] talks to a Letta server over HTTP;
//! [`ChatService`] wraps any agent with history persistence and a fallback
//! reply when the agent cannot be reached.

mod chat;
mod letta;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chat::{ChatOutcome, ChatService, DEFAULT_HISTORY_LIMIT};
pub use letta::{AGENT_NAME, LettaAgent};

/// A tool invocation the agent reported while answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: String,
}

/// The agent's answer to one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Failures talking to the agent runtime.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent runtime unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("agent runtime returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected agent response: {0}")]
    InvalidResponse(String),
}

/// A conversational agent.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Send one user message and wait for the reply.
    async fn send_message(&self, text: &str) -> Result<ChatReply, AgentError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn ChatAgent) {}
};
