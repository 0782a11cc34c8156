//! HTTP client for a Letta agent server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{AgentError, ChatAgent, ChatReply, ToolCall};

/// Name the studio's agent is registered under on the server.
pub const AGENT_NAME: &str = "art_studio_companion";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const EMPTY_REPLY: &str = "I processed your request.";

const SYSTEM_PROMPT: &str = "You are the Art Studio Companion, an assistant for a \
painter working in their own studio. You keep track of their art supplies, plan \
projects and shopping lists, look after their portfolio and remember their style \
preferences between conversations. Prefer concrete, practical suggestions that use \
supplies they already own.";

const PERSONA: &str = "Warm, encouraging studio assistant with a working knowledge \
of watercolor, oil, acrylic and drawing media.";

const HUMAN: &str = "An artist managing their studio. Preferences are learned over time.";

/// Chat agent backed by a Letta server.
///
/// The server-side agent is looked up (or created) on the first message and
/// its id cached for the lifetime of this value.
pub struct LettaAgent {
    http: Client,
    base_url: String,
    agent_id: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct AgentSummary {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct MemoryBlock<'a> {
    label: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct CreateAgentRequest<'a> {
    name: &'a str,
    system: &'a str,
    memory_blocks: Vec<MemoryBlock<'a>>,
    model: &'a str,
    embedding: &'a str,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    messages: Vec<OutgoingMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct LettaToolCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct LettaMessage {
    #[serde(default)]
    message_type: String,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    tool_call: Option<LettaToolCall>,
}

#[derive(Debug, Deserialize)]
struct LettaResponse {
    #[serde(default)]
    messages: Vec<LettaMessage>,
}

impl LettaAgent {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AgentError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent_id: OnceCell::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn agent_id(&self) -> Result<&str, AgentError> {
        self.agent_id
            .get_or_try_init(|| self.get_or_create_agent())
            .await
            .map(String::as_str)
    }

    async fn get_or_create_agent(&self) -> Result<String, AgentError> {
        let url = format!("{}/v1/agents/", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("name", AGENT_NAME)])
            .send()
            .await?;
        let agents: Vec<AgentSummary> = check_status(response).await?.json().await?;
        if let Some(existing) = agents.into_iter().find(|a| a.name == AGENT_NAME) {
            debug!(agent_id = %existing.id, "reusing existing agent");
            return Ok(existing.id);
        }

        let body = CreateAgentRequest {
            name: AGENT_NAME,
            system: SYSTEM_PROMPT,
            memory_blocks: vec![
                MemoryBlock {
                    label: "human",
                    value: HUMAN,
                },
                MemoryBlock {
                    label: "persona",
                    value: PERSONA,
                },
            ],
            model: "openai/gpt-4o-mini",
            embedding: "openai/text-embedding-3-small",
        };
        let response = self.http.post(&url).json(&body).send().await?;
        let created: AgentSummary = check_status(response).await?.json().await?;
        info!(agent_id = %created.id, base_url = %self.base_url, "created agent");
        Ok(created.id)
    }
}

async fn check_status(response: Response) -> Result<Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(AgentError::Api {
        status: status.as_u16(),
        message,
    })
}

fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let text: Vec<&str> = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            (!text.is_empty()).then(|| text.join(""))
        }
        _ => None,
    }
}

fn parse_reply(response: LettaResponse) -> ChatReply {
    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();

    for message in response.messages {
        if message.message_type == "assistant_message" {
            if let Some(text) = message.content.as_ref().and_then(content_text) {
                if !text.is_empty() {
                    texts.push(text);
                }
            }
        }
        if let Some(call) = message.tool_call {
            tool_calls.push(ToolCall {
                name: call.name,
                arguments: call.arguments,
            });
        }
    }

    ChatReply {
        response: if texts.is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            texts.join(" ")
        },
        tool_calls,
    }
}

#[async_trait]
impl ChatAgent for LettaAgent {
    fn name(&self) -> &str {
        "letta"
    }

    async fn send_message(&self, text: &str) -> Result<ChatReply, AgentError> {
        let agent_id = self.agent_id().await?;
        let url = format!("{}/v1/agents/{agent_id}/messages", self.base_url);
        let body = SendMessageRequest {
            messages: vec![OutgoingMessage {
                role: "user",
                content: text,
            }],
        };

        let response = self.http.post(&url).json(&body).send().await?;
        let parsed: LettaResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        let reply = parse_reply(parsed);
        debug!(tool_calls = reply.tool_calls.len(), "agent replied");
        Ok(reply)
    }
}
