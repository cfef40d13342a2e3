//! Mason shared chat DTOs
//!
//! Plain data shared by the stream decoder, the session layer and renderers.

use serde::{Deserialize, Serialize};

/// Shown in place of an answer when a request cycle fails.
pub const FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A cited source attached to an assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

/// One entry of the conversation, in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// Thinking trace shown next to the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            reasoning: None,
            citations: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            reasoning: None,
            citations: None,
        }
    }

    /// Empty assistant turn that a streamed response fills in.
    pub fn placeholder() -> Self {
        Self::assistant(String::new())
    }

    pub fn is_empty_assistant(&self) -> bool {
        self.role == Role::Assistant
            && self.content.is_empty()
            && self.reasoning.as_deref().map_or(true, str::is_empty)
    }
}

/// One decoded unit of streamed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub text: String,
    pub is_reasoning: bool,
}

impl StreamEvent {
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_reasoning: false,
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_reasoning: true,
        }
    }
}

/// History entry as sent on the wire; reasoning and citations are stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// Outbound completion request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Whether the backend may search the web before answering
    pub network: bool,
}

impl ChatRequest {
    pub fn from_turns<'a>(turns: impl IntoIterator<Item = &'a ConversationTurn>, network: bool) -> Self {
        Self {
            messages: turns.into_iter().map(ChatMessage::from).collect(),
            network,
        }
    }
}
