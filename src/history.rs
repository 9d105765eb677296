//! Conversation transcript shared across turns.

use serde::{Deserialize, Serialize};

/// Speaker role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The seeding instruction message.
    System,
    /// Transcribed speech from the remote speaker.
    User,
    /// A generated reply.
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Who produced the message.
    pub role: Role,
    /// Message text.
    pub text: String,
}

/// Ordered, append-only conversation transcript.
///
/// Seeded with one system message and shared by every turn for the lifetime
/// of the process. Turn serialization (the coordinator's busy flag) is what
/// keeps mutation single-writer; the history itself offers no removal API.
#[derive(Debug)]
pub struct ConversationHistory {
    messages: Vec<ConversationMessage>,
}

impl ConversationHistory {
    /// Create a history seeded with the given system prompt.
    pub fn new(system_prompt: &str) -> Self {
        Self {
            messages: vec![ConversationMessage {
                role: Role::System,
                text: system_prompt.to_owned(),
            }],
        }
    }

    /// Append a user message.
    pub fn push_user(&mut self, text: &str) {
        self.messages.push(ConversationMessage {
            role: Role::User,
            text: text.to_owned(),
        });
    }

    /// Append an assistant message.
    pub fn push_assistant(&mut self, text: &str) {
        self.messages.push(ConversationMessage {
            role: Role::Assistant,
            text: text.to_owned(),
        });
    }

    /// The messages in insertion order.
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// An owned snapshot of the messages, for handing to a generator worker.
    pub fn snapshot(&self) -> Vec<ConversationMessage> {
        self.messages.clone()
    }

    /// Number of messages, including the system seed.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: the system seed is present from construction.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
