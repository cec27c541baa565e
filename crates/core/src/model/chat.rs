use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::MessageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only chat history of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>, now: DateTime<Utc>) -> MessageId {
        let id = MessageId::new(self.next_id);
        self.next_id = id.next().value();
        self.messages.push(ChatMessage {
            id,
            sender,
            text: text.into(),
            timestamp: now,
        });
        id
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages whose text equals `text` exactly.
    #[must_use]
    pub fn count_text(&self, text: &str) -> usize {
        self.messages.iter().filter(|m| m.text == text).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn ids_are_sequential() {
        let mut t = Transcript::new();
        let a = t.push(Sender::System, "hello", fixed_now());
        let b = t.push(Sender::Ai, "hi", fixed_now());
        assert_eq!(a, MessageId::new(0));
        assert_eq!(b, MessageId::new(1));
        assert_eq!(t.len(), 2);
        assert_eq!(t.last().map(|m| m.sender), Some(Sender::Ai));
    }
}
