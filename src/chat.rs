//! Chat data model — messages and the append-only transcript.

use serde::{Deserialize, Serialize};

/// A single chat message as it travels between the UI, the router and the
/// transport.  Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Outbound,
    Inbound,
}

/// Delivery state of a transcript entry.  Inbound entries are always
/// `Confirmed`; outbound ones start `Pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryState {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Clone, Debug)]
pub struct TranscriptEntry {
    pub message: ChatMessage,
    pub direction: Direction,
    pub state: DeliveryState,
}

/// Ordered, append-only list of messages.  Only the delivery state of an
/// existing entry may change; entries are never removed.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage, direction: Direction, state: DeliveryState) {
        self.entries.push(TranscriptEntry {
            message,
            direction,
            state,
        });
    }

    /// Update the delivery state of the entry carrying `id`.
    pub fn mark(&mut self, id: &str, state: DeliveryState) -> bool {
        match self.entries.iter_mut().find(|entry| entry.message.id == id) {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&TranscriptEntry> {
        self.entries.iter().find(|entry| entry.message.id == id)
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            text: "hi".to_string(),
            sender: "Sam".to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn mark_changes_state_in_place() {
        let mut transcript = Transcript::new();
        transcript.push(msg("1"), Direction::Outbound, DeliveryState::Pending);
        transcript.push(msg("2"), Direction::Inbound, DeliveryState::Confirmed);

        assert!(transcript.mark("1", DeliveryState::Failed));
        assert!(!transcript.mark("404", DeliveryState::Confirmed));
        assert_eq!(transcript.len(), 2);
        assert_eq!(
            transcript.get("1").map(|e| e.state),
            Some(DeliveryState::Failed)
        );
    }

    #[test]
    fn message_serializes_with_wire_field_names() {
        let value = serde_json::to_value(msg("7")).unwrap_or_default();
        assert_eq!(value["id"], "7");
        assert_eq!(value["sender"], "Sam");
        assert_eq!(value["timestamp"], 0);
    }
}
