use meshroom_core::ChatMessage;

/// Chat history ordered by creation time, without duplicates.
///
/// History is loaded after subscribing, so a message can arrive both ways.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    /// Returns `false` for a message already in the log.
    pub fn insert(&mut self, message: ChatMessage) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        let at = self
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        self.messages.insert(at, message);
        true
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        for message in messages {
            self.insert(message);
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
