//! Messages and reactions.
//!
//! Both are opaque to the cache: there is no fetch-by-ID for either, so the
//! storage only records what has already been observed on the event stream.

use chrono::{DateTime, Utc};

/// An observed chat message.
#[derive(Debug, Clone)]
pub struct Message {
    id: String,
    author_id: String,
    content: String,
    sent_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        content: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            content: content.into(),
            sent_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }
}

/// One user's emoji reaction on one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    message_id: String,
    emoji_id: String,
    sender_id: String,
}

impl Reaction {
    pub fn new(
        message_id: impl Into<String>,
        emoji_id: impl Into<String>,
        sender_id: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            emoji_id: emoji_id.into(),
            sender_id: sender_id.into(),
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn emoji_id(&self) -> &str {
        &self.emoji_id
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }
}
