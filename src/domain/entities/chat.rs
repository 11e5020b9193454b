use serde::{Deserialize, Serialize};

/// A private chat that opted in with `/start`.
///
/// `chat_id` is the primary key; the store never holds two rows for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatIdentity {
    pub chat_id: i64,
    pub username: String,
    pub display_name: String,
    pub bio: String,
}

impl ChatIdentity {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            username: String::new(),
            display_name: String::new(),
            bio: String::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }
}

/// Exact-match conjunction over known chat columns. An empty filter selects every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatFilter {
    pub chat_id: Option<i64>,
    pub username: Option<String>,
}

impl ChatFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat_id(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.chat_id.is_none() && self.username.is_none()
    }
}
