use async_trait::async_trait;

use crate::application::errors::StorageError;
use crate::domain::entities::{ChatFilter, ChatIdentity};

/// Store trait - persistence for known chats
///
/// Implementations are shared across tasks, so every method takes `&self`.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Returns whether a row was created; an existing `chat_id` is left untouched
    async fn insert_chat(&self, chat: &ChatIdentity) -> Result<bool, StorageError>;

    /// `Ok(None)` when the chat never opted in
    async fn get_chat(&self, chat_id: i64) -> Result<Option<ChatIdentity>, StorageError>;

    /// Returns whether a row was removed
    async fn delete_chat(&self, chat_id: i64) -> Result<bool, StorageError>;

    async fn find_chats(&self, filter: &ChatFilter) -> Result<Vec<ChatIdentity>, StorageError>;
}
