//! SQLite-backed chat store

use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::application::errors::StorageError;
use crate::domain::entities::{ChatFilter, ChatIdentity};
use crate::domain::traits::ChatStore;

const SELECT_CHATS: &str = "SELECT chat_id, username, name, bio FROM private_chats WHERE 1 = 1";

pub struct SqliteChatStore {
    conn: Mutex<Connection>,
}

impl SqliteChatStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        self.lock()?.execute(
            "CREATE TABLE IF NOT EXISTS private_chats (
                chat_id INTEGER PRIMARY KEY,
                username TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL DEFAULT '',
                bio TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        self.lock()?.execute(
            "CREATE INDEX IF NOT EXISTS idx_private_chats_username ON private_chats(username)",
            [],
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn row_to_chat(row: &Row<'_>) -> rusqlite::Result<ChatIdentity> {
        Ok(ChatIdentity {
            chat_id: row.get(0)?,
            username: row.get(1)?,
            display_name: row.get(2)?,
            bio: row.get(3)?,
        })
    }
}

/// Append one `AND column = ?n` per present filter field.
fn filter_query(filter: &ChatFilter) -> (String, Vec<rusqlite::types::Value>) {
    let mut sql = SELECT_CHATS.to_string();
    let mut values: Vec<rusqlite::types::Value> = Vec::new();

    if let Some(chat_id) = filter.chat_id {
        values.push(chat_id.into());
        sql.push_str(&format!(" AND chat_id = ?{}", values.len()));
    }

    if let Some(username) = &filter.username {
        values.push(username.clone().into());
        sql.push_str(&format!(" AND username = ?{}", values.len()));
    }

    sql.push_str(" ORDER BY chat_id");
    (sql, values)
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn insert_chat(&self, chat: &ChatIdentity) -> Result<bool, StorageError> {
        let rows = self.lock()?.execute(
            "INSERT INTO private_chats (chat_id, username, name, bio) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(chat_id) DO NOTHING",
            rusqlite::params![chat.chat_id, chat.username, chat.display_name, chat.bio],
        )?;
        Ok(rows > 0)
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Option<ChatIdentity>, StorageError> {
        let chat = self
            .lock()?
            .query_row(
                "SELECT chat_id, username, name, bio FROM private_chats WHERE chat_id = ?1",
                [chat_id],
                Self::row_to_chat,
            )
            .optional()?;
        Ok(chat)
    }

    async fn delete_chat(&self, chat_id: i64) -> Result<bool, StorageError> {
        let rows = self
            .lock()?
            .execute("DELETE FROM private_chats WHERE chat_id = ?1", [chat_id])?;
        Ok(rows > 0)
    }

    async fn find_chats(&self, filter: &ChatFilter) -> Result<Vec<ChatIdentity>, StorageError> {
        let (sql, values) = filter_query(filter);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), Self::row_to_chat)?;

        let mut chats = Vec::new();
        for chat in rows {
            chats.push(chat?);
        }
        Ok(chats)
    }
}
