use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;

/// Bot trait - abstraction over the outbound messaging API
#[async_trait]
pub trait Bot: Send + Sync {
    /// Identity of the bot account
    async fn get_me(&self) -> Result<BotInfo, BotError>;

    /// Send a message to a chat
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<DeliveryReceipt, BotError>;

    /// Replace the command menu shown to users in `scope`
    async fn set_my_commands(
        &self,
        commands: &[BotCommand],
        scope: CommandScope,
    ) -> Result<(), BotError>;
}

/// Formatting mode for outbound text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    MarkdownV2,
}

impl ParseMode {
    pub fn from_rich(rich_markup: bool) -> Self {
        if rich_markup {
            ParseMode::MarkdownV2
        } else {
            ParseMode::Plain
        }
    }

    pub fn as_api_value(&self) -> Option<&'static str> {
        match self {
            ParseMode::Plain => None,
            ParseMode::MarkdownV2 => Some("MarkdownV2"),
        }
    }
}

/// Who sees a published command menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    AllPrivateChats,
}

impl CommandScope {
    pub fn as_api_value(&self) -> &'static str {
        match self {
            CommandScope::AllPrivateChats => "all_private_chats",
        }
    }
}

/// Menu entry for the messaging API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

/// Bot information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    pub id: u64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: String,
    pub can_join_groups: bool,
    pub can_read_all_group_messages: bool,
    pub supports_inline_queries: bool,
}

/// Returned by the transport once a message is accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: i64,
    pub chat_id: i64,
    pub recipient: String,
}
