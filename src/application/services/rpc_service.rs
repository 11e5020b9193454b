//! RPC facade logic, independent of the wire protocol
//!
//! Each method runs its domain call through the [`TaskSupervisor`] with the RPC
//! deadline and settles the outcome into an [`RpcError`] kind. Internal error
//! detail is logged here and never returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::RpcError;
use crate::application::supervisor::{TaskOutcome, TaskSupervisor};
use crate::domain::entities::{ChatFilter, ChatIdentity};
use crate::domain::traits::{Bot, BotInfo, ChatStore, DeliveryReceipt, ParseMode};

/// Characters stripped from outbound RPC text before it reaches the markup renderer
pub const SPECIAL_CHARACTERS: &str = ".{}[]!?";

/// Remove every special character by literal replacement. Nothing is escaped.
pub fn sanitize_markup(text: &str) -> String {
    SPECIAL_CHARACTERS
        .chars()
        .fold(text.to_string(), |acc, c| acc.replace(c, ""))
}

/// Service exposing bot capabilities to RPC callers
#[derive(Clone)]
pub struct RpcService {
    bot: Arc<dyn Bot>,
    store: Arc<dyn ChatStore>,
    supervisor: TaskSupervisor,
    timeout: Duration,
}

impl RpcService {
    pub fn new(
        bot: Arc<dyn Bot>,
        store: Arc<dyn ChatStore>,
        supervisor: TaskSupervisor,
        timeout: Duration,
    ) -> Self {
        Self {
            bot,
            store,
            supervisor,
            timeout,
        }
    }

    pub async fn bot_status(&self) -> Result<BotInfo, RpcError> {
        let bot = Arc::clone(&self.bot);
        let outcome = self
            .supervisor
            .run(self.timeout, async move {
                bot.get_me().await.map_err(|e| {
                    tracing::error!(error = %e, "rpc.BotStatus.transport");
                    RpcError::aborted("Failed to fetch bot status")
                })
            })
            .await;

        let info = settle("BotStatus", outcome)?;
        tracing::info!(id = info.id, username = %info.username, "rpc.BotStatus.result");
        Ok(info)
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        use_markup: bool,
    ) -> Result<DeliveryReceipt, RpcError> {
        if chat_id == 0 {
            return Err(RpcError::invalid_argument("chat_id is required"));
        }

        let text = sanitize_markup(text);
        if text.trim().is_empty() {
            return Err(RpcError::invalid_argument("text is empty"));
        }

        let bot = Arc::clone(&self.bot);
        let outcome = self
            .supervisor
            .run(self.timeout, async move {
                bot.send_message(chat_id, &text, ParseMode::from_rich(use_markup))
                    .await
                    .map_err(|e| {
                        tracing::error!(chat_id, error = %e, "rpc.SendMessage.transport");
                        RpcError::aborted("Failed to deliver message")
                    })
            })
            .await;

        let receipt = settle("SendMessage", outcome)?;
        tracing::info!(chat_id, message_id = receipt.message_id, "rpc.SendMessage.result");
        Ok(receipt)
    }

    /// Known chats matching `filter`. No rows is reported as not-found, never as an empty list.
    pub async fn known_chats(&self, filter: ChatFilter) -> Result<Vec<ChatIdentity>, RpcError> {
        tracing::debug!(unfiltered = filter.is_empty(), "rpc.GetPrivateChat");
        let store = Arc::clone(&self.store);
        let outcome = self
            .supervisor
            .run(self.timeout, async move {
                store.find_chats(&filter).await.map_err(|e| {
                    tracing::error!(error = %e, "rpc.GetPrivateChat.database");
                    RpcError::internal("An error occurred when querying the database")
                })
            })
            .await;

        let chats = settle("GetPrivateChat", outcome)?;
        tracing::info!(count = chats.len(), "rpc.GetPrivateChat.result");

        if chats.is_empty() {
            return Err(RpcError::not_found("No chats found."));
        }
        Ok(chats)
    }
}

/// Build a filter from the wire's string fields; empty means absent.
pub fn filter_from_request(chat_id: &str, username: &str) -> Result<ChatFilter, RpcError> {
    let mut filter = ChatFilter::new();

    let chat_id = chat_id.trim();
    if !chat_id.is_empty() {
        let id = chat_id
            .parse::<i64>()
            .map_err(|_| RpcError::invalid_argument("filter_chat_id must be an integer"))?;
        filter = filter.with_chat_id(id);
    }

    if !username.is_empty() {
        filter = filter.with_username(username);
    }

    Ok(filter)
}

fn settle<T>(method: &'static str, outcome: TaskOutcome<T, RpcError>) -> Result<T, RpcError> {
    match outcome {
        TaskOutcome::Success(value) => Ok(value),
        TaskOutcome::Failure(err) => Err(err),
        TaskOutcome::Panic(msg) => {
            tracing::error!(method, panic = %msg, "rpc.FATAL");
            Err(RpcError::internal("Fatal internal server error"))
        }
        TaskOutcome::TimedOut => {
            tracing::error!(method, "rpc.timeout");
            Err(RpcError::deadline_exceeded())
        }
        TaskOutcome::Canceled => {
            tracing::warn!(method, "rpc.canceled");
            Err(RpcError::canceled())
        }
    }
}
