//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::errors::BotError;
use crate::application::messaging::parse_command;
use crate::domain::entities::{ChatKind, InboundEvent, Sender};
use crate::domain::traits::{Bot, BotCommand, BotInfo, CommandScope, DeliveryReceipt, ParseMode};
use crate::infrastructure::config::TelegramConfig;

/// Pause after a failed getUpdates call
const POLL_BACKOFF: Duration = Duration::from_secs(1);

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: i64,
    pub length: i64,
}

/// `{ok, result, description}` envelope wrapping every Bot API reply
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct GetMeResult {
    id: u64,
    is_bot: bool,
    first_name: String,
    last_name: Option<String>,
    username: Option<String>,
    #[serde(default)]
    can_join_groups: bool,
    #[serde(default)]
    can_read_all_group_messages: bool,
    #[serde(default)]
    supports_inline_queries: bool,
}

impl Chat {
    /// Name used on delivery receipts
    pub fn recipient(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.first_name.clone())
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

impl Message {
    /// Telegram marks commands with a `bot_command` entity at offset 0.
    pub fn command_entity(&self) -> Option<&MessageEntity> {
        self.entities
            .first()
            .filter(|e| e.kind == "bot_command" && e.offset == 0)
    }
}

impl Update {
    /// Convert to a dispatcher event. Updates without a text message yield `None`.
    pub fn to_event(&self) -> Option<InboundEvent> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;

        let sender = match &message.from {
            Some(user) => Sender {
                user_id: user.id,
                username: user.username.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                bio: message.chat.bio.clone(),
            },
            None => Sender::new(message.chat.id, message.chat.recipient()),
        };
        let kind = ChatKind::parse(&message.chat.kind);

        let parsed = message
            .command_entity()
            .and_then(|entity| parse_command(text, usize::try_from(entity.length).ok()?));

        Some(match parsed {
            Some(cmd) => InboundEvent::command(
                message.chat.id,
                kind,
                sender,
                cmd.name,
                cmd.raw_arguments,
            ),
            None => InboundEvent::text(message.chat.id, kind, sender),
        })
    }
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    api_base: String,
    client: Client,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>, config: &TelegramConfig) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BotError::Network(e.to_string()))?;

        Ok(Self {
            token: token.into(),
            api_base: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<P, T>(&self, method: &str, payload: &P, timeout: Option<Duration>) -> Result<T, BotError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.api_url(method)).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;
        let status = response.status();

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(format!("{} (HTTP {})", e, status)))?;

        if !envelope.ok {
            return Err(BotError::Api {
                code: envelope.error_code.unwrap_or(status.as_u16()),
                description: envelope.description.unwrap_or_default(),
            });
        }

        envelope
            .result
            .ok_or_else(|| BotError::Parse(format!("{} returned no result", method)))
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout_seconds: u64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: u64,
            allowed_updates: Vec<String>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_seconds,
            allowed_updates: vec!["message".to_string()],
        };

        // long poll: the HTTP deadline must outlast the server-side wait
        let http_timeout = Duration::from_secs(timeout_seconds + 10);
        self.call("getUpdates", &request, Some(http_timeout)).await
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update]) -> Option<i64> {
        updates.iter().map(|u| u.update_id + 1).max()
    }

    /// Long-poll Telegram and forward every update as an event until shutdown.
    pub async fn poll_updates(
        &self,
        events: mpsc::Sender<InboundEvent>,
        shutdown: CancellationToken,
        timeout_seconds: u64,
    ) {
        let mut offset: i64 = 0;
        tracing::info!("Starting update loop...");

        loop {
            let result = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.get_updates(offset, timeout_seconds) => result,
            };

            match result {
                Ok(updates) => {
                    if let Some(next) = Self::get_next_offset(&updates) {
                        offset = next;
                    }
                    for update in &updates {
                        let Some(event) = update.to_event() else {
                            continue;
                        };
                        if events.send(event).await.is_err() {
                            tracing::warn!("Dispatcher channel closed, stopping update loop");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(POLL_BACKOFF) => {}
                    }
                }
            }
        }

        tracing::info!("Update loop stopped");
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn get_me(&self) -> Result<BotInfo, BotError> {
        let me: GetMeResult = self.call("getMe", &serde_json::json!({}), None).await?;
        Ok(BotInfo {
            id: me.id,
            is_bot: me.is_bot,
            first_name: me.first_name,
            last_name: me.last_name,
            username: me.username.unwrap_or_default(),
            can_join_groups: me.can_join_groups,
            can_read_all_group_messages: me.can_read_all_group_messages,
            supports_inline_queries: me.supports_inline_queries,
        })
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<DeliveryReceipt, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: i64,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<&'static str>,
        }

        tracing::debug!(chat_id, "Sending message");
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: parse_mode.as_api_value(),
        };

        let sent: Message = self.call("sendMessage", &request, None).await?;
        Ok(DeliveryReceipt {
            message_id: sent.message_id,
            chat_id: sent.chat.id,
            recipient: sent.chat.recipient(),
        })
    }

    async fn set_my_commands(
        &self,
        commands: &[BotCommand],
        scope: CommandScope,
    ) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Scope {
            #[serde(rename = "type")]
            kind: &'static str,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest<'a> {
            commands: &'a [BotCommand],
            scope: Scope,
        }

        let request = SetMyCommandsRequest {
            commands,
            scope: Scope {
                kind: scope.as_api_value(),
            },
        };

        let accepted: bool = self.call("setMyCommands", &request, None).await?;
        if !accepted {
            return Err(BotError::Internal("setMyCommands was not accepted".to_string()));
        }
        Ok(())
    }
}
