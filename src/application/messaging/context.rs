//! Per-invocation context handed to command handlers

use std::sync::Arc;

use crate::application::services::ChatGateway;
use crate::domain::entities::{InboundEvent, OutboundReply};
use crate::domain::traits::ChatStore;
use crate::infrastructure::config::Config;

/// Everything a handler may touch. Collaborators are named fields, never implicit.
#[derive(Clone)]
pub struct CommandContext {
    pub event: InboundEvent,
    pub gateway: ChatGateway,
    pub store: Arc<dyn ChatStore>,
    pub config: Arc<Config>,
}

impl CommandContext {
    pub fn new(
        event: InboundEvent,
        gateway: ChatGateway,
        store: Arc<dyn ChatStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            event,
            gateway,
            store,
            config,
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.event.chat_id
    }

    pub fn args(&self) -> &[String] {
        &self.event.arguments
    }

    pub async fn reply(&self, text: impl Into<String>, log_subject: &str) {
        self.gateway
            .send_reply(OutboundReply::plain(self.chat_id(), text), log_subject)
            .await;
    }

    pub async fn reply_markdown(&self, text: impl Into<String>, log_subject: &str) {
        self.gateway
            .send_reply(OutboundReply::markdown(self.chat_id(), text), log_subject)
            .await;
    }
}
